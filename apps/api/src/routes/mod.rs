pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::debit::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/debits/options", get(handlers::handle_options))
        .route(
            "/api/v1/debits/context",
            post(handlers::handle_preview_context),
        )
        .route("/api/v1/debits", post(handlers::handle_generate))
        .route(
            "/api/v1/debits/model",
            get(handlers::handle_model_spreadsheet),
        )
        .route(
            "/api/v1/debits/batch/preview",
            post(handlers::handle_batch_preview),
        )
        .route("/api/v1/debits/batch", post(handlers::handle_batch))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
