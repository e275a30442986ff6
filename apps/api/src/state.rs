use std::sync::Arc;

use crate::config::Config;
use crate::render::DocumentRenderer;

/// Shared application state injected into all route handlers via Axum extractors.
/// Holds no per-request data; every request carries its full record.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable renderer. Default: DocxTemplateRenderer over `config.template_dir`.
    pub renderer: Arc<dyn DocumentRenderer>,
}
