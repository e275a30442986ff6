//! Axum route handlers for the Debit API.

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use chrono::Local;
use serde::Serialize;
use tracing::info;

use crate::debit::batch::generate_batch;
use crate::debit::context::{build_context, TemplateContext};
use crate::debit::filename::{batch_archive_name, single_document_name};
use crate::debit::models::{DebitRecord, EXPENSE_TYPES, OFFICES, YES_NO};
use crate::errors::AppError;
use crate::render::DOCX_MIME;
use crate::state::AppState;
use crate::upload::model::{model_spreadsheet, MODEL_FILE_NAME, MODEL_MIME};
use crate::upload::{reader_for, UploadedRow};

const UPLOAD_FIELD: &str = "file";
const ZIP_MIME: &str = "application/zip";
const GENERATED_HEADER: &str = "x-debits-generated";
const FAILED_HEADER: &str = "x-debits-failed";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub offices: &'static [&'static str],
    pub expense_types: &'static [&'static str],
    pub yes_no: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct BatchPreviewResponse {
    pub rows: Vec<UploadedRow>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/debits/options
///
/// Choices offered by the form. Values must be sent back exactly as listed.
pub async fn handle_options() -> Json<OptionsResponse> {
    Json(OptionsResponse {
        offices: OFFICES,
        expense_types: EXPENSE_TYPES,
        yes_no: YES_NO,
    })
}

/// POST /api/v1/debits/context
///
/// Returns the placeholder values a record would be rendered with.
pub async fn handle_preview_context(
    Json(record): Json<DebitRecord>,
) -> Result<Json<TemplateContext>, AppError> {
    reject_missing_fields(&record)?;
    Ok(Json(build_context(&record)))
}

/// POST /api/v1/debits
///
/// Renders one form submission and returns the filled `.docx`.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(record): Json<DebitRecord>,
) -> Result<Response, AppError> {
    reject_missing_fields(&record)?;

    let file_name = single_document_name(
        record.client_id.as_deref().unwrap_or_default(),
        record.case_id.as_deref().unwrap_or_default(),
        Local::now().date_naive(),
    );

    let renderer = state.renderer.clone();
    let template_id = state.config.template_id.clone();
    let document = tokio::task::spawn_blocking(move || {
        let context = build_context(&record);
        renderer.render(&template_id, &context)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in render: {e}")))??;

    info!("Generated {file_name} ({} bytes)", document.len());
    Ok(attachment(DOCX_MIME, &file_name, document))
}

/// GET /api/v1/debits/model
///
/// Downloadable spreadsheet with the expected columns and one example row.
pub async fn handle_model_spreadsheet() -> Result<Response, AppError> {
    let body = model_spreadsheet(Local::now().date_naive())?;
    Ok(attachment(MODEL_MIME, MODEL_FILE_NAME, body))
}

/// POST /api/v1/debits/batch/preview
///
/// Parses an uploaded spreadsheet and returns its rows without rendering.
pub async fn handle_batch_preview(
    multipart: Multipart,
) -> Result<Json<BatchPreviewResponse>, AppError> {
    let rows = read_uploaded_rows(multipart).await?;
    Ok(Json(BatchPreviewResponse { rows }))
}

/// POST /api/v1/debits/batch
///
/// Renders every row of an uploaded spreadsheet into one ZIP archive.
/// Rows that fail are skipped and listed in the archive report; the request
/// only fails when no row could be generated.
pub async fn handle_batch(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let rows = read_uploaded_rows(multipart).await?;
    if rows.is_empty() {
        return Err(AppError::Validation(
            "The spreadsheet has no data rows".to_string(),
        ));
    }
    info!("Generating batch of {} rows", rows.len());

    let renderer = state.renderer.clone();
    let template_id = state.config.template_id.clone();
    let outcome =
        tokio::task::spawn_blocking(move || generate_batch(&rows, renderer.as_ref(), &template_id))
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("spawn_blocking failed in batch: {e}"))
            })??;

    if outcome.generated == 0 {
        return Err(AppError::NothingGenerated(outcome.failures));
    }

    let mut response = attachment(
        ZIP_MIME,
        &batch_archive_name(Local::now().date_naive()),
        outcome.archive,
    );
    let headers = response.headers_mut();
    headers.insert(GENERATED_HEADER, HeaderValue::from(outcome.generated));
    headers.insert(FAILED_HEADER, HeaderValue::from(outcome.failures.len()));
    Ok(response)
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn reject_missing_fields(record: &DebitRecord) -> Result<(), AppError> {
    let missing = record.missing_required_fields();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Required fields are empty: {}",
            missing.join(", ")
        )))
    }
}

/// Extracts the `file` field and parses it with the reader matching its extension.
async fn read_uploaded_rows(mut multipart: Multipart) -> Result<Vec<UploadedRow>, AppError> {
    let (file_name, data) = read_upload_field(&mut multipart).await?;
    let reader = reader_for(&file_name)?;
    info!("Reading upload {file_name} ({} bytes)", data.len());

    let rows = tokio::task::spawn_blocking(move || reader.read_rows(&data))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in upload: {e}")))??;
    Ok(rows)
}

async fn read_upload_field(multipart: &mut Multipart) -> Result<(String, Bytes), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;
        return Ok((file_name, data));
    }
    Err(AppError::Validation(format!(
        "Multipart field '{UPLOAD_FIELD}' is required"
    )))
}

/// Download response with a `Content-Disposition` filename.
fn attachment(content_type: &'static str, file_name: &str, body: Vec<u8>) -> Response {
    let safe_name: String = file_name
        .chars()
        .map(|c| if c == '"' || c.is_control() { '_' } else { c })
        .collect();
    let disposition = HeaderValue::from_bytes(format!("attachment; filename=\"{safe_name}\"").as_bytes())
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}
