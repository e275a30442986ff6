//! Batch generation: one document per uploaded row, collected into a ZIP archive.
//!
//! Rows are processed in order and independently. A row that fails (missing
//! required field, render error) is recorded and skipped; the rest of the
//! batch continues. Failures are listed in [`REPORT_FILE_NAME`] inside the
//! archive whenever there is at least one.

use std::io::{Cursor, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::debit::context::build_context;
use crate::debit::filename::batch_document_name;
use crate::debit::models::DebitRecord;
use crate::render::{DocumentRenderer, RenderError};
use crate::upload::UploadedRow;

pub const REPORT_FILE_NAME: &str = "relatorio.json";

#[derive(Debug, Error)]
pub enum RowFailure {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFailure {
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct BatchReport<'a> {
    pub generated: usize,
    pub failed: &'a [BatchFailure],
}

#[derive(Debug)]
pub struct BatchOutcome {
    /// ZIP archive bytes. Contains only the report when nothing was generated.
    pub archive: Vec<u8>,
    pub generated: usize,
    pub failures: Vec<BatchFailure>,
}

/// Renders one record: presence check, context build, template render.
pub fn render_record(
    record: &DebitRecord,
    renderer: &dyn DocumentRenderer,
    template_id: &str,
) -> Result<Vec<u8>, RowFailure> {
    let missing = record.missing_required_fields();
    if !missing.is_empty() {
        return Err(RowFailure::MissingFields(missing));
    }
    let context = build_context(record);
    Ok(renderer.render(template_id, &context)?)
}

/// Generates every row into one archive. Only archive I/O errors fail the
/// whole batch; row failures are collected in the outcome.
pub fn generate_batch(
    rows: &[UploadedRow],
    renderer: &dyn DocumentRenderer,
    template_id: &str,
) -> Result<BatchOutcome> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut generated = 0usize;
    let mut failures = Vec::new();

    for UploadedRow { row, record } in rows {
        match render_record(record, renderer, template_id) {
            Ok(document) => {
                let name = batch_document_name(
                    record.client_id.as_deref().unwrap_or_default(),
                    record.case_id.as_deref().unwrap_or_default(),
                    *row,
                );
                writer
                    .start_file(name.as_str(), options)
                    .with_context(|| format!("Failed to add {name} to archive"))?;
                writer.write_all(&document)?;
                generated += 1;
            }
            Err(e) => {
                warn!("Row {row} skipped: {e}");
                failures.push(BatchFailure {
                    row: *row,
                    message: e.to_string(),
                });
            }
        }
    }

    if !failures.is_empty() {
        let report = BatchReport {
            generated,
            failed: &failures,
        };
        writer.start_file(REPORT_FILE_NAME, options)?;
        writer.write_all(&serde_json::to_vec_pretty(&report)?)?;
    }

    let archive = writer
        .finish()
        .context("Failed to finish batch archive")?
        .into_inner();

    info!(
        "Batch finished: {generated} generated, {} failed, {} bytes",
        failures.len(),
        archive.len()
    );

    Ok(BatchOutcome {
        archive,
        generated,
        failures,
    })
}
