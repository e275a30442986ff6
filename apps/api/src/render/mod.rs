// Document rendering.
// Handlers and the batch loop only see `DocumentRenderer`; the DOCX package
// handling lives in `docx` and can be swapped without touching the context code.

pub mod docx;

use std::path::PathBuf;

use thiserror::Error;

use crate::debit::context::TemplateContext;

pub use docx::DocxTemplateRenderer;

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template '{0}' not found")]
    TemplateNotFound(PathBuf),

    #[error("invalid template package: {0}")]
    Package(#[from] zip::result::ZipError),

    #[error("invalid template: {0}")]
    InvalidTemplate(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fills a template identified by `template_id` with a flat context.
///
/// Implementations are synchronous; async callers run them on
/// `tokio::task::spawn_blocking`.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, template_id: &str, context: &TemplateContext) -> Result<Vec<u8>, RenderError>;
}
