//! Document rendering
//!
//! A [`DocumentRenderer`] turns an [`InvoiceDocument`] into a byte-stream
//! artifact. Layout is driven by a [`DocumentTemplate`]; renderers only
//! decide the output format.

pub mod document;
pub mod pdf;
pub mod template;
pub mod text;

pub use document::{DocumentLine, InvoiceDocument, IssuerInfo};
pub use pdf::PdfRenderer;
pub use template::DocumentTemplate;
pub use text::TextRenderer;

use async_trait::async_trait;

use crate::core::error::RenderError;

/// A rendered artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub content_type: &'static str,
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

/// Renders invoice documents
///
/// Implementations must be deterministic: the same document yields the
/// same bytes.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, document: &InvoiceDocument) -> Result<RenderedDocument, RenderError>;
}

/// Run CPU-bound layout work off the async workers.
///
/// Keeps the caller's future pending while the work runs, so a deadline
/// around `render` can elapse.
pub(crate) async fn blocking<T, F>(format: &'static str, task: F) -> Result<T, RenderError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, RenderError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| RenderError::Output {
            format,
            message: format!("render task failed: {}", e),
        })?
}

/// Content type of a stored artifact, from its reference
pub fn content_type_for(document_ref: &str) -> &'static str {
    match document_ref.rsplit_once('.').map(|(_, ext)| ext) {
        Some("pdf") => pdf::CONTENT_TYPE,
        Some("txt") => text::CONTENT_TYPE,
        _ => "application/octet-stream",
    }
}
