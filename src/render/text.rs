//! Plain-text renderer

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::error::RenderError;
use crate::render::{
    DocumentRenderer, DocumentTemplate, InvoiceDocument, RenderedDocument, blocking,
};

pub const CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Renders the template output as UTF-8 text
#[derive(Debug, Clone)]
pub struct TextRenderer {
    template: Arc<DocumentTemplate>,
}

impl TextRenderer {
    pub fn new(template: DocumentTemplate) -> Self {
        Self {
            template: Arc::new(template),
        }
    }
}

#[async_trait]
impl DocumentRenderer for TextRenderer {
    async fn render(&self, document: &InvoiceDocument) -> Result<RenderedDocument, RenderError> {
        document.check()?;
        let template = self.template.clone();
        let owned = document.clone();
        let text = blocking("txt", move || {
            let mut text = template.render_lines(&owned)?.join("\n");
            text.push('\n');
            Ok(text)
        })
        .await?;

        Ok(RenderedDocument {
            content_type: CONTENT_TYPE,
            extension: "txt",
            bytes: text.into_bytes(),
        })
    }
}
