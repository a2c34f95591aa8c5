//! Tera layout template shared by every renderer

use std::error::Error as _;
use std::path::Path;
use tera::{Context, Tera};

use crate::core::error::RenderError;
use crate::render::InvoiceDocument;

const TEMPLATE_NAME: &str = "invoice.txt";

/// Built-in layout
pub const DEFAULT_TEMPLATE: &str = r#"{{ issuer }}
INVOICE {{ number }}

Invoice ID: {{ invoice_id }}
Status: {{ status }}
Issued: {{ issued_on }}
{% if due_date %}Due: {{ due_date }}
{% endif %}
Billed to: {{ billed_to }}
{% if customer_email %}{{ customer_email }}
{% endif %}
{% for line in lines %}{{ line.position }}. {{ line.description }}  {{ line.quantity }} x {{ line.unit_price }} = {{ line.amount }}
{% endfor %}
TOTAL: {{ total }} {{ currency }}
{% if notes %}
{{ notes }}
{% endif %}"#;

/// A compiled layout template
#[derive(Debug, Clone)]
pub struct DocumentTemplate {
    tera: Tera,
}

impl DocumentTemplate {
    /// Compile a template from source
    pub fn from_source(source: &str) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, source)
            .map_err(template_error)?;
        Ok(Self { tera })
    }

    /// Compile the built-in layout
    pub fn builtin() -> Result<Self, RenderError> {
        Self::from_source(DEFAULT_TEMPLATE)
    }

    /// Load and compile a template file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let source =
            std::fs::read_to_string(path.as_ref()).map_err(|e| RenderError::Template {
                message: format!("cannot read {}: {}", path.as_ref().display(), e),
            })?;
        Self::from_source(&source)
    }

    /// Render the document to text lines
    pub fn render_lines(&self, document: &InvoiceDocument) -> Result<Vec<String>, RenderError> {
        let context = Context::from_serialize(document).map_err(template_error)?;
        let text = self
            .tera
            .render(TEMPLATE_NAME, &context)
            .map_err(template_error)?;

        Ok(text.lines().map(|line| line.trim_end().to_string()).collect())
    }
}

fn template_error(err: tera::Error) -> RenderError {
    // tera puts the useful part of the message in the source chain
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    RenderError::Template { message }
}
