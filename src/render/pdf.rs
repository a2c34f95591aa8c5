//! PDF renderer built on lopdf
//!
//! Produces a plain A4 document: one text line per template line, in
//! Helvetica, paginated. No creation dates or ids are written, so the same
//! document always yields the same bytes.

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use std::sync::Arc;

use crate::core::error::RenderError;
use crate::render::{
    DocumentRenderer, DocumentTemplate, InvoiceDocument, RenderedDocument, blocking,
};

pub const CONTENT_TYPE: &str = "application/pdf";

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;
const FONT_SIZE: i64 = 10;
const LEADING: i64 = 14;
const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize;

/// Renders invoice documents to PDF
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    template: Arc<DocumentTemplate>,
}

impl PdfRenderer {
    pub fn new(template: DocumentTemplate) -> Self {
        Self {
            template: Arc::new(template),
        }
    }

    /// Lay out text lines on as many pages as needed
    pub fn write_pdf(lines: &[String]) -> Result<Vec<u8>, RenderError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids: Vec<Object> = Vec::new();
        let empty: &[String] = &[];
        let chunks: Vec<&[String]> = if lines.is_empty() {
            vec![empty]
        } else {
            lines.chunks(LINES_PER_PAGE).collect()
        };

        for chunk in chunks {
            let page_id = add_page(&mut doc, pages_id, chunk)?;
            kids.push(page_id.into());
        }

        let page_count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(page_count),
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH),
                Object::Integer(PAGE_HEIGHT),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).map_err(|e| output_error(e.to_string()))?;
        Ok(bytes)
    }
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    lines: &[String],
) -> Result<ObjectId, RenderError> {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(b"F1".to_vec()), Object::Integer(FONT_SIZE)],
        ),
        Operation::new("TL", vec![Object::Integer(LEADING)]),
        Operation::new(
            "Td",
            vec![
                Object::Integer(MARGIN),
                Object::Integer(PAGE_HEIGHT - MARGIN),
            ],
        ),
    ];

    for line in lines {
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(win_ansi(line))],
        ));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations }
        .encode()
        .map_err(|e| output_error(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    }))
}

/// Encode for the WinAnsi Helvetica font; unsupported characters become '?'
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7e | 0xa0..=0xff => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

fn output_error(message: String) -> RenderError {
    RenderError::Output {
        format: "pdf",
        message,
    }
}

#[async_trait]
impl DocumentRenderer for PdfRenderer {
    async fn render(&self, document: &InvoiceDocument) -> Result<RenderedDocument, RenderError> {
        document.check()?;
        let template = self.template.clone();
        let owned = document.clone();
        let bytes = blocking("pdf", move || {
            let lines = template.render_lines(&owned)?;
            Self::write_pdf(&lines)
        })
        .await?;

        tracing::debug!(
            invoice_id = %document.invoice_id,
            size = bytes.len(),
            "rendered pdf document"
        );

        Ok(RenderedDocument {
            content_type: CONTENT_TYPE,
            extension: "pdf",
            bytes,
        })
    }
}
