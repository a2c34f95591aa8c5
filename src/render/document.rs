//! Render-ready invoice data

use serde::Serialize;
use uuid::Uuid;

use crate::core::error::RenderError;
use crate::core::invoice::Invoice;

/// Who issues the invoices (printed in the document header)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuerInfo {
    pub name: String,
}

impl IssuerInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// One printed line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentLine {
    pub position: usize,
    pub description: String,
    pub quantity: String,
    pub unit_price: String,
    pub amount: String,
    #[serde(skip)]
    raw: [f64; 3],
}

/// Everything a renderer needs, with numbers already formatted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceDocument {
    pub invoice_id: Uuid,
    pub number: String,
    pub issuer: String,
    pub owner_id: String,
    pub billed_to: String,
    pub customer_email: Option<String>,
    pub status: String,
    pub issued_on: String,
    pub due_date: Option<String>,
    pub currency: String,
    pub notes: Option<String>,
    pub lines: Vec<DocumentLine>,
    pub total: String,
    #[serde(skip)]
    raw_total: f64,
}

impl InvoiceDocument {
    pub fn from_invoice(invoice: &Invoice, issuer: &IssuerInfo) -> Self {
        let lines = invoice
            .line_items()
            .iter()
            .enumerate()
            .map(|(index, item)| DocumentLine {
                position: index + 1,
                description: item.description.clone(),
                quantity: format_quantity(item.quantity),
                unit_price: format_money(item.unit_price),
                amount: format_money(item.amount()),
                raw: [item.quantity, item.unit_price, item.amount()],
            })
            .collect();

        Self {
            invoice_id: invoice.id,
            number: invoice_number(&invoice.id),
            issuer: issuer.name.clone(),
            owner_id: invoice.owner_id.to_string(),
            billed_to: invoice
                .customer_name
                .clone()
                .unwrap_or_else(|| invoice.owner_id.to_string()),
            customer_email: invoice.customer_email.clone(),
            status: invoice.status.to_string(),
            issued_on: invoice.created_at.format("%Y-%m-%d").to_string(),
            due_date: invoice.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
            currency: invoice.currency.clone(),
            notes: invoice.notes.clone(),
            lines,
            total: format_money(invoice.total()),
            raw_total: invoice.total(),
        }
    }

    /// Reject data no layout can represent
    pub fn check(&self) -> Result<(), RenderError> {
        if self.lines.is_empty() {
            return Err(RenderError::InvalidData {
                message: "document has no lines".to_string(),
            });
        }

        let finite = self.raw_total.is_finite()
            && self
                .lines
                .iter()
                .all(|line| line.raw.iter().all(|n| n.is_finite()));
        if !finite {
            return Err(RenderError::InvalidData {
                message: "document contains non-finite amounts".to_string(),
            });
        }

        Ok(())
    }
}

/// Human-facing invoice number derived from the id
pub fn invoice_number(id: &Uuid) -> String {
    let simple = id.simple().to_string();
    format!("INV-{}", simple[..8].to_ascii_uppercase())
}

fn format_money(value: f64) -> String {
    format!("{:.2}", value)
}

fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
