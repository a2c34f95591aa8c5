//! Invoice data model
//!
//! Per-operation shapes instead of one shared record type:
//! - [`NewInvoice`] / [`InvoicePatch`]: what a caller may send
//! - [`NewInvoiceRecord`] / [`InvoiceChanges`]: what the service hands to a store
//! - [`Invoice`]: what a store returns
//!
//! None of the caller-facing shapes has an owner field. The owner always
//! comes from the authenticated [`Caller`](crate::core::auth::Caller).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Identity of the user who owns an invoice
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for OwnerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Invoice status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Issued,
    Paid,
    Void,
}

impl InvoiceStatus {
    /// Terminal invoices are frozen: no field may change any more.
    pub fn is_terminal(self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Void)
    }

    /// Whether `self → next` is allowed. Staying in the same status always is.
    pub fn can_transition_to(self, next: InvoiceStatus) -> bool {
        use InvoiceStatus::*;

        if self == next {
            return true;
        }

        matches!(
            (self, next),
            (Draft, Issued) | (Draft, Void) | (Issued, Paid) | (Issued, Void)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "DRAFT",
            InvoiceStatus::Issued => "ISSUED",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Void => "VOID",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single billed line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct LineItem {
    #[validate(length(min = 1, max = 500, message = "description must be 1 to 500 characters"))]
    pub description: String,

    #[validate(range(exclusive_min = 0.0, message = "quantity must be greater than zero"))]
    pub quantity: f64,

    #[validate(range(min = 0.0, message = "unit_price must not be negative"))]
    pub unit_price: f64,
}

impl LineItem {
    pub fn new(description: impl Into<String>, quantity: f64, unit_price: f64) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
        }
    }

    /// quantity × unit_price
    pub fn amount(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

/// Sum of the line amounts, in item order
pub fn compute_total(items: &[LineItem]) -> f64 {
    items.iter().map(LineItem::amount).sum()
}

/// Line items together with their total.
///
/// The total can only be derived from the items: there is no constructor
/// taking a total, and deserialization recomputes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PricedLinesRepr")]
pub struct PricedLines {
    line_items: Vec<LineItem>,
    total: f64,
}

impl PricedLines {
    pub fn new(line_items: Vec<LineItem>) -> Self {
        let total = compute_total(&line_items);
        Self { line_items, total }
    }

    pub fn items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn total(&self) -> f64 {
        self.total
    }
}

#[derive(Deserialize)]
struct PricedLinesRepr {
    line_items: Vec<LineItem>,
    #[serde(default, rename = "total")]
    _total: Option<f64>,
}

impl From<PricedLinesRepr> for PricedLines {
    fn from(repr: PricedLinesRepr) -> Self {
        PricedLines::new(repr.line_items)
    }
}

/// A persisted invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub owner_id: OwnerId,
    #[serde(flatten)]
    lines: PricedLines,
    pub status: InvoiceStatus,
    pub currency: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub notes: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub document_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Build the stored form of a new record. Called by stores, which own `id`
    /// and the timestamps.
    pub fn from_record(id: Uuid, record: NewInvoiceRecord, now: DateTime<Utc>) -> Self {
        Self {
            id,
            owner_id: record.owner_id,
            lines: record.lines,
            status: record.status,
            currency: record.currency,
            customer_name: record.customer_name,
            customer_email: record.customer_email,
            notes: record.notes,
            due_date: record.due_date,
            document_ref: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn line_items(&self) -> &[LineItem] {
        self.lines.items()
    }

    pub fn total(&self) -> f64 {
        self.lines.total()
    }

    /// Apply store-level changes and bump `updated_at`
    pub fn apply(&mut self, changes: InvoiceChanges, now: DateTime<Utc>) {
        if let Some(lines) = changes.lines {
            self.lines = lines;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(currency) = changes.currency {
            self.currency = currency;
        }
        if let Some(name) = changes.customer_name {
            self.customer_name = name;
        }
        if let Some(email) = changes.customer_email {
            self.customer_email = email;
        }
        if let Some(notes) = changes.notes {
            self.notes = notes;
        }
        if let Some(due_date) = changes.due_date {
            self.due_date = due_date;
        }
        if let Some(document_ref) = changes.document_ref {
            self.document_ref = Some(document_ref);
        }
        self.updated_at = now;
    }
}

/// Create payload
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NewInvoice {
    #[validate(length(min = 1, message = "at least one line item is required"), nested)]
    pub line_items: Vec<LineItem>,

    #[validate(length(max = 200))]
    pub customer_name: Option<String>,

    #[validate(email(message = "customer_email must be a valid e-mail address"))]
    pub customer_email: Option<String>,

    #[validate(length(max = 2000))]
    pub notes: Option<String>,

    pub due_date: Option<NaiveDate>,

    #[validate(length(equal = 3, message = "currency must be a three-letter code"))]
    pub currency: Option<String>,
}

impl NewInvoice {
    pub fn with_items(line_items: Vec<LineItem>) -> Self {
        Self {
            line_items,
            ..Default::default()
        }
    }

    /// Turn a validated payload into the record handed to the store
    pub fn into_record(self, owner_id: OwnerId, default_currency: &str) -> NewInvoiceRecord {
        NewInvoiceRecord {
            owner_id,
            lines: PricedLines::new(self.line_items),
            status: InvoiceStatus::Draft,
            currency: self
                .currency
                .map(|c| c.to_ascii_uppercase())
                .unwrap_or_else(|| default_currency.to_string()),
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            notes: self.notes,
            due_date: self.due_date,
        }
    }
}

/// Update payload. Absent fields are left untouched; an explicit `null`
/// clears an optional descriptive field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct InvoicePatch {
    #[validate(length(min = 1, message = "at least one line item is required"), nested)]
    pub line_items: Option<Vec<LineItem>>,

    pub status: Option<InvoiceStatus>,

    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 200))]
    pub customer_name: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    #[validate(email(message = "customer_email must be a valid e-mail address"))]
    pub customer_email: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 2000))]
    pub notes: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<NaiveDate>>,

    #[validate(length(equal = 3, message = "currency must be a three-letter code"))]
    pub currency: Option<String>,
}

/// Absent stays `None`, `null` becomes `Some(None)`
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl InvoicePatch {
    pub fn is_empty(&self) -> bool {
        self.line_items.is_none()
            && self.status.is_none()
            && self.customer_name.is_none()
            && self.customer_email.is_none()
            && self.notes.is_none()
            && self.due_date.is_none()
            && self.currency.is_none()
    }

    pub fn into_changes(self) -> InvoiceChanges {
        InvoiceChanges {
            lines: self.line_items.map(PricedLines::new),
            status: self.status,
            currency: self.currency.map(|c| c.to_ascii_uppercase()),
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            notes: self.notes,
            due_date: self.due_date,
            document_ref: None,
        }
    }
}

/// A new record as handed to [`InvoiceStore::create`](crate::core::store::InvoiceStore::create)
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoiceRecord {
    pub owner_id: OwnerId,
    pub lines: PricedLines,
    pub status: InvoiceStatus,
    pub currency: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub notes: Option<String>,
    pub due_date: Option<NaiveDate>,
}

/// Field changes as handed to [`InvoiceStore::update`](crate::core::store::InvoiceStore::update)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceChanges {
    pub lines: Option<PricedLines>,
    pub status: Option<InvoiceStatus>,
    pub currency: Option<String>,
    /// `Some(None)` clears the field
    pub customer_name: Option<Option<String>>,
    pub customer_email: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub document_ref: Option<String>,
}

impl InvoiceChanges {
    /// Changes that only attach a rendered document
    pub fn attach_document(document_ref: impl Into<String>) -> Self {
        Self {
            document_ref: Some(document_ref.into()),
            ..Default::default()
        }
    }
}
