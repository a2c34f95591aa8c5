//! Store traits the invoice service depends on
//!
//! Implementations live in [`crate::storage`]. The service only needs the
//! operations below, not a full persistence schema.

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::StoreError;
use crate::core::invoice::{Invoice, InvoiceChanges, NewInvoiceRecord, OwnerId};
use crate::render::RenderedDocument;

/// Durable keyed storage of invoice records
///
/// Every write must be atomic for the record it touches. Concurrent updates
/// of the same record resolve as last write wins.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Persist a new record, assigning its `id` and timestamps
    async fn create(&self, record: NewInvoiceRecord) -> Result<Invoice, StoreError>;

    /// Get a record by ID
    async fn get(&self, id: &Uuid) -> Result<Option<Invoice>, StoreError>;

    /// All records of one owner, oldest first
    async fn list_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<Invoice>, StoreError>;

    /// Apply changes to an existing record
    ///
    /// Fails with [`StoreError::NotFound`] when the record does not exist.
    async fn update(&self, id: &Uuid, changes: InvoiceChanges) -> Result<Invoice, StoreError>;

    /// Hard-delete a record. Deleting a missing record is not an error.
    async fn delete(&self, id: &Uuid) -> Result<(), StoreError>;
}

/// Storage for rendered documents
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store the document of an invoice, returning its reference.
    ///
    /// Must not leave a partially written artifact behind on failure.
    async fn put(&self, invoice_id: &Uuid, document: &RenderedDocument)
    -> Result<String, StoreError>;

    /// Load an artifact by reference
    async fn get(&self, document_ref: &str) -> Result<Option<Vec<u8>>, StoreError>;
}

/// File name used for the artifact of an invoice
pub fn artifact_name(invoice_id: &Uuid, document: &RenderedDocument) -> String {
    format!("invoice-{}.{}", invoice_id, document.extension)
}
