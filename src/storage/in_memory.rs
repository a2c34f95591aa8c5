//! In-memory stores for testing and development

use crate::core::error::StoreError;
use crate::core::invoice::{Invoice, InvoiceChanges, NewInvoiceRecord, OwnerId};
use crate::core::store::{ArtifactStore, InvoiceStore, artifact_name};
use crate::render::RenderedDocument;
use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

const BACKEND: &str = "in-memory";

fn lock_error(e: impl std::fmt::Display) -> StoreError {
    StoreError::backend(BACKEND, format!("Failed to acquire lock: {}", e))
}

/// In-memory invoice store
///
/// Keeps insertion order, so listing returns records oldest first. Uses
/// RwLock for thread-safe access.
#[derive(Clone, Default)]
pub struct InMemoryInvoiceStore {
    invoices: Arc<RwLock<IndexMap<Uuid, Invoice>>>,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.invoices.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl InvoiceStore for InMemoryInvoiceStore {
    async fn create(&self, record: NewInvoiceRecord) -> Result<Invoice, StoreError> {
        let mut invoices = self.invoices.write().map_err(lock_error)?;

        let invoice = Invoice::from_record(Uuid::new_v4(), record, Utc::now());
        invoices.insert(invoice.id, invoice.clone());

        Ok(invoice)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<Invoice>, StoreError> {
        let invoices = self.invoices.read().map_err(lock_error)?;

        Ok(invoices.get(id).cloned())
    }

    async fn list_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<Invoice>, StoreError> {
        let invoices = self.invoices.read().map_err(lock_error)?;

        Ok(invoices
            .values()
            .filter(|invoice| &invoice.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn update(&self, id: &Uuid, changes: InvoiceChanges) -> Result<Invoice, StoreError> {
        let mut invoices = self.invoices.write().map_err(lock_error)?;

        let invoice = invoices
            .get_mut(id)
            .ok_or(StoreError::NotFound { id: *id })?;
        invoice.apply(changes, Utc::now());

        Ok(invoice.clone())
    }

    async fn delete(&self, id: &Uuid) -> Result<(), StoreError> {
        let mut invoices = self.invoices.write().map_err(lock_error)?;

        invoices.shift_remove(id);

        Ok(())
    }
}

/// In-memory artifact store
#[derive(Clone, Default)]
pub struct InMemoryArtifactStore {
    artifacts: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// References of every stored artifact
    pub fn refs(&self) -> Vec<String> {
        let mut refs: Vec<String> = self
            .artifacts
            .read()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        refs.sort();
        refs
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn put(
        &self,
        invoice_id: &Uuid,
        document: &RenderedDocument,
    ) -> Result<String, StoreError> {
        let mut artifacts = self.artifacts.write().map_err(lock_error)?;

        let name = artifact_name(invoice_id, document);
        artifacts.insert(name.clone(), document.bytes.clone());

        Ok(name)
    }

    async fn get(&self, document_ref: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let artifacts = self.artifacts.read().map_err(lock_error)?;

        Ok(artifacts.get(document_ref).cloned())
    }
}
