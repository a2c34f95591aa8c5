//! Invoice lifecycle service
//!
//! [`InvoiceService`] is the only component that touches the stores. Every
//! operation takes the authenticated [`Caller`] and checks ownership itself
//! before reading or writing a record; nothing is cached between calls.
//!
//! `create` runs four steps strictly in sequence:
//!
//! ```text
//! store.create ──▶ renderer.render ──▶ artifacts.put ──▶ store.update(document_ref)
//! ```
//!
//! A failure after the first step keeps the record (with no `document_ref`)
//! and returns an error carrying its id.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::core::auth::Caller;
use crate::core::error::{InvoiceError, Operation, RenderError, StoreError, ValidationError};
use crate::core::invoice::{Invoice, InvoiceChanges, InvoicePatch, NewInvoice};
use crate::core::store::{ArtifactStore, InvoiceStore};
use crate::core::validation::Validated;
use crate::render::{DocumentRenderer, InvoiceDocument, IssuerInfo, RenderedDocument};

/// Optional deadlines for calls to collaborators
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeouts {
    pub store: Option<Duration>,
    pub render: Option<Duration>,
}

/// Settings that shape documents and records
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub issuer: IssuerInfo,
    pub default_currency: String,
    pub timeouts: Timeouts,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            issuer: IssuerInfo::new("Invoicer"),
            default_currency: "EUR".to_string(),
            timeouts: Timeouts::default(),
        }
    }
}

/// A downloaded invoice document
#[derive(Debug, Clone)]
pub struct InvoiceArtifact {
    pub document_ref: String,
    pub bytes: Vec<u8>,
}

/// The invoice lifecycle manager
#[derive(Clone)]
pub struct InvoiceService {
    store: Arc<dyn InvoiceStore>,
    renderer: Arc<dyn DocumentRenderer>,
    artifacts: Arc<dyn ArtifactStore>,
    settings: ServiceSettings,
}

impl InvoiceService {
    pub fn new(
        store: Arc<dyn InvoiceStore>,
        renderer: Arc<dyn DocumentRenderer>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            store,
            renderer,
            artifacts,
            settings: ServiceSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ServiceSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Create an invoice and generate its document
    #[tracing::instrument(skip(self, payload), fields(owner = %caller.owner_id()))]
    pub async fn create(&self, caller: &Caller, payload: NewInvoice) -> Result<Invoice, InvoiceError> {
        let payload = Validated::new(payload)?.into_inner();
        let record = payload.into_record(caller.owner_id().clone(), &self.settings.default_currency);

        let invoice = self
            .store_call(Operation::Create, None, self.store.create(record))
            .await?;
        let id = invoice.id;
        tracing::info!(invoice_id = %id, total = invoice.total(), "invoice persisted");

        let document = InvoiceDocument::from_invoice(&invoice, &self.settings.issuer);
        let rendered = match self.render(&document).await {
            Ok(rendered) => rendered,
            Err(source) => {
                tracing::warn!(invoice_id = %id, error = %source, "document rendering failed, invoice kept without document");
                return Err(InvoiceError::Render {
                    operation: Operation::Create,
                    id,
                    source,
                });
            }
        };

        let document_ref = self
            .store_call(Operation::Create, Some(id), self.artifacts.put(&id, &rendered))
            .await
            .inspect_err(|e| {
                tracing::warn!(invoice_id = %id, error = %e, "artifact write failed, invoice kept without document")
            })?;

        let invoice = self
            .store_call(
                Operation::Create,
                Some(id),
                self.store
                    .update(&id, InvoiceChanges::attach_document(document_ref.clone())),
            )
            .await
            .inspect_err(|e| {
                tracing::warn!(invoice_id = %id, error = %e, "attaching document failed, invoice kept without document")
            })?;

        tracing::info!(invoice_id = %id, document_ref = %document_ref, "invoice created");
        Ok(invoice)
    }

    /// All invoices of the caller
    #[tracing::instrument(skip(self), fields(owner = %caller.owner_id()))]
    pub async fn find_all(&self, caller: &Caller) -> Result<Vec<Invoice>, InvoiceError> {
        let invoices = self
            .store_call(
                Operation::FindAll,
                None,
                self.store.list_by_owner(caller.owner_id()),
            )
            .await?;

        Ok(invoices
            .into_iter()
            .filter(|invoice| caller.owns(&invoice.owner_id))
            .collect())
    }

    /// One invoice of the caller
    #[tracing::instrument(skip(self), fields(owner = %caller.owner_id()))]
    pub async fn find_one(&self, caller: &Caller, id: Uuid) -> Result<Invoice, InvoiceError> {
        self.fetch_owned(Operation::FindOne, caller, id).await
    }

    /// Apply a patch to one invoice of the caller.
    ///
    /// The document is not regenerated.
    #[tracing::instrument(skip(self, patch), fields(owner = %caller.owner_id()))]
    pub async fn update(
        &self,
        caller: &Caller,
        id: Uuid,
        patch: InvoicePatch,
    ) -> Result<Invoice, InvoiceError> {
        let patch = Validated::new(patch)?.into_inner();
        let current = self.fetch_owned(Operation::Update, caller, id).await?;

        if patch.is_empty() {
            return Ok(current);
        }
        if current.status.is_terminal() {
            return Err(ValidationError::Frozen {
                status: current.status,
            }
            .into());
        }
        if let Some(next) = patch.status
            && !current.status.can_transition_to(next)
        {
            return Err(ValidationError::InvalidTransition {
                from: current.status,
                to: next,
            }
            .into());
        }

        let invoice = self
            .store_call(
                Operation::Update,
                Some(id),
                self.store.update(&id, patch.into_changes()),
            )
            .await?;

        tracing::info!(invoice_id = %id, status = %invoice.status, total = invoice.total(), "invoice updated");
        Ok(invoice)
    }

    /// Hard-delete one invoice of the caller
    #[tracing::instrument(skip(self), fields(owner = %caller.owner_id()))]
    pub async fn remove(&self, caller: &Caller, id: Uuid) -> Result<(), InvoiceError> {
        let invoice = self.fetch_owned(Operation::Remove, caller, id).await?;
        self.store_call(Operation::Remove, Some(id), self.store.delete(&id))
            .await?;

        // artifacts are not deleted here; the ref lets a cleanup job find them
        match invoice.document_ref {
            Some(document_ref) => tracing::info!(
                invoice_id = %id,
                orphaned_document_ref = %document_ref,
                "invoice removed, document left in artifact store"
            ),
            None => tracing::info!(invoice_id = %id, "invoice removed"),
        }
        Ok(())
    }

    /// The rendered document of one invoice of the caller
    #[tracing::instrument(skip(self), fields(owner = %caller.owner_id()))]
    pub async fn document(
        &self,
        caller: &Caller,
        id: Uuid,
    ) -> Result<(Invoice, InvoiceArtifact), InvoiceError> {
        let invoice = self.fetch_owned(Operation::Document, caller, id).await?;
        let Some(document_ref) = invoice.document_ref.clone() else {
            return Err(InvoiceError::NotFound { id });
        };

        let bytes = self
            .store_call(
                Operation::Document,
                Some(id),
                self.artifacts.get(&document_ref),
            )
            .await?
            .ok_or(InvoiceError::NotFound { id })?;

        Ok((invoice, InvoiceArtifact { document_ref, bytes }))
    }

    /// Fetch a record and check it belongs to the caller.
    ///
    /// A record of another owner is reported exactly like a missing one.
    async fn fetch_owned(
        &self,
        operation: Operation,
        caller: &Caller,
        id: Uuid,
    ) -> Result<Invoice, InvoiceError> {
        let found = self
            .store_call(operation, Some(id), self.store.get(&id))
            .await?;

        match found {
            Some(invoice) if caller.owns(&invoice.owner_id) => Ok(invoice),
            Some(_) => {
                tracing::debug!(invoice_id = %id, %operation, "ownership mismatch");
                Err(InvoiceError::NotFound { id })
            }
            None => Err(InvoiceError::NotFound { id }),
        }
    }

    async fn store_call<T>(
        &self,
        operation: Operation,
        id: Option<Uuid>,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, InvoiceError> {
        let result = match self.settings.timeouts.store {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(StoreError::Timeout(limit))),
            None => call.await,
        };

        result.map_err(|source| match (source, id) {
            (StoreError::NotFound { .. }, Some(id)) => InvoiceError::NotFound { id },
            (source, id) => InvoiceError::Persistence {
                operation,
                id,
                source,
            },
        })
    }

    async fn render(&self, document: &InvoiceDocument) -> Result<RenderedDocument, RenderError> {
        let call = self.renderer.render(document);
        match self.settings.timeouts.render {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(RenderError::Timeout(limit))),
            None => call.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::invoice::{InvoiceStatus, LineItem};
    use crate::render::{DocumentTemplate, TextRenderer};
    use crate::storage::{InMemoryArtifactStore, InMemoryInvoiceStore};

    fn service() -> InvoiceService {
        InvoiceService::new(
            Arc::new(InMemoryInvoiceStore::new()),
            Arc::new(TextRenderer::new(DocumentTemplate::builtin().unwrap())),
            Arc::new(InMemoryArtifactStore::new()),
        )
    }

    fn widget() -> NewInvoice {
        NewInvoice::with_items(vec![LineItem::new("Widget", 2.0, 9.5)])
    }

    #[tokio::test]
    async fn test_create_attaches_document() {
        let service = service();
        let caller = Caller::new("u1");

        let invoice = service.create(&caller, widget()).await.unwrap();
        assert_eq!(invoice.total(), 19.0);
        assert_eq!(invoice.owner_id.as_str(), "u1");
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert!(invoice.document_ref.is_some());

        let (_, artifact) = service.document(&caller, invoice.id).await.unwrap();
        assert!(String::from_utf8(artifact.bytes).unwrap().contains("TOTAL: 19.00 EUR"));
    }

    #[tokio::test]
    async fn test_status_walk() {
        let service = service();
        let caller = Caller::new("u1");
        let invoice = service.create(&caller, widget()).await.unwrap();

        let issue = InvoicePatch {
            status: Some(InvoiceStatus::Issued),
            ..Default::default()
        };
        let issued = service.update(&caller, invoice.id, issue).await.unwrap();
        assert_eq!(issued.status, InvoiceStatus::Issued);

        let back_to_draft = InvoicePatch {
            status: Some(InvoiceStatus::Draft),
            ..Default::default()
        };
        let err = service
            .update(&caller, invoice.id, back_to_draft)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InvoiceError::Validation(ValidationError::InvalidTransition { .. })
        ));

        let pay = InvoicePatch {
            status: Some(InvoiceStatus::Paid),
            ..Default::default()
        };
        service.update(&caller, invoice.id, pay).await.unwrap();

        let late_edit = InvoicePatch {
            notes: Some(Some("too late".into())),
            ..Default::default()
        };
        let err = service
            .update(&caller, invoice.id, late_edit)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InvoiceError::Validation(ValidationError::Frozen {
                status: InvoiceStatus::Paid
            })
        ));
    }

    #[tokio::test]
    async fn test_empty_patch_returns_current() {
        let service = service();
        let caller = Caller::new("u1");
        let invoice = service.create(&caller, widget()).await.unwrap();

        let same = service
            .update(&caller, invoice.id, InvoicePatch::default())
            .await
            .unwrap();
        assert_eq!(same, invoice);
    }
}
