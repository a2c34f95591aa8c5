//! Macro-generated test suite for `InvoiceStore` contract validation.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//!
//! use storage_harness::*;
//! use invoicer::storage::InMemoryInvoiceStore;
//!
//! invoice_store_tests!(InMemoryInvoiceStore::new());
//! ```
//!
//! # Generated Tests
//!
//! - `test_create_assigns_fresh_ids`: ids are unique, timestamps set, no document
//! - `test_create_keeps_computed_total`
//! - `test_get_nonexistent`
//! - `test_list_by_owner_scopes_and_orders`
//! - `test_list_unknown_owner_is_empty`
//! - `test_update_applies_changes`: touched fields change, others stay
//! - `test_update_nonexistent`: fails with `StoreError::NotFound`
//! - `test_delete_existing` / `test_delete_nonexistent`
//! - `test_concurrent_creates`: parallel creates from spawned tasks

/// Generate a full `InvoiceStore` conformance test suite.
///
/// `$factory` must evaluate to a fresh store. It is re-evaluated for each
/// test. For the concurrent test, the store must also be `Clone + 'static`.
#[macro_export]
macro_rules! invoice_store_tests {
    ($factory:expr) => {
        mod invoice_store_contract_tests {
            use super::*;
            use invoicer::core::error::StoreError;
            use invoicer::core::invoice::{
                InvoiceChanges, InvoiceStatus, LineItem, OwnerId, PricedLines,
            };
            use invoicer::core::store::InvoiceStore;
            use uuid::Uuid;

            #[tokio::test]
            async fn test_create_assigns_fresh_ids() {
                let store = $factory;

                let first = store.create(widget_record("alice")).await.unwrap();
                let second = store.create(widget_record("alice")).await.unwrap();

                assert_ne!(first.id, second.id);
                assert_eq!(first.created_at, first.updated_at);
                assert_eq!(first.status, InvoiceStatus::Draft);
                assert!(first.document_ref.is_none());
                assert_eq!(first.owner_id, OwnerId::new("alice"));
            }

            #[tokio::test]
            async fn test_create_keeps_computed_total() {
                let store = $factory;
                let record = record_with("alice", &[("A", 2.0, 9.5), ("B", 3.0, 1.25)]);

                let created = store.create(record).await.unwrap();
                let loaded = store.get(&created.id).await.unwrap().unwrap();

                assert_eq!(loaded.line_items().len(), 2);
                assert!((loaded.total() - 22.75).abs() < f64::EPSILON);
                assert_eq!(loaded, created);
            }

            #[tokio::test]
            async fn test_get_nonexistent() {
                let store = $factory;

                let result = store.get(&Uuid::new_v4()).await.unwrap();
                assert!(result.is_none());
            }

            #[tokio::test]
            async fn test_list_by_owner_scopes_and_orders() {
                let store = $factory;

                let a1 = store.create(widget_record("alice")).await.unwrap();
                let b1 = store.create(widget_record("bob")).await.unwrap();
                let a2 = store.create(widget_record("alice")).await.unwrap();

                let alice: Vec<Uuid> = store
                    .list_by_owner(&OwnerId::new("alice"))
                    .await
                    .unwrap()
                    .into_iter()
                    .map(|i| i.id)
                    .collect();
                assert_eq!(alice, vec![a1.id, a2.id]);

                let bob = store.list_by_owner(&OwnerId::new("bob")).await.unwrap();
                assert_eq!(bob.len(), 1);
                assert_eq!(bob[0].id, b1.id);
            }

            #[tokio::test]
            async fn test_list_unknown_owner_is_empty() {
                let store = $factory;
                store.create(widget_record("alice")).await.unwrap();

                let none = store.list_by_owner(&OwnerId::new("carol")).await.unwrap();
                assert!(none.is_empty());
            }

            #[tokio::test]
            async fn test_update_applies_changes() {
                let store = $factory;
                let created = store.create(widget_record("alice")).await.unwrap();

                let changes = InvoiceChanges {
                    lines: Some(PricedLines::new(vec![LineItem::new("X", 1.0, 5.0)])),
                    status: Some(InvoiceStatus::Issued),
                    ..Default::default()
                };
                let updated = store.update(&created.id, changes).await.unwrap();

                assert_eq!(updated.id, created.id);
                assert_eq!(updated.status, InvoiceStatus::Issued);
                assert!((updated.total() - 5.0).abs() < f64::EPSILON);
                assert_eq!(updated.currency, created.currency);
                assert_eq!(updated.created_at, created.created_at);
                assert!(updated.updated_at >= created.updated_at);

                let loaded = store.get(&created.id).await.unwrap().unwrap();
                assert_eq!(loaded, updated);
            }

            #[tokio::test]
            async fn test_update_nonexistent() {
                let store = $factory;
                let id = Uuid::new_v4();

                let err = store
                    .update(&id, InvoiceChanges::attach_document("invoice-x.pdf"))
                    .await
                    .unwrap_err();
                assert!(matches!(err, StoreError::NotFound { id: missing } if missing == id));
            }

            #[tokio::test]
            async fn test_delete_existing() {
                let store = $factory;
                let created = store.create(widget_record("alice")).await.unwrap();

                store.delete(&created.id).await.unwrap();
                assert!(store.get(&created.id).await.unwrap().is_none());
                assert!(
                    store
                        .list_by_owner(&OwnerId::new("alice"))
                        .await
                        .unwrap()
                        .is_empty()
                );
            }

            #[tokio::test]
            async fn test_delete_nonexistent() {
                let store = $factory;
                tokio_test::assert_ok!(store.delete(&Uuid::new_v4()).await);
            }

            #[tokio::test]
            async fn test_concurrent_creates() {
                let store = $factory;

                let mut handles = Vec::new();
                for _ in 0..10 {
                    let store = store.clone();
                    handles.push(tokio::spawn(async move {
                        store.create(widget_record("alice")).await.unwrap()
                    }));
                }

                let mut ids = Vec::new();
                for handle in handles {
                    ids.push(handle.await.unwrap().id);
                }
                ids.sort();
                ids.dedup();
                assert_eq!(ids.len(), 10);

                let listed = store.list_by_owner(&OwnerId::new("alice")).await.unwrap();
                assert_eq!(listed.len(), 10);
            }
        }
    };
}
