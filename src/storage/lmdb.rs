//! LMDB invoice store using heed (memory-mapped B-tree).
//!
//! LMDB is an embedded key-value store, no external server required.
//! All operations are synchronous (memory-mapped I/O) and are wrapped in
//! `tokio::task::spawn_blocking` for async compatibility.
//!
//! # Databases (named LMDB sub-databases)
//!
//! - `invoices`: invoice records keyed by UUID string (JSON-encoded values)
//!
//! # Feature flag
//!
//! Enable with `--features lmdb`. Requires the `heed` crate.

use crate::core::error::StoreError;
use crate::core::invoice::{Invoice, InvoiceChanges, NewInvoiceRecord, OwnerId};
use crate::core::store::InvoiceStore;
use async_trait::async_trait;
use chrono::Utc;
use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

const BACKEND: &str = "lmdb";

fn lmdb_error(e: impl std::fmt::Display) -> StoreError {
    StoreError::backend(BACKEND, e)
}

/// Encode a record as JSON bytes for LMDB storage.
fn lmdb_encode(invoice: &Invoice) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(invoice).map_err(|e| StoreError::Codec {
        message: format!("lmdb encode: {}", e),
    })
}

/// Decode a record from JSON bytes.
fn lmdb_decode(bytes: &[u8]) -> Result<Invoice, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Codec {
        message: format!("lmdb decode: {}", e),
    })
}

async fn blocking<T, F>(task: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| lmdb_error(format!("blocking task failed: {}", e)))?
}

/// LMDB-backed implementation of [`InvoiceStore`].
///
/// The `Env` is wrapped in an `Arc` for cheap cloning across async tasks.
/// Updates read and write the record inside one write transaction.
///
/// # Example
///
/// ```rust,ignore
/// use invoicer::storage::LmdbInvoiceStore;
///
/// let store = LmdbInvoiceStore::open("data/invoices")?;
/// let invoice = store.create(record).await?;
/// ```
#[derive(Clone)]
pub struct LmdbInvoiceStore {
    env: Arc<Env>,
    db: Database<Str, Bytes>,
}

impl LmdbInvoiceStore {
    /// Open (or create) an LMDB environment at `path` and initialise the
    /// `invoices` named database.
    ///
    /// The map size defaults to 256 MB. LMDB will not actually allocate that
    /// much, it is a virtual address space reservation.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path.as_ref()).map_err(lmdb_error)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(256 * 1024 * 1024)
                .max_dbs(10)
                .max_readers(126)
                .open(path.as_ref())
                .map_err(lmdb_error)?
        };

        let mut wtxn = env.write_txn().map_err(lmdb_error)?;
        let db: Database<Str, Bytes> = env
            .create_database(&mut wtxn, Some("invoices"))
            .map_err(lmdb_error)?;
        wtxn.commit().map_err(lmdb_error)?;

        tracing::info!(path = %path.as_ref().display(), "opened lmdb invoice store");

        Ok(Self {
            env: Arc::new(env),
            db,
        })
    }
}

#[async_trait]
impl InvoiceStore for LmdbInvoiceStore {
    async fn create(&self, record: NewInvoiceRecord) -> Result<Invoice, StoreError> {
        let env = self.env.clone();
        let db = self.db;
        let invoice = Invoice::from_record(Uuid::new_v4(), record, Utc::now());
        let key = invoice.id.to_string();
        let bytes = lmdb_encode(&invoice)?;

        blocking(move || {
            let mut wtxn = env.write_txn().map_err(lmdb_error)?;
            db.put(&mut wtxn, &key, &bytes).map_err(lmdb_error)?;
            wtxn.commit().map_err(lmdb_error)?;
            Ok(invoice)
        })
        .await
    }

    async fn get(&self, id: &Uuid) -> Result<Option<Invoice>, StoreError> {
        let env = self.env.clone();
        let db = self.db;
        let key = id.to_string();

        blocking(move || {
            let rtxn = env.read_txn().map_err(lmdb_error)?;
            match db.get(&rtxn, &key).map_err(lmdb_error)? {
                Some(bytes) => Ok(Some(lmdb_decode(bytes)?)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn list_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<Invoice>, StoreError> {
        let env = self.env.clone();
        let db = self.db;
        let owner_id = owner_id.clone();

        blocking(move || {
            let rtxn = env.read_txn().map_err(lmdb_error)?;
            let mut results = Vec::new();
            for item in db.iter(&rtxn).map_err(lmdb_error)? {
                let (_key, bytes) = item.map_err(lmdb_error)?;
                let invoice = lmdb_decode(bytes)?;
                if invoice.owner_id == owner_id {
                    results.push(invoice);
                }
            }
            // keys are random uuids, so restore creation order
            results.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Ok(results)
        })
        .await
    }

    async fn update(&self, id: &Uuid, changes: InvoiceChanges) -> Result<Invoice, StoreError> {
        let env = self.env.clone();
        let db = self.db;
        let id = *id;
        let key = id.to_string();

        blocking(move || {
            let mut wtxn = env.write_txn().map_err(lmdb_error)?;
            let mut invoice = match db.get(&wtxn, &key).map_err(lmdb_error)? {
                Some(bytes) => lmdb_decode(bytes)?,
                None => return Err(StoreError::NotFound { id }),
            };
            invoice.apply(changes, Utc::now());

            let bytes = lmdb_encode(&invoice)?;
            db.put(&mut wtxn, &key, &bytes).map_err(lmdb_error)?;
            wtxn.commit().map_err(lmdb_error)?;
            Ok(invoice)
        })
        .await
    }

    async fn delete(&self, id: &Uuid) -> Result<(), StoreError> {
        let env = self.env.clone();
        let db = self.db;
        let key = id.to_string();

        blocking(move || {
            let mut wtxn = env.write_txn().map_err(lmdb_error)?;
            db.delete(&mut wtxn, &key).map_err(lmdb_error)?;
            wtxn.commit().map_err(lmdb_error)?;
            Ok(())
        })
        .await
    }
}
