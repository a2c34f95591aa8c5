//! Storage implementations for different backends

pub mod filesystem;
pub mod in_memory;
#[cfg(feature = "lmdb")]
pub mod lmdb;

pub use filesystem::FsArtifactStore;
pub use in_memory::{InMemoryArtifactStore, InMemoryInvoiceStore};
#[cfg(feature = "lmdb")]
pub use lmdb::LmdbInvoiceStore;
