//! # Invoicer
//!
//! Invoice lifecycle management behind a small REST API.
//!
//! ## Features
//!
//! - **Owner scoping**: every operation runs for an authenticated caller and
//!   never sees another owner's invoices
//! - **Computed totals**: the total is always derived from the line items
//! - **Status lifecycle**: DRAFT → ISSUED → PAID, with VOID as an exit; paid
//!   and void invoices are frozen
//! - **Document generation**: a PDF (or text) document is rendered and stored
//!   when an invoice is created
//! - **Pluggable storage**: in-memory, or LMDB with the `lmdb` feature
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use invoicer::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = InvoicingConfig::from_yaml_file("config/invoicing.yaml")?;
//!
//!     ServerBuilder::new()
//!         .with_config(config)
//!         .with_store(InMemoryInvoiceStore::new())
//!         .serve()
//!         .await
//! }
//! ```

pub mod config;
pub mod core;
pub mod render;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        auth::{AuthContext, AuthProvider, Caller, HeaderAuthProvider, StaticAuthProvider},
        error::{ApiError, InvoiceError, RenderError, StoreError, ValidationError},
        invoice::{Invoice, InvoicePatch, InvoiceStatus, LineItem, NewInvoice, OwnerId},
        service::{InvoiceService, ServiceSettings, Timeouts},
        store::{ArtifactStore, InvoiceStore},
    };

    // === Rendering ===
    pub use crate::render::{
        DocumentRenderer, DocumentTemplate, InvoiceDocument, IssuerInfo, PdfRenderer,
        RenderedDocument, TextRenderer,
    };

    // === Storage ===
    pub use crate::storage::{FsArtifactStore, InMemoryArtifactStore, InMemoryInvoiceStore};
    #[cfg(feature = "lmdb")]
    pub use crate::storage::LmdbInvoiceStore;

    // === Config ===
    pub use crate::config::{DocumentFormat, InvoicingConfig};

    // === Server ===
    pub use crate::server::{AppState, ServerBuilder};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
