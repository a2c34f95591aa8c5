//! Core module containing the invoice model, the lifecycle service and the
//! traits it depends on

pub mod auth;
pub mod error;
pub mod invoice;
pub mod service;
pub mod store;
pub mod validation;

pub use auth::{AuthContext, AuthProvider, Caller, HeaderAuthProvider, StaticAuthProvider};
pub use error::{
    ApiError, ErrorResponse, FieldValidationError, InvoiceError, Operation, RenderError,
    RequestError, StoreError, ValidationError,
};
pub use invoice::{
    Invoice, InvoiceChanges, InvoicePatch, InvoiceStatus, LineItem, NewInvoice, NewInvoiceRecord,
    OwnerId, PricedLines, compute_total,
};
pub use service::{InvoiceArtifact, InvoiceService, ServiceSettings, Timeouts};
pub use store::{ArtifactStore, InvoiceStore, artifact_name};
pub use validation::Validated;
