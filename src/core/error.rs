//! Typed error handling for invoicer
//!
//! # Error Categories
//!
//! - [`ValidationError`]: malformed or semantically invalid input
//! - [`StoreError`]: failures reported by an invoice or artifact store
//! - [`RenderError`]: failures reported by a document renderer
//! - [`InvoiceError`]: what the invoice service returns, annotated with the
//!   operation and the invoice id where one exists
//! - [`ApiError`]: what the HTTP boundary returns
//!
//! # Example
//!
//! ```rust,ignore
//! match service.find_one(&caller, id).await {
//!     Ok(invoice) => println!("total: {}", invoice.total()),
//!     Err(InvoiceError::NotFound { id }) => println!("no invoice {}", id),
//!     Err(e) => eprintln!("other error: {}", e),
//! }
//! ```

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::core::invoice::InvoiceStatus;

// =============================================================================
// Operations
// =============================================================================

/// Service operation an error happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    FindAll,
    FindOne,
    Update,
    Remove,
    Document,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::FindAll => "find_all",
            Operation::FindOne => "find_one",
            Operation::Update => "update",
            Operation::Remove => "remove",
            Operation::Document => "document",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Invoice Errors
// =============================================================================

/// The error type returned by [`InvoiceService`](crate::core::service::InvoiceService)
#[derive(Debug)]
pub enum InvoiceError {
    /// Input rejected before any store call
    Validation(ValidationError),

    /// No invoice with this id for the calling owner.
    ///
    /// Covers both true absence and an invoice owned by someone else.
    NotFound { id: Uuid },

    /// A store (record or artifact) failed
    Persistence {
        operation: Operation,
        id: Option<Uuid>,
        source: StoreError,
    },

    /// The renderer failed. The record named by `id` has been kept.
    Render {
        operation: Operation,
        id: Uuid,
        source: RenderError,
    },
}

impl fmt::Display for InvoiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvoiceError::Validation(e) => write!(f, "{}", e),
            InvoiceError::NotFound { id } => write!(f, "invoice with id '{}' not found", id),
            InvoiceError::Persistence {
                operation,
                id: Some(id),
                source,
            } => write!(f, "{} failed to persist invoice '{}': {}", operation, id, source),
            InvoiceError::Persistence {
                operation,
                id: None,
                source,
            } => write!(f, "{} failed to persist invoice: {}", operation, source),
            InvoiceError::Render {
                operation,
                id,
                source,
            } => write!(
                f,
                "{} failed to render document for invoice '{}': {}",
                operation, id, source
            ),
        }
    }
}

impl std::error::Error for InvoiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InvoiceError::Validation(e) => Some(e),
            InvoiceError::NotFound { .. } => None,
            InvoiceError::Persistence { source, .. } => Some(source),
            InvoiceError::Render { source, .. } => Some(source),
        }
    }
}

impl InvoiceError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            InvoiceError::Validation(_) => StatusCode::BAD_REQUEST,
            InvoiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InvoiceError::Persistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            InvoiceError::Render { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            InvoiceError::Validation(_) => "VALIDATION_ERROR",
            InvoiceError::NotFound { .. } => "INVOICE_NOT_FOUND",
            InvoiceError::Persistence { .. } => "PERSISTENCE_ERROR",
            InvoiceError::Render { .. } => "RENDER_ERROR",
        }
    }

    /// The invoice the error is about, if any.
    ///
    /// For a failed `create` this is the id of the record that was kept.
    pub fn invoice_id(&self) -> Option<Uuid> {
        match self {
            InvoiceError::Validation(_) => None,
            InvoiceError::NotFound { id } => Some(*id),
            InvoiceError::Persistence { id, .. } => *id,
            InvoiceError::Render { id, .. } => Some(*id),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            InvoiceError::Validation(ValidationError::FieldErrors(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            InvoiceError::Validation(_) => None,
            InvoiceError::NotFound { id } => Some(serde_json::json!({ "id": id.to_string() })),
            InvoiceError::Persistence { operation, id, .. } => Some(serde_json::json!({
                "operation": operation.as_str(),
                "id": id.map(|id| id.to_string()),
            })),
            InvoiceError::Render { operation, id, .. } => Some(serde_json::json!({
                "operation": operation.as_str(),
                "id": id.to_string(),
            })),
        }
    }
}

impl From<ValidationError> for InvoiceError {
    fn from(err: ValidationError) -> Self {
        InvoiceError::Validation(err)
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Multiple field validation errors
    #[error("Validation errors: {}", join_fields(.0))]
    FieldErrors(Vec<FieldValidationError>),

    /// Status change not allowed by the transition table
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: InvoiceStatus,
        to: InvoiceStatus,
    },

    /// Invoice is PAID or VOID and can no longer change
    #[error("Invoice is {status} and can no longer be modified")]
    Frozen { status: InvoiceStatus },

    /// Invalid JSON format
    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },

    /// Invalid UUID format
    #[error("Invalid UUID format: {value}")]
    InvalidUuid { value: String },
}

fn join_fields(errors: &[FieldValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A single field validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

// =============================================================================
// Store Errors
// =============================================================================

/// Errors reported by invoice and artifact stores
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The record to update does not exist (any more)
    #[error("record '{id}' does not exist")]
    NotFound { id: Uuid },

    /// The backend failed to complete the call
    #[error("{backend} error: {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },

    /// A stored value could not be encoded or decoded
    #[error("failed to encode or decode stored value: {message}")]
    Codec { message: String },

    /// The call did not complete within the configured deadline
    #[error("store call timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl StoreError {
    pub fn backend(backend: &'static str, err: impl fmt::Display) -> Self {
        StoreError::Backend {
            backend,
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Render Errors
// =============================================================================

/// Errors reported by document renderers
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The document data cannot be laid out
    #[error("invalid document data: {message}")]
    InvalidData { message: String },

    /// The layout template failed to parse or render
    #[error("template error: {message}")]
    Template { message: String },

    /// The output file could not be produced
    #[error("failed to write {format} output: {message}")]
    Output {
        format: &'static str,
        message: String,
    },

    /// The render did not complete within the configured deadline
    #[error("render timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors raised by the HTTP boundary before the service is called
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// No authenticated identity on the request
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// The identity provider itself failed
    #[error("Authentication failed: {message}")]
    AuthProvider { message: String },
}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            RequestError::AuthProvider { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::Unauthorized { .. } => "UNAUTHORIZED",
            RequestError::AuthProvider { .. } => "AUTH_PROVIDER_ERROR",
        }
    }
}

// =============================================================================
// API Errors
// =============================================================================

/// Error returned by HTTP handlers
#[derive(Debug)]
pub enum ApiError {
    Invoice(InvoiceError),
    Request(RequestError),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Invoice(e) => write!(f, "{}", e),
            ApiError::Request(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Invoice(e) => Some(e),
            ApiError::Request(e) => Some(e),
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Invoice(e) => e.status_code(),
            ApiError::Request(e) => e.status_code(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Invoice(e) => e.error_code(),
            ApiError::Request(e) => e.error_code(),
        }
    }

    /// Convert to an error response.
    ///
    /// Server faults keep the store or renderer message out of the body.
    pub fn to_response(&self) -> ErrorResponse {
        let message = match self {
            ApiError::Invoice(InvoiceError::Persistence { operation, .. }) => {
                format!("{} could not be completed by the invoice store", operation)
            }
            ApiError::Invoice(InvoiceError::Render { id, .. }) => format!(
                "invoice '{}' was saved but its document could not be generated",
                id
            ),
            ApiError::Request(RequestError::AuthProvider { .. }) => {
                "authentication could not be completed".to_string()
            }
            other => other.to_string(),
        };

        let details = match self {
            ApiError::Invoice(e) => e.details(),
            ApiError::Request(_) => None,
        };

        ErrorResponse {
            code: self.error_code().to_string(),
            message,
            details,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status_code().is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

impl From<InvoiceError> for ApiError {
    fn from(err: InvoiceError) -> Self {
        ApiError::Invoice(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Invoice(InvoiceError::Validation(err))
    }
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        ApiError::Request(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ValidationError::InvalidJson {
            message: rejection.body_text(),
        }
        .into()
    }
}

impl From<uuid::Error> for ApiError {
    fn from(err: uuid::Error) -> Self {
        ValidationError::InvalidUuid {
            value: err.to_string(),
        }
        .into()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display_and_status() {
        let err = InvoiceError::NotFound { id: Uuid::nil() };
        assert!(err.to_string().contains("not found"));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), "INVOICE_NOT_FOUND");
    }

    #[test]
    fn test_persistence_error_names_operation_and_id() {
        let id = Uuid::new_v4();
        let err = InvoiceError::Persistence {
            operation: Operation::Create,
            id: Some(id),
            source: StoreError::backend("memory", "disk on fire"),
        };
        let display = err.to_string();
        assert!(display.contains("create"));
        assert!(display.contains(&id.to_string()));
        assert!(display.contains("disk on fire"));
        assert_eq!(err.invoice_id(), Some(id));
    }

    #[test]
    fn test_render_error_keeps_invoice_id() {
        let id = Uuid::new_v4();
        let err = InvoiceError::Render {
            operation: Operation::Create,
            id,
            source: RenderError::Template {
                message: "boom".into(),
            },
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.invoice_id(), Some(id));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_validation_error_multiple_fields() {
        let err = ValidationError::FieldErrors(vec![
            FieldValidationError {
                field: "line_items".to_string(),
                message: "required".to_string(),
            },
            FieldValidationError {
                field: "customer_email".to_string(),
                message: "invalid format".to_string(),
            },
        ]);
        let display = err.to_string();
        assert!(display.contains("line_items"));
        assert!(display.contains("customer_email"));
    }

    #[test]
    fn test_server_fault_response_hides_source() {
        let err = ApiError::from(InvoiceError::Persistence {
            operation: Operation::Update,
            id: Some(Uuid::nil()),
            source: StoreError::backend("lmdb", "MDB_MAP_FULL"),
        });
        let response = err.to_response();
        assert_eq!(response.code, "PERSISTENCE_ERROR");
        assert!(!response.message.contains("MDB_MAP_FULL"));
        assert_eq!(response.details.unwrap()["operation"], "update");
    }

    #[test]
    fn test_unauthorized_status() {
        let err = ApiError::from(RequestError::Unauthorized {
            message: "missing identity".into(),
        });
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.error_code(), "UNAUTHORIZED");
    }

    #[test]
    fn test_timeouts_display_millis() {
        let err = StoreError::Timeout(Duration::from_millis(250));
        assert!(err.to_string().contains("250ms"));
        let err = RenderError::Timeout(Duration::from_secs(2));
        assert!(err.to_string().contains("2000ms"));
    }
}
