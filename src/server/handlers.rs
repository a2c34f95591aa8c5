//! HTTP handlers for invoice operations
//!
//! Handlers only translate between HTTP and [`InvoiceService`]. The caller
//! identity comes from the configured [`AuthProvider`]; request bodies never
//! decide who owns an invoice.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, State},
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::auth::{AuthProvider, Caller};
use crate::core::error::{ApiError, RequestError};
use crate::core::invoice::{Invoice, InvoicePatch, NewInvoice};
use crate::core::service::InvoiceService;
use crate::render::content_type_for;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<InvoiceService>,
    pub auth: Arc<dyn AuthProvider>,
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let context = state
            .auth
            .extract_context(&parts.headers)
            .await
            .map_err(|e| RequestError::AuthProvider {
                message: e.to_string(),
            })?;

        context.caller().ok_or_else(|| {
            RequestError::Unauthorized {
                message: "no authenticated user on the request".to_string(),
            }
            .into()
        })
    }
}

/// JSON body whose rejections become validation errors
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Response for list invoices endpoint
#[derive(Debug, Serialize)]
pub struct ListInvoicesResponse {
    pub invoices: Vec<Invoice>,
    pub count: usize,
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Ok(Uuid::parse_str(raw)?)
}

/// POST /invoices
pub async fn create_invoice(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(payload): JsonBody<NewInvoice>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = state.service.create(&caller, payload).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// GET /invoices
pub async fn list_invoices(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<ListInvoicesResponse>, ApiError> {
    let invoices = state.service.find_all(&caller).await?;
    let count = invoices.len();
    Ok(Json(ListInvoicesResponse { invoices, count }))
}

/// GET /invoices/{id}
pub async fn get_invoice(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<Invoice>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.service.find_one(&caller, id).await?))
}

/// PATCH /invoices/{id}
pub async fn update_invoice(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<InvoicePatch>,
) -> Result<Json<Invoice>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.service.update(&caller, id, patch).await?))
}

/// DELETE /invoices/{id}
pub async fn delete_invoice(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.service.remove(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /invoices/{id}/document
pub async fn get_invoice_document(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let (_, artifact) = state.service.document(&caller, id).await?;

    let disposition = format!("inline; filename=\"{}\"", artifact.document_ref);
    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&artifact.document_ref).to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response())
}
