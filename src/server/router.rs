//! Router assembly for the invoice API

use axum::{
    Json, Router,
    routing::{get, post},
};
use serde_json::{Value, json};

use super::handlers::{
    AppState, create_invoice, delete_invoice, get_invoice, get_invoice_document, list_invoices,
    update_invoice,
};

/// Build invoice routes
///
/// - POST   /invoices                create
/// - GET    /invoices                list the caller's invoices
/// - GET    /invoices/{id}           read one
/// - PATCH  /invoices/{id}           update
/// - DELETE /invoices/{id}           remove
/// - GET    /invoices/{id}/document  download the generated document
pub fn build_invoice_routes(state: AppState) -> Router {
    Router::new()
        .route("/invoices", post(create_invoice).get(list_invoices))
        .route(
            "/invoices/{id}",
            get(get_invoice).patch(update_invoice).delete(delete_invoice),
        )
        .route("/invoices/{id}/document", get(get_invoice_document))
        .with_state(state)
}

/// Build the complete application router
///
/// Invoice routes are nested under `api_prefix` (empty means root); the
/// health routes always stay at the root.
pub fn build_router(state: AppState, api_prefix: &str) -> Router {
    let invoice_routes = build_invoice_routes(state);
    let api = match api_prefix.trim_end_matches('/') {
        "" => invoice_routes,
        prefix => Router::new().nest(prefix, invoice_routes),
    };

    health_routes().merge(api)
}

/// Build health check routes
fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
}

/// Health check endpoint handler
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "invoicer-rs"
    }))
}
