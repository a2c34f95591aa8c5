//! Server module for building the invoice HTTP server
//!
//! This module provides a `ServerBuilder` that wires the invoice service to
//! its stores and renderer and registers:
//! - Invoice routes under the configured API prefix
//! - Health check routes

pub mod builder;
pub mod handlers;
pub mod router;

pub use builder::ServerBuilder;
pub use handlers::{AppState, JsonBody, ListInvoicesResponse};
pub use router::{build_invoice_routes, build_router};
