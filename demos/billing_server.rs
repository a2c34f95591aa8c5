//! Billing Server Example
//!
//! Runs the invoice API with the configuration from `config/invoicing.yaml`
//! (or the path given as first argument). Identity is read from the
//! `x-user-id` header, as an upstream gateway would set it.
//!
//! ```text
//! curl -X POST localhost:3000/api/invoices \
//!   -H 'x-user-id: alice' -H 'content-type: application/json' \
//!   -d '{"line_items":[{"description":"Widget","quantity":2,"unit_price":9.5}]}'
//! ```

use anyhow::Result;
use invoicer::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/invoicing.yaml".to_string());
    let config = InvoicingConfig::from_yaml_file(&path)?;
    let prefix = config.server.api_prefix.clone();
    let address = config.server.address();

    println!("🚀 Starting invoicer on http://{}", address);
    println!("\n📚 Routes:");
    println!("    POST   {}/invoices                 - Create an invoice", prefix);
    println!("    GET    {}/invoices                 - List your invoices", prefix);
    println!("    GET    {}/invoices/{{id}}            - Get an invoice", prefix);
    println!("    PATCH  {}/invoices/{{id}}            - Update an invoice", prefix);
    println!("    DELETE {}/invoices/{{id}}            - Delete an invoice", prefix);
    println!("    GET    {}/invoices/{{id}}/document   - Download the document", prefix);

    ServerBuilder::new().with_config(config).serve().await
}
