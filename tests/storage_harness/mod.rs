//! Shared test harness for storage backend testing
//!
//! Provides record builders and the `invoice_store_tests!` macro, which runs
//! the `InvoiceStore` contract against any backend.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//! use storage_harness::*;
//! ```

#![allow(dead_code)]

use invoicer::core::invoice::{LineItem, NewInvoice, NewInvoiceRecord, OwnerId};

#[macro_use]
pub mod invoice_store_tests;

/// A record with one line per `(description, quantity, unit_price)`
pub fn record_with(owner: &str, items: &[(&str, f64, f64)]) -> NewInvoiceRecord {
    let items = items
        .iter()
        .map(|(description, quantity, unit_price)| {
            LineItem::new(*description, *quantity, *unit_price)
        })
        .collect();
    NewInvoice::with_items(items).into_record(OwnerId::new(owner), "EUR")
}

/// The canonical one-line record: 2 × 9.50 = 19.00
pub fn widget_record(owner: &str) -> NewInvoiceRecord {
    record_with(owner, &[("Widget", 2.0, 9.5)])
}
