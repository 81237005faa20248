//! Invoice/transaction allocation.
//!
//! A transaction record is minted when the payment button is rendered for an
//! order, not when the payment lands. Re-rendering the button before the
//! payment arrives must therefore reuse the pending record instead of
//! minting a fresh invoice number - PayPal would happily accept a second
//! payment under a different invoice.

use rusqlite::Connection;

use crate::db::queries;
use crate::error::{AppError, Result};
use crate::models::{Order, OrderTransaction};

/// Base of every locally minted invoice id; the counter (and, on collision,
/// a random 3-digit prefix) follows the '#'.
pub const INVOICE_PREFIX: &str = "order-inv#";

/// Width of the incrementing counter suffix.
const COUNTER_WIDTH: usize = 3;

/// Return the transaction record to use for an order, creating one if
/// necessary.
///
/// Existing records are scanned newest-invoice-first: any record still
/// waiting for its gateway transaction id is reused as-is. Otherwise the
/// counter from the newest invoice is incremented (zero-padded to the same
/// width); with no records at all the counter starts at "001". A global
/// collision on the computed id (same invoice for a different order) is
/// resolved by inserting a random 3-digit prefix between base and counter.
pub fn allocate_transaction(conn: &Connection, order: &Order) -> Result<OrderTransaction> {
    let existing = queries::transactions_for_order(conn, order.id)?;

    let counter = if let Some(newest) = existing.first() {
        for record in &existing {
            if record.txn_id.is_none() {
                return Ok(record.clone());
            }
        }
        next_counter(newest.invoice_id.as_deref().unwrap_or_default())?
    } else {
        format!("{:0width$}", 1, width = COUNTER_WIDTH)
    };

    let mut invoice_id = format!("{}{}", INVOICE_PREFIX, counter);
    if queries::invoice_exists(conn, &invoice_id)? {
        // Same invoice id already minted for a different order (the
        // per-order scan above covered this order's records)
        use rand::Rng;
        let random_prefix: u32 = rand::thread_rng().gen_range(100..999);
        invoice_id = format!("{}{}{}", INVOICE_PREFIX, random_prefix, counter);
    }

    queries::create_transaction(conn, &invoice_id, order.id)
}

/// Increment the numeric suffix of an invoice id, preserving its width.
fn next_counter(latest_invoice: &str) -> Result<String> {
    if latest_invoice.len() < COUNTER_WIDTH {
        return Err(AppError::Internal(format!(
            "Malformed invoice id {:?}: no counter suffix",
            latest_invoice
        )));
    }
    let suffix = &latest_invoice[latest_invoice.len() - COUNTER_WIDTH..];
    let current: u32 = suffix.parse().map_err(|_| {
        AppError::Internal(format!(
            "Malformed invoice id {:?}: non-numeric counter suffix",
            latest_invoice
        ))
    })?;
    Ok(format!("{:0width$}", current + 1, width = COUNTER_WIDTH))
}
