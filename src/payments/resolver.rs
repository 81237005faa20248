//! Mapping an inbound notification to {order, transaction record, voucher}.

use rusqlite::Connection;

use crate::db::queries;
use crate::models::{Order, OrderTransaction, PaymentNotification, User};
use crate::payments::{invoice, ReconcileError};

/// Explicit outcome of looking up an order's transaction records.
///
/// Steady state is exactly one record per order, but a historical race
/// (e.g. the user renaming themselves between ordering and paying, back
/// when invoice ids embedded the username) can leave several. The
/// disambiguation policy lives in [`resolve`] as explicit branches.
#[derive(Debug)]
pub enum TransactionLookup {
    None,
    One(OrderTransaction),
    Many(Vec<OrderTransaction>),
}

impl TransactionLookup {
    pub fn from_records(mut records: Vec<OrderTransaction>) -> Self {
        match records.len() {
            0 => Self::None,
            1 => Self::One(records.remove(0)),
            _ => Self::Many(records),
        }
    }
}

/// A notification successfully mapped to local state.
#[derive(Debug)]
pub struct ResolvedPayment {
    pub order: Order,
    pub user: User,
    pub transaction: OrderTransaction,
    pub voucher_code: Option<String>,
}

/// Parse the correlation payload: first whitespace-separated token is the
/// order id, optional second token a voucher code.
fn parse_custom(custom: Option<&str>) -> Result<(i64, Option<String>), ReconcileError> {
    let mut tokens = custom.unwrap_or("").split_whitespace();

    let order_id = tokens
        .next()
        .and_then(|t| t.parse::<i64>().ok())
        .ok_or_else(|| ReconcileError::UnresolvedReference("Unknown object for payment".into()))?;

    let voucher_code = tokens.next().map(String::from);

    Ok((order_id, voucher_code))
}

/// Map a notification to its order, transaction record and voucher code.
///
/// Fails with `UnresolvedReference` when the payload is missing/malformed
/// or names an order that does not exist. When the order has no transaction
/// record yet, one is allocated; with several, the record matching the
/// notification's invoice wins, else the most recently created.
pub fn resolve(
    conn: &Connection,
    ipn: &PaymentNotification,
) -> Result<ResolvedPayment, ReconcileError> {
    let (order_id, voucher_code) = parse_custom(ipn.custom.as_deref())?;

    let order = queries::get_order(conn, order_id)?.ok_or_else(|| {
        ReconcileError::UnresolvedReference(format!("Order with id {} does not exist", order_id))
    })?;

    let user = queries::get_user_by_id(conn, order.user_id)?.ok_or_else(|| {
        ReconcileError::UnresolvedReference(format!(
            "User with id {} for order {} does not exist",
            order.user_id, order.id
        ))
    })?;

    let lookup = TransactionLookup::from_records(queries::transactions_for_order(conn, order.id)?);

    let transaction = match lookup {
        TransactionLookup::None => invoice::allocate_transaction(conn, &order)?,
        TransactionLookup::One(record) => record,
        TransactionLookup::Many(records) => {
            let by_invoice = ipn
                .invoice
                .as_deref()
                .filter(|inv| !inv.is_empty())
                .and_then(|inv| {
                    records
                        .iter()
                        .find(|r| r.invoice_id.as_deref() == Some(inv))
                        .cloned()
                });
            match by_invoice {
                Some(record) => record,
                // No invoice to match on: the most recently created wins
                None => records
                    .into_iter()
                    .max_by_key(|r| r.id)
                    .expect("Many always holds at least two records"),
            }
        }
    };

    Ok(ResolvedPayment {
        order,
        user,
        transaction,
        voucher_code,
    })
}
