//! Payment reconciliation: matching inbound gateway notifications to local
//! orders, invoice bookkeeping, and the unpaid -> paid -> refunded state
//! machine.

pub mod invoice;
pub mod reconcile;
pub mod resolver;

pub use resolver::{ResolvedPayment, TransactionLookup};

use thiserror::Error;

use crate::error::AppError;

/// Conditions raised while reconciling a payment notification.
///
/// All of these are caught at the reconciliation boundary and converted to
/// operator warning emails; none reach the webhook transport, which always
/// answers the gateway with success to stop pointless retries.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The notification could not be mapped to a local order
    #[error("{0}")]
    UnresolvedReference(String),

    /// The payment arrived at a receiver account other than the one on file
    #[error("Invalid receiver_email ({0})")]
    ReceiverMismatch(String),

    #[error(
        "PayPal payment returned with status PENDING for order {order_id}; \
         ipn obj id {notification_id} (txn id {txn_id}).  This is usually due to an \
         unrecognised or unverified paypal email address."
    )]
    PendingPayment {
        order_id: i64,
        notification_id: i64,
        txn_id: String,
    },

    #[error(
        "Unexpected payment status {status} for order {order_id}; \
         ipn obj id {notification_id} (txn id {txn_id})"
    )]
    UnexpectedStatus {
        status: String,
        order_id: i64,
        notification_id: i64,
        txn_id: String,
    },

    /// Anything unclassified (database, voucher lookup, ...)
    #[error("{0}")]
    App(#[from] AppError),
}
