use serde::{Deserialize, Serialize};

/// A purchase awaiting or having received payment.
///
/// `paypal_email` is the receiver account the payment must arrive at;
/// reconciliation rejects completed notifications addressed elsewhere.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub paypal_email: String,
    pub paid: bool,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrder {
    pub user_id: i64,
    /// Defaults to the configured studio receiver email when omitted
    pub paypal_email: Option<String>,
}
