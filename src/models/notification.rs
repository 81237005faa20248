use serde::{Deserialize, Serialize};

/// Payment lifecycle state asserted by an inbound gateway notification.
///
/// Anything outside the three recognised terminal/holding states is kept
/// verbatim in `Other` so warnings can echo the raw status back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    Completed,
    Pending,
    Refunded,
    Other(String),
}

impl PaymentStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "Completed" => Self::Completed,
            "Pending" => Self::Pending,
            "Refunded" => Self::Refunded,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Completed => "Completed",
            Self::Pending => "Pending",
            Self::Refunded => "Refunded",
            Self::Other(s) => s,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An asynchronous, already-verified message from the payment gateway
/// asserting a payment lifecycle event. Immutable once received, except
/// that reconciliation backfills a missing `invoice` from the local
/// transaction record and may set the flag on a receiver mismatch.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentNotification {
    pub id: i64,
    pub txn_id: String,
    pub invoice: Option<String>,
    /// Correlation payload: "<order id> [voucher code]"
    pub custom: Option<String>,
    pub receiver_email: Option<String>,
    pub payment_status: String,
    /// Validity verdict from the upstream gateway integration
    pub flag: bool,
    pub flag_info: String,
    /// Raw gateway timestamp string, stored as received
    pub payment_date: Option<String>,
    pub created_at: i64,
}

impl PaymentNotification {
    pub fn status(&self) -> PaymentStatus {
        PaymentStatus::parse(&self.payment_status)
    }
}

/// Fields accepted from the webhook form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateNotification {
    #[serde(default)]
    pub txn_id: String,
    pub invoice: Option<String>,
    pub custom: Option<String>,
    pub receiver_email: Option<String>,
    #[serde(default)]
    pub payment_status: String,
    #[serde(default)]
    pub flag: bool,
    #[serde(default)]
    pub flag_info: String,
    pub payment_date: Option<String>,
}
