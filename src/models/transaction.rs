use serde::Serialize;

/// Local bookkeeping row correlating an invoice identifier with a gateway
/// transaction identifier for one order.
///
/// Created when the payment button is rendered for an order, not when the
/// payment lands, so a record with no `txn_id` is still awaiting payment
/// and gets reused rather than duplicated.
#[derive(Debug, Clone, Serialize)]
pub struct OrderTransaction {
    pub id: i64,
    pub invoice_id: Option<String>,
    pub order_id: Option<i64>,
    /// Gateway transaction id, stamped when a completed payment is processed
    pub txn_id: Option<String>,
    pub voucher_code: Option<String>,
    pub created_at: i64,
}
