use serde::Serialize;

/// A discount code. Users who redeem one through a payment are attached to
/// it so later orders can honour the discount.
#[derive(Debug, Clone, Serialize)]
pub struct Voucher {
    pub id: i64,
    pub code: String,
}
