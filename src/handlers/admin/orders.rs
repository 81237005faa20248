//! Staff order and transaction bookkeeping.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::models::{CreateOrder, Order, OrderTransaction};
use crate::payments::invoice;

/// POST /admin/orders - create an order for a user. The receiver email
/// defaults to the configured studio PayPal account.
pub async fn create_order(
    State(state): State<AppState>,
    Json(input): Json<CreateOrder>,
) -> Result<(StatusCode, Json<Order>)> {
    let conn = state.db.get()?;
    queries::get_user_by_id(&conn, input.user_id)?
        .ok_or_else(|| AppError::NotFound(format!("No user with id {}", input.user_id)))?;

    let order = queries::create_order(&conn, &input, &state.default_paypal_email)?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /admin/orders
pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<Order>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_orders(&conn)?))
}

#[derive(Debug, Deserialize)]
pub struct TransactionFilter {
    pub user_id: Option<i64>,
}

/// GET /admin/transactions - transaction records, optionally filtered by
/// the ordering user.
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(filter): Query<TransactionFilter>,
) -> Result<Json<Vec<OrderTransaction>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_transactions(&conn, filter.user_id)?))
}

/// POST /admin/orders/{id}/invoice - run the allocator for an order and
/// return the transaction record to quote to the gateway. Calling it again
/// before the payment lands returns the same record.
pub async fn prepare_invoice(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderTransaction>> {
    let conn = state.db.get()?;
    let order = queries::get_order(&conn, order_id)?
        .ok_or_else(|| AppError::NotFound(format!("No order with id {}", order_id)))?;

    let record = invoice::allocate_transaction(&conn, &order)?;
    Ok(Json(record))
}
