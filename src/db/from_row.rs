//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Trait for constructing a type from a database row.
///
/// Implementing this trait allows using the `query_one` and `query_all`
/// helper functions, reducing repetitive row mapping closures.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const USER_COLS: &str =
    "id, username, email, first_name, last_name, is_staff, created_at";

pub const ORDER_COLS: &str = "id, user_id, paypal_email, paid, created_at";

pub const TRANSACTION_COLS: &str =
    "id, invoice_id, order_id, txn_id, voucher_code, created_at";

pub const TRANSACTION_COLS_PREFIXED: &str =
    "t.id, t.invoice_id, t.order_id, t.txn_id, t.voucher_code, t.created_at";

pub const NOTIFICATION_COLS: &str = "id, txn_id, invoice, custom, receiver_email, payment_status, flag, flag_info, payment_date, created_at";

pub const CATEGORY_COLS: &str = "id, name, description, slug, created_at";

pub const IMAGE_COLS: &str = "id, category_id, filename, caption, created_at";

pub const VOUCHER_COLS: &str = "id, code";

pub const ACTIVITY_COLS: &str = "id, log, created_at";

// ============ FromRow Implementations ============

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            first_name: row.get(3)?,
            last_name: row.get(4)?,
            is_staff: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

impl FromRow for Order {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Order {
            id: row.get(0)?,
            user_id: row.get(1)?,
            paypal_email: row.get(2)?,
            paid: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl FromRow for OrderTransaction {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(OrderTransaction {
            id: row.get(0)?,
            invoice_id: row.get(1)?,
            order_id: row.get(2)?,
            txn_id: row.get(3)?,
            voucher_code: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

impl FromRow for PaymentNotification {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(PaymentNotification {
            id: row.get(0)?,
            txn_id: row.get(1)?,
            invoice: row.get(2)?,
            custom: row.get(3)?,
            receiver_email: row.get(4)?,
            payment_status: row.get(5)?,
            flag: row.get(6)?,
            flag_info: row.get(7)?,
            payment_date: row.get(8)?,
            created_at: row.get(9)?,
        })
    }
}

impl FromRow for Category {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            slug: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl FromRow for Image {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Image {
            id: row.get(0)?,
            category_id: row.get(1)?,
            filename: row.get(2)?,
            caption: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl FromRow for Voucher {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Voucher {
            id: row.get(0)?,
            code: row.get(1)?,
        })
    }
}

impl FromRow for ActivityEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ActivityEntry {
            id: row.get(0)?,
            log: row.get(1)?,
            created_at: row.get(2)?,
        })
    }
}
