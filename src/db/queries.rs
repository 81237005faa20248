use chrono::Utc;
use rusqlite::{params, Connection};
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::models::*;

use super::from_row::{
    query_all, query_one, ACTIVITY_COLS, CATEGORY_COLS, IMAGE_COLS, NOTIFICATION_COLS,
    ORDER_COLS, TRANSACTION_COLS, TRANSACTION_COLS_PREFIXED, USER_COLS, VOUCHER_COLS,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

/// Generate a new staff API key ("dk_" + 32 random alphanumerics).
pub fn generate_api_key() -> String {
    use rand::distributions::Alphanumeric;
    use rand::Rng;
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    format!("dk_{}", suffix)
}

/// Hash an API key for storage/lookup. Keys are high-entropy random
/// strings, so a plain SHA-256 is sufficient.
pub fn hash_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

// ============ Users ============

pub fn create_user(conn: &Connection, input: &CreateUser) -> Result<User> {
    let now = now();
    let email = input.email.trim().to_lowercase();

    conn.execute(
        "INSERT INTO users (username, email, first_name, last_name, is_staff, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            &input.username,
            &email,
            &input.first_name,
            &input.last_name,
            input.is_staff,
            now
        ],
    )?;

    Ok(User {
        id: conn.last_insert_rowid(),
        username: input.username.clone(),
        email,
        first_name: input.first_name.clone(),
        last_name: input.last_name.clone(),
        is_staff: input.is_staff,
        created_at: now,
    })
}

pub fn get_user_by_id(conn: &Connection, id: i64) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        &[&id],
    )
}

pub fn get_user_by_api_key(conn: &Connection, api_key: &str) -> Result<Option<User>> {
    let hash = hash_api_key(api_key);
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE api_key_hash = ?1", USER_COLS),
        &[&hash],
    )
}

pub fn set_user_api_key(conn: &Connection, user_id: i64, api_key: &str) -> Result<bool> {
    let hash = hash_api_key(api_key);
    let affected = conn.execute(
        "UPDATE users SET api_key_hash = ?1 WHERE id = ?2",
        params![&hash, user_id],
    )?;
    Ok(affected > 0)
}

pub fn count_staff_users(conn: &Connection) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE is_staff = 1",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ============ Orders ============

pub fn create_order(conn: &Connection, input: &CreateOrder, default_email: &str) -> Result<Order> {
    let now = now();
    let paypal_email = input
        .paypal_email
        .clone()
        .unwrap_or_else(|| default_email.to_string());

    conn.execute(
        "INSERT INTO orders (user_id, paypal_email, paid, created_at)
         VALUES (?1, ?2, 0, ?3)",
        params![input.user_id, &paypal_email, now],
    )?;

    Ok(Order {
        id: conn.last_insert_rowid(),
        user_id: input.user_id,
        paypal_email,
        paid: false,
        created_at: now,
    })
}

pub fn get_order(conn: &Connection, id: i64) -> Result<Option<Order>> {
    query_one(
        conn,
        &format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLS),
        &[&id],
    )
}

pub fn list_orders(conn: &Connection) -> Result<Vec<Order>> {
    query_all(
        conn,
        &format!("SELECT {} FROM orders ORDER BY id", ORDER_COLS),
        &[],
    )
}

pub fn set_order_paid(conn: &Connection, id: i64, paid: bool) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE orders SET paid = ?1 WHERE id = ?2",
        params![paid, id],
    )?;
    Ok(affected > 0)
}

// ============ Order transactions ============

pub fn create_transaction(
    conn: &Connection,
    invoice_id: &str,
    order_id: i64,
) -> Result<OrderTransaction> {
    let now = now();
    conn.execute(
        "INSERT INTO order_transactions (invoice_id, order_id, created_at)
         VALUES (?1, ?2, ?3)",
        params![invoice_id, order_id, now],
    )?;

    Ok(OrderTransaction {
        id: conn.last_insert_rowid(),
        invoice_id: Some(invoice_id.to_string()),
        order_id: Some(order_id),
        txn_id: None,
        voucher_code: None,
        created_at: now,
    })
}

pub fn get_transaction(conn: &Connection, id: i64) -> Result<Option<OrderTransaction>> {
    query_one(
        conn,
        &format!("SELECT {} FROM order_transactions WHERE id = ?1", TRANSACTION_COLS),
        &[&id],
    )
}

/// All transaction records for an order, newest invoice first (the
/// allocator reads the current counter off the top row).
pub fn transactions_for_order(conn: &Connection, order_id: i64) -> Result<Vec<OrderTransaction>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM order_transactions WHERE order_id = ?1 ORDER BY invoice_id DESC",
            TRANSACTION_COLS
        ),
        &[&order_id],
    )
}

/// Global invoice-id collision check, independent of order.
pub fn invoice_exists(conn: &Connection, invoice_id: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM order_transactions WHERE invoice_id = ?1",
        params![invoice_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn count_transactions(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM order_transactions", [], |row| {
        row.get(0)
    })?;
    Ok(count)
}

pub fn set_transaction_txn_id(conn: &Connection, id: i64, txn_id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE order_transactions SET txn_id = ?1 WHERE id = ?2",
        params![txn_id, id],
    )?;
    Ok(affected > 0)
}

pub fn set_transaction_voucher(conn: &Connection, id: i64, code: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE order_transactions SET voucher_code = ?1 WHERE id = ?2",
        params![code, id],
    )?;
    Ok(affected > 0)
}

/// Transactions joined to their ordering user, optionally filtered by user
/// (the admin list's user filter).
pub fn list_transactions(conn: &Connection, user_id: Option<i64>) -> Result<Vec<OrderTransaction>> {
    match user_id {
        Some(uid) => query_all(
            conn,
            &format!(
                "SELECT {} FROM order_transactions t
                 JOIN orders o ON o.id = t.order_id
                 WHERE o.user_id = ?1 ORDER BY t.id",
                TRANSACTION_COLS_PREFIXED
            ),
            &[&uid],
        ),
        None => query_all(
            conn,
            &format!("SELECT {} FROM order_transactions ORDER BY id", TRANSACTION_COLS),
            &[],
        ),
    }
}

// ============ Payment notifications ============

pub fn create_notification(
    conn: &Connection,
    input: &CreateNotification,
) -> Result<PaymentNotification> {
    let now = now();
    conn.execute(
        "INSERT INTO payment_notifications
         (txn_id, invoice, custom, receiver_email, payment_status, flag, flag_info, payment_date, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            &input.txn_id,
            &input.invoice,
            &input.custom,
            &input.receiver_email,
            &input.payment_status,
            input.flag,
            &input.flag_info,
            &input.payment_date,
            now
        ],
    )?;

    Ok(PaymentNotification {
        id: conn.last_insert_rowid(),
        txn_id: input.txn_id.clone(),
        invoice: input.invoice.clone(),
        custom: input.custom.clone(),
        receiver_email: input.receiver_email.clone(),
        payment_status: input.payment_status.clone(),
        flag: input.flag,
        flag_info: input.flag_info.clone(),
        payment_date: input.payment_date.clone(),
        created_at: now,
    })
}

pub fn get_notification(conn: &Connection, id: i64) -> Result<Option<PaymentNotification>> {
    query_one(
        conn,
        &format!("SELECT {} FROM payment_notifications WHERE id = ?1", NOTIFICATION_COLS),
        &[&id],
    )
}

pub fn count_notifications(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM payment_notifications", [], |row| {
        row.get(0)
    })?;
    Ok(count)
}

/// Flag a stored notification after the fact (e.g. receiver email mismatch
/// discovered during reconciliation).
pub fn set_notification_flag(conn: &Connection, id: i64, flag_info: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE payment_notifications SET flag = 1, flag_info = ?1 WHERE id = ?2",
        params![flag_info, id],
    )?;
    Ok(affected > 0)
}

/// Backfill the invoice field on a stored notification.
pub fn set_notification_invoice(conn: &Connection, id: i64, invoice: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE payment_notifications SET invoice = ?1 WHERE id = ?2",
        params![invoice, id],
    )?;
    Ok(affected > 0)
}

// ============ Vouchers ============

pub fn create_voucher(conn: &Connection, code: &str) -> Result<Voucher> {
    conn.execute("INSERT INTO vouchers (code) VALUES (?1)", params![code])?;
    Ok(Voucher {
        id: conn.last_insert_rowid(),
        code: code.to_string(),
    })
}

pub fn get_voucher_by_code(conn: &Connection, code: &str) -> Result<Option<Voucher>> {
    query_one(
        conn,
        &format!("SELECT {} FROM vouchers WHERE code = ?1", VOUCHER_COLS),
        &[&code],
    )
}

pub fn add_voucher_user(conn: &Connection, voucher_id: i64, user_id: i64) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO voucher_users (voucher_id, user_id) VALUES (?1, ?2)",
        params![voucher_id, user_id],
    )?;
    Ok(())
}

pub fn voucher_has_user(conn: &Connection, voucher_id: i64, user_id: i64) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM voucher_users WHERE voucher_id = ?1 AND user_id = ?2",
        params![voucher_id, user_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

// ============ Categories ============

pub fn create_category(
    conn: &Connection,
    name: &str,
    description: Option<&str>,
    slug: &str,
) -> Result<Category> {
    let now = now();
    conn.execute(
        "INSERT INTO categories (name, description, slug, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![name, description, slug, now],
    )?;

    Ok(Category {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        description: description.map(String::from),
        slug: slug.to_string(),
        created_at: now,
    })
}

pub fn get_category(conn: &Connection, id: i64) -> Result<Option<Category>> {
    query_one(
        conn,
        &format!("SELECT {} FROM categories WHERE id = ?1", CATEGORY_COLS),
        &[&id],
    )
}

pub fn get_category_by_slug(conn: &Connection, slug: &str) -> Result<Option<Category>> {
    query_one(
        conn,
        &format!("SELECT {} FROM categories WHERE slug = ?1", CATEGORY_COLS),
        &[&slug],
    )
}

pub fn slug_exists(conn: &Connection, slug: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM categories WHERE slug = ?1",
        params![slug],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn list_categories(conn: &Connection) -> Result<Vec<Category>> {
    query_all(
        conn,
        &format!("SELECT {} FROM categories ORDER BY name", CATEGORY_COLS),
        &[],
    )
}

pub fn list_categories_with_counts(conn: &Connection) -> Result<Vec<CategoryWithCount>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.name, c.description, c.slug, c.created_at, COUNT(i.id)
         FROM categories c LEFT JOIN images i ON i.category_id = c.id
         GROUP BY c.id ORDER BY c.name",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(CategoryWithCount {
                category: Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    slug: row.get(3)?,
                    created_at: row.get(4)?,
                },
                image_count: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Rename and/or redescribe a category. Renames carry a freshly derived
/// slug so album URLs follow the name, as the original slug field did.
pub fn update_category(
    conn: &Connection,
    id: i64,
    name_and_slug: Option<(&str, &str)>,
    description: Option<&str>,
) -> Result<bool> {
    let mut affected = 0;
    if let Some((name, slug)) = name_and_slug {
        affected += conn.execute(
            "UPDATE categories SET name = ?1, slug = ?2 WHERE id = ?3",
            params![name, slug, id],
        )?;
    }
    if let Some(desc) = description {
        affected += conn.execute(
            "UPDATE categories SET description = ?1 WHERE id = ?2",
            params![desc, id],
        )?;
    }
    Ok(affected > 0)
}

/// Delete a category; image rows cascade. Returns false when the id is
/// unknown. Callers are responsible for the image files on disk.
pub fn delete_category(conn: &Connection, id: i64) -> Result<bool> {
    let affected = conn.execute("DELETE FROM categories WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

// ============ Images ============

pub fn create_image(
    conn: &Connection,
    category_id: i64,
    filename: &str,
    caption: Option<&str>,
) -> Result<Image> {
    let now = now();
    conn.execute(
        "INSERT INTO images (category_id, filename, caption, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![category_id, filename, caption, now],
    )?;

    Ok(Image {
        id: conn.last_insert_rowid(),
        category_id,
        filename: filename.to_string(),
        caption: caption.map(String::from),
        created_at: now,
    })
}

pub fn get_image(conn: &Connection, id: i64) -> Result<Option<Image>> {
    query_one(
        conn,
        &format!("SELECT {} FROM images WHERE id = ?1", IMAGE_COLS),
        &[&id],
    )
}

/// Images for one category, in display order (by id, as the original
/// gallery ordered them).
pub fn list_images_for_category(conn: &Connection, category_id: i64) -> Result<Vec<Image>> {
    query_all(
        conn,
        &format!("SELECT {} FROM images WHERE category_id = ?1 ORDER BY id", IMAGE_COLS),
        &[&category_id],
    )
}

pub fn list_all_images(conn: &Connection) -> Result<Vec<Image>> {
    query_all(
        conn,
        &format!("SELECT {} FROM images ORDER BY id", IMAGE_COLS),
        &[],
    )
}

pub fn count_images(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0))?;
    Ok(count)
}

pub fn update_image_caption(conn: &Connection, id: i64, caption: Option<&str>) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE images SET caption = ?1 WHERE id = ?2",
        params![caption, id],
    )?;
    Ok(affected > 0)
}

pub fn update_image_filename(conn: &Connection, id: i64, filename: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE images SET filename = ?1 WHERE id = ?2",
        params![filename, id],
    )?;
    Ok(affected > 0)
}

pub fn delete_image(conn: &Connection, id: i64) -> Result<bool> {
    let affected = conn.execute("DELETE FROM images WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

// ============ Activity log ============

pub fn log_activity(conn: &Connection, log: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO activity_log (log, created_at) VALUES (?1, ?2)",
        params![log, now()],
    )?;
    Ok(())
}

pub fn list_activity(conn: &Connection) -> Result<Vec<ActivityEntry>> {
    query_all(
        conn,
        &format!("SELECT {} FROM activity_log ORDER BY id DESC", ACTIVITY_COLS),
        &[],
    )
}
