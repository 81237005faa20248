use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.execute_batch(
        r#"
        -- Site users. Staff users carry a hashed API key for the admin surface.
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            is_staff INTEGER NOT NULL DEFAULT 0,
            api_key_hash TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_users_api_key ON users(api_key_hash) WHERE api_key_hash IS NOT NULL;

        -- Orders awaiting or having received payment. paid is flipped only by
        -- reconciliation (Completed -> 1, Refunded -> 0).
        CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            paypal_email TEXT NOT NULL,
            paid INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_orders_user ON orders(user_id);

        -- Invoice <-> gateway transaction bookkeeping. At most one row per
        -- order in steady state; historical races can leave several.
        CREATE TABLE IF NOT EXISTS order_transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            invoice_id TEXT UNIQUE,
            order_id INTEGER REFERENCES orders(id) ON DELETE SET NULL,
            txn_id TEXT UNIQUE,
            voucher_code TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_order_transactions_order ON order_transactions(order_id);

        -- Inbound gateway notifications, stored as received. flag/flag_info
        -- carry the upstream verifier's verdict.
        CREATE TABLE IF NOT EXISTS payment_notifications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            txn_id TEXT NOT NULL,
            invoice TEXT,
            custom TEXT,
            receiver_email TEXT,
            payment_status TEXT NOT NULL,
            flag INTEGER NOT NULL DEFAULT 0,
            flag_info TEXT NOT NULL DEFAULT '',
            payment_date TEXT,
            created_at INTEGER NOT NULL
        );

        -- Discount codes and the users who redeemed them through a payment
        CREATE TABLE IF NOT EXISTS vouchers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE
        );
        CREATE TABLE IF NOT EXISTS voucher_users (
            voucher_id INTEGER NOT NULL REFERENCES vouchers(id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            UNIQUE(voucher_id, user_id)
        );

        -- Gallery albums
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            slug TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL
        );

        -- Gallery pictures; rows cascade with their category, files are
        -- removed by the handlers
        CREATE TABLE IF NOT EXISTS images (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
            filename TEXT NOT NULL,
            caption TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_images_category ON images(category_id);

        -- Studio activity log (payment events, staff gallery changes)
        CREATE TABLE IF NOT EXISTS activity_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            log TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        "#,
    )
}
