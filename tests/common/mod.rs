//! Test utilities and fixtures for darkroom integration tests

#![allow(dead_code)]

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

pub use darkroom::config::NotifySettings;
pub use darkroom::db::{init_db, queries, AppState};
pub use darkroom::email::Mailer;
pub use darkroom::models::*;
pub use darkroom::storage::MediaStore;

/// Receiver account used across payment fixtures.
pub const TEST_RECEIVER_EMAIL: &str = "dummy-email@hotmail.com";

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Notification recipients used across tests.
pub fn test_notify_settings() -> NotifySettings {
    NotifySettings {
        from_email: "noreply@darkroom.local".to_string(),
        studio_email: "studio@darkroom.local".to_string(),
        support_email: "support@darkroom.local".to_string(),
        subject_prefix: "[darkroom]".to_string(),
        send_all_studio_emails: true,
    }
}

pub fn create_test_user(conn: &Connection, username: &str, is_staff: bool) -> User {
    let input = CreateUser {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        is_staff,
    };
    queries::create_user(conn, &input).expect("Failed to create test user")
}

pub fn create_test_order(conn: &Connection, user_id: i64, paypal_email: &str) -> Order {
    let input = CreateOrder {
        user_id,
        paypal_email: Some(paypal_email.to_string()),
    };
    queries::create_order(conn, &input, TEST_RECEIVER_EMAIL)
        .expect("Failed to create test order")
}

/// Baseline IPN form fields, mirroring what PayPal actually posts. Tests
/// override `custom`, `invoice`, `payment_status` etc. per scenario.
pub fn ipn_params() -> CreateNotification {
    CreateNotification {
        txn_id: "51403485VH153354B".to_string(),
        invoice: Some("order-inv#001".to_string()),
        custom: Some("1".to_string()),
        receiver_email: Some(TEST_RECEIVER_EMAIL.to_string()),
        payment_status: "Completed".to_string(),
        flag: false,
        flag_info: String::new(),
        payment_date: Some("23:04:06 Feb 02, 2009 PST".to_string()),
    }
}

/// Persist a notification row and return it, the way the webhook handler
/// does before reconciliation runs.
pub fn store_ipn(conn: &Connection, input: &CreateNotification) -> PaymentNotification {
    queries::create_notification(conn, input).expect("Failed to store test notification")
}

/// AppState over a pooled database and throwaway media directory.
///
/// The pool is capped at one connection: each :memory: connection is its
/// own database, so everything must share the single pooled handle.
pub fn create_test_app_state() -> AppState {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }

    let media_root = std::env::temp_dir().join(format!(
        "darkroom-test-{}",
        uuid::Uuid::new_v4().simple()
    ));
    let media = MediaStore::new(&media_root).expect("Failed to create test media root");

    AppState {
        db: pool,
        media,
        mailer: Mailer::disabled("noreply@darkroom.local".to_string()),
        notify: test_notify_settings(),
        default_paypal_email: TEST_RECEIVER_EMAIL.to_string(),
        base_url: "http://localhost:3000".to_string(),
    }
}
