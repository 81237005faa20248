mod from_row;
mod schema;
pub mod queries;

pub use schema::init_db;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::NotifySettings;
use crate::email::Mailer;
use crate::storage::MediaStore;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// Gallery file storage
    pub media: MediaStore,
    /// Outbound email service
    pub mailer: Mailer,
    /// Recipients and subject prefix for notifications
    pub notify: NotifySettings,
    /// Receiver email stamped on orders created without one
    pub default_paypal_email: String,
    /// Base URL for links (e.g. https://studio.example.com)
    pub base_url: String,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    // Foreign keys are per-connection in SQLite; the image -> category
    // cascade depends on them.
    let manager = SqliteConnectionManager::file(database_path)
        .with_init(|conn| conn.pragma_update(None, "foreign_keys", "ON"));
    Pool::builder().max_size(10).build(manager)
}
