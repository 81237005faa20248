use serde::Serialize;

/// One line of the studio activity log: payment events and staff gallery
/// changes, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub id: i64,
    pub log: String,
    pub created_at: i64,
}
