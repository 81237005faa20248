use serde::{Deserialize, Serialize};

/// A stored gallery picture. `filename` names the file under the media
/// root; the record and the file are created and deleted together.
#[derive(Debug, Clone, Serialize)]
pub struct Image {
    pub id: i64,
    pub category_id: i64,
    pub filename: String,
    pub caption: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateImage {
    pub caption: Option<String>,
}

/// Query parameters for an image upload (the body is the raw file bytes).
#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub filename: String,
    pub caption: Option<String>,
}
