use serde::{Deserialize, Serialize};

/// A gallery album. The slug is derived from the name and unique.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub slug: String,
    pub created_at: i64,
}

/// Category plus its image count, for the staff list view.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: Category,
    pub image_count: i64,
}

/// One entry in a batch category edit: create (no id), rename/redescribe
/// (id + fields), or delete (id + delete flag).
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryOp {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub delete: bool,
}

#[derive(Debug, Deserialize)]
pub struct CategoryBatch {
    pub categories: Vec<CategoryOp>,
}

/// What a batch edit changed, in the phrasing the studio is used to.
#[derive(Debug, Default, Serialize)]
pub struct CategoryBatchResult {
    pub messages: Vec<String>,
}
