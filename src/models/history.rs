use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted generation record. Created once after a successful
/// generation, never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: String,
    pub user_id: String,
    pub prompt: String,
    pub image_url: String,
    pub source_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert shape for a history row. `id` and `created_at` are assigned by
/// the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHistoryRecord {
    pub user_id: String,
    pub prompt: String,
    pub image_url: String,
    pub source_image_url: Option<String>,
}

impl NewHistoryRecord {
    pub fn new(
        user_id: impl Into<String>,
        prompt: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            prompt: prompt.into(),
            image_url: image_url.into(),
            source_image_url: None,
        }
    }

    pub fn with_source_image_url(mut self, url: impl Into<String>) -> Self {
        self.source_image_url = Some(url.into());
        self
    }
}
