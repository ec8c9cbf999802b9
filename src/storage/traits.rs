use async_trait::async_trait;

use crate::{
    error::Result,
    models::{HistoryRecord, NewHistoryRecord},
};

/// Object storage for uploaded reference images and generated artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Writes an object under a caller-chosen key. Keys are never reused,
    /// so a write cannot clobber an existing artifact.
    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<()>;

    /// Public URL for an object, resolvable without credentials.
    fn public_url(&self, bucket: &str, key: &str) -> String;

    async fn health_check(&self) -> Result<bool>;
}

/// Persisted per-user generation history. Rows are insert-only.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn insert(&self, record: NewHistoryRecord) -> Result<HistoryRecord>;

    /// Records for one user, newest first.
    async fn list_for_user(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<HistoryRecord>>;

    async fn health_check(&self) -> Result<bool>;
}
