use async_trait::async_trait;
use reqwest::Client;

use crate::{
    config::HistoryStoreConfig,
    error::{Result, StudioError},
    models::{HistoryRecord, NewHistoryRecord},
    storage::traits::HistoryStore,
};

pub const DEFAULT_HISTORY_TABLE: &str = "generated_images";

/// History backend speaking the platform's REST row API
/// (`/rest/v1/{table}`). Inserts ask for the stored representation back
/// so callers get the assigned id and timestamp.
pub struct RestHistoryStore {
    client: Client,
    base_url: String,
    service_key: String,
    table: String,
}

impl RestHistoryStore {
    pub fn new(config: HistoryStoreConfig) -> Result<Self> {
        let base_url = config
            .url
            .ok_or_else(|| StudioError::ConfigError("History store URL is required".into()))?;

        let service_key = config.service_key.ok_or_else(|| {
            StudioError::ConfigError("History store service key is required".into())
        })?;

        Ok(Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
            table: config
                .table
                .unwrap_or_else(|| DEFAULT_HISTORY_TABLE.to_string()),
        })
    }

    fn build_headers(&self) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", self.service_key).parse().unwrap(),
        );
        headers.insert("apikey", self.service_key.parse().unwrap());
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            "application/json".parse().unwrap(),
        );
        headers
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }
}

#[async_trait]
impl HistoryStore for RestHistoryStore {
    async fn insert(&self, record: NewHistoryRecord) -> Result<HistoryRecord> {
        let response = self
            .client
            .post(&self.table_url())
            .headers(self.build_headers())
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await
            .map_err(|e| StudioError::HistoryError(format!("History insert failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(StudioError::HistoryError(format!(
                "History insert rejected: {} - {}",
                status, error_text
            )));
        }

        // The row API answers an insert with an array of stored rows.
        let mut rows: Vec<HistoryRecord> = response
            .json()
            .await
            .map_err(|e| StudioError::HistoryError(format!("Invalid history response: {}", e)))?;

        if rows.is_empty() {
            return Err(StudioError::HistoryError(
                "History insert returned no row".into(),
            ));
        }

        Ok(rows.remove(0))
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<HistoryRecord>> {
        let user_filter = format!("eq.{}", user_id);
        let mut request = self
            .client
            .get(&self.table_url())
            .headers(self.build_headers())
            .query(&[
                ("select", "*"),
                ("user_id", user_filter.as_str()),
                ("order", "created_at.desc"),
            ]);

        if let Some(limit) = limit {
            request = request.query(&[("limit", limit.to_string())]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StudioError::HistoryError(format!("History query failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(StudioError::HistoryError(format!(
                "History query rejected: {} - {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| StudioError::HistoryError(format!("Invalid history response: {}", e)))
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(&self.table_url())
            .headers(self.build_headers())
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| StudioError::HistoryError(format!("History store unreachable: {}", e)))?;

        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_credentials() {
        assert!(RestHistoryStore::new(HistoryStoreConfig::new()).is_err());
    }

    #[test]
    fn test_table_defaults() {
        let store = RestHistoryStore::new(
            HistoryStoreConfig::new().with_credentials("https://project.example.co/", "key"),
        )
        .unwrap();
        assert_eq!(
            store.table_url(),
            "https://project.example.co/rest/v1/generated_images"
        );

        let custom = RestHistoryStore::new(
            HistoryStoreConfig::new()
                .with_credentials("https://project.example.co", "key")
                .with_table("renders"),
        )
        .unwrap();
        assert_eq!(custom.table_url(), "https://project.example.co/rest/v1/renders");
    }
}
