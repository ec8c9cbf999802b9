use async_trait::async_trait;
use reqwest::Client;

use crate::{
    config::ObjectStoreConfig,
    error::{Result, StudioError},
    storage::traits::ArtifactStore,
};

/// Object store backend speaking the storage platform's REST API.
/// Objects land under `/storage/v1/object/{bucket}/{key}` and are served
/// publicly from `/storage/v1/object/public/{bucket}/{key}`.
pub struct RestObjectStore {
    client: Client,
    base_url: String,
    service_key: String,
}

impl RestObjectStore {
    pub fn new(config: ObjectStoreConfig) -> Result<Self> {
        let base_url = config
            .url
            .ok_or_else(|| StudioError::ConfigError("Object store URL is required".into()))?;

        let service_key = config.service_key.ok_or_else(|| {
            StudioError::ConfigError("Object store service key is required".into())
        })?;

        Ok(Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
        })
    }

    fn build_headers(&self, content_type: &str) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", self.service_key).parse().unwrap(),
        );
        headers.insert("apikey", self.service_key.parse().unwrap());
        headers.insert(reqwest::header::CONTENT_TYPE, content_type.parse().unwrap());
        headers
    }
}

#[async_trait]
impl ArtifactStore for RestObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        let response = self
            .client
            .post(&format!(
                "{}/storage/v1/object/{}/{}",
                self.base_url, bucket, key
            ))
            .headers(self.build_headers(content_type))
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(|e| StudioError::StorageError(format!("Object upload failed: {}", e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            Err(StudioError::StorageError(format!(
                "Object upload rejected: {} - {}",
                status, error_text
            )))
        }
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, bucket, key
        )
    }

    async fn health_check(&self) -> Result<bool> {
        // Reachability probe; a 4xx still proves the service answers.
        let response = self
            .client
            .get(&format!("{}/storage/v1/object/public/", self.base_url))
            .send()
            .await
            .map_err(|e| StudioError::StorageError(format!("Object store unreachable: {}", e)))?;

        Ok(response.status().as_u16() < 500)
    }
}
