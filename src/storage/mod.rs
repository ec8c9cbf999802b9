pub mod history;
pub mod objects;
pub mod traits;

use std::sync::Arc;

use crate::{config::Config, error::Result};

pub use history::{RestHistoryStore, DEFAULT_HISTORY_TABLE};
pub use objects::RestObjectStore;
pub use traits::{ArtifactStore, HistoryStore};

pub const DEFAULT_GENERATED_BUCKET: &str = "generated-images";
pub const DEFAULT_SOURCE_BUCKET: &str = "source-images";

/// Assembles the storage backends a deployment has credentials for.
/// Either backend may be absent: without an artifact store the proxy
/// falls back to inline-encoded images, and without a history store the
/// orchestrator skips record keeping. Neither absence is an error.
pub struct StorageManager {
    artifacts: Option<Arc<dyn ArtifactStore>>,
    history: Option<Arc<dyn HistoryStore>>,
    generated_bucket: String,
    source_bucket: String,
}

impl StorageManager {
    pub fn from_config(config: &Config) -> Result<Self> {
        let objects_config = config.objects.clone().unwrap_or_default();

        let artifacts: Option<Arc<dyn ArtifactStore>> = if objects_config.is_configured() {
            Some(Arc::new(RestObjectStore::new(objects_config.clone())?))
        } else {
            log::warn!("Object storage not configured, images will be returned inline");
            None
        };

        let history_config = config.history.clone().unwrap_or_default();

        let history: Option<Arc<dyn HistoryStore>> = if history_config.is_configured() {
            Some(Arc::new(RestHistoryStore::new(history_config)?))
        } else {
            log::warn!("History store not configured, generations will not be recorded");
            None
        };

        Ok(Self {
            artifacts,
            history,
            generated_bucket: objects_config
                .generated_bucket
                .unwrap_or_else(|| DEFAULT_GENERATED_BUCKET.to_string()),
            source_bucket: objects_config
                .source_bucket
                .unwrap_or_else(|| DEFAULT_SOURCE_BUCKET.to_string()),
        })
    }

    pub fn artifacts(&self) -> Option<&Arc<dyn ArtifactStore>> {
        self.artifacts.as_ref()
    }

    pub fn history(&self) -> Option<&Arc<dyn HistoryStore>> {
        self.history.as_ref()
    }

    pub fn generated_bucket(&self) -> &str {
        &self.generated_bucket
    }

    pub fn source_bucket(&self) -> &str {
        &self.source_bucket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, HistoryStoreConfig, ObjectStoreConfig};

    #[test]
    fn test_unconfigured_backends_are_absent_not_errors() {
        let manager = StorageManager::from_config(&Config::new()).unwrap();
        assert!(manager.artifacts().is_none());
        assert!(manager.history().is_none());
        assert_eq!(manager.generated_bucket(), DEFAULT_GENERATED_BUCKET);
        assert_eq!(manager.source_bucket(), DEFAULT_SOURCE_BUCKET);
    }

    #[test]
    fn test_configured_backends_are_built() {
        let config = Config::new()
            .with_objects(
                ObjectStoreConfig::new()
                    .with_credentials("https://project.example.co", "service-key")
                    .with_buckets("outputs", "references"),
            )
            .with_history(
                HistoryStoreConfig::new()
                    .with_credentials("https://project.example.co", "service-key"),
            );

        let manager = StorageManager::from_config(&config).unwrap();
        assert!(manager.artifacts().is_some());
        assert!(manager.history().is_some());
        assert_eq!(manager.generated_bucket(), "outputs");
        assert_eq!(manager.source_bucket(), "references");
    }
}
