use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    error::{Result, StudioError},
    models::{
        parse_data_url, ErrorBody, GenerateImageRequest, GenerateImageResponse, GenerationPhase,
        HistoryRecord, NewHistoryRecord, SourceImage,
    },
    storage::{ArtifactStore, HistoryStore, DEFAULT_SOURCE_BUCKET},
};

/// Authenticated user identity, passed explicitly per call rather than
/// read from ambient state.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub id: String,
}

impl UserContext {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Seam over the deployed generation proxy.
#[async_trait]
pub trait GenerationInvoker: Send + Sync {
    async fn generate(&self, request: &GenerateImageRequest) -> Result<GenerateImageResponse>;
}

/// Posts generation requests to a proxy endpoint and maps error bodies
/// back into the crate's error taxonomy by status.
pub struct HttpInvoker {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpInvoker {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl GenerationInvoker for HttpInvoker {
    async fn generate(&self, request: &GenerateImageRequest) -> Result<GenerateImageResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| StudioError::RequestError(format!("Proxy request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| StudioError::ResponseError(format!("Invalid proxy response: {}", e)));
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.error)
            .unwrap_or_else(|_| format!("HTTP {}", status));

        Err(match status.as_u16() {
            400 => StudioError::InvalidRequest(message),
            429 => StudioError::RateLimited(message),
            402 => StudioError::QuotaExceeded(message),
            code => StudioError::UpstreamError {
                status: code,
                message,
            },
        })
    }
}

/// Result of one orchestrated generation.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub image_url: String,
    pub source_image_url: Option<String>,
}

/// Image bytes ready for a local save.
#[derive(Debug, Clone)]
pub struct DownloadedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Drives the upload-then-generate-then-record sequence around the
/// proxy, the way the studio UI does. Collaborators are injected at
/// construction; user identity is passed per call.
///
/// Attempts are not deduplicated: overlapping `generate` calls are
/// allowed and may complete out of order. Callers that need
/// serialization hold their own lock.
pub struct StudioClient {
    invoker: Arc<dyn GenerationInvoker>,
    artifacts: Option<Arc<dyn ArtifactStore>>,
    history: Option<Arc<dyn HistoryStore>>,
    source_bucket: String,
    downloader: reqwest::Client,
    phase: Mutex<GenerationPhase>,
}

impl StudioClient {
    pub fn new(invoker: Arc<dyn GenerationInvoker>) -> Self {
        Self {
            invoker,
            artifacts: None,
            history: None,
            source_bucket: DEFAULT_SOURCE_BUCKET.to_string(),
            downloader: reqwest::Client::new(),
            phase: Mutex::new(GenerationPhase::Idle),
        }
    }

    /// Convenience constructor for a deployed proxy endpoint.
    pub fn for_endpoint(endpoint: impl Into<String>) -> Self {
        Self::new(Arc::new(HttpInvoker::new(endpoint)))
    }

    pub fn with_artifact_store(
        mut self,
        store: Arc<dyn ArtifactStore>,
        source_bucket: impl Into<String>,
    ) -> Self {
        self.artifacts = Some(store);
        self.source_bucket = source_bucket.into();
        self
    }

    pub fn with_history_store(mut self, store: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(store);
        self
    }

    /// Phase of the most recently advanced attempt.
    pub fn phase(&self) -> GenerationPhase {
        *self.phase.lock().unwrap()
    }

    fn set_phase(&self, phase: GenerationPhase) {
        *self.phase.lock().unwrap() = phase;
    }

    /// One full generation attempt:
    /// local validation, optional reference upload, one proxy call, and a
    /// best-effort history record. Upload failure aborts before the proxy
    /// is invoked; history failure never demotes a successful generation.
    pub async fn generate(
        &self,
        user: Option<&UserContext>,
        prompt: &str,
        source_image: Option<SourceImage>,
    ) -> Result<GenerationOutcome> {
        if prompt.trim().is_empty() {
            return Err(StudioError::InvalidRequest("Prompt is required".into()));
        }

        let user = user.ok_or_else(|| {
            StudioError::AuthRequired("Please log in to generate images".into())
        })?;

        let outcome = self.run_attempt(user, prompt, source_image).await;

        match &outcome {
            Ok(_) => self.set_phase(GenerationPhase::Succeeded),
            Err(_) => self.set_phase(GenerationPhase::Failed),
        }

        outcome
    }

    async fn run_attempt(
        &self,
        user: &UserContext,
        prompt: &str,
        source_image: Option<SourceImage>,
    ) -> Result<GenerationOutcome> {
        let source_image_url = match source_image {
            Some(image) => {
                self.set_phase(GenerationPhase::Uploading);
                Some(self.upload_source_image(user, &image).await?)
            }
            None => None,
        };

        self.set_phase(GenerationPhase::Generating);

        let mut request = GenerateImageRequest::new(prompt);
        if let Some(url) = &source_image_url {
            request = request.with_source_image_url(url);
        }

        let response = self.invoker.generate(&request).await?;

        if let Some(history) = &self.history {
            let mut record = NewHistoryRecord::new(&user.id, prompt, &response.image_url);
            if let Some(url) = &source_image_url {
                record = record.with_source_image_url(url);
            }

            if let Err(error) = history.insert(record).await {
                log::error!("Failed to save to history: {}", error);
            }
        }

        Ok(GenerationOutcome {
            image_url: response.image_url,
            source_image_url,
        })
    }

    async fn upload_source_image(
        &self,
        user: &UserContext,
        image: &SourceImage,
    ) -> Result<String> {
        let artifacts = self.artifacts.as_ref().ok_or_else(|| {
            StudioError::StorageError("No object storage configured for reference uploads".into())
        })?;

        // Keys are namespaced by user and stamped, so uploads never collide.
        let key = format!(
            "{}/{}.{}",
            user.id,
            Utc::now().timestamp_millis(),
            image.extension()
        );

        artifacts
            .put(
                &self.source_bucket,
                &key,
                image.bytes.clone(),
                &image.content_type,
            )
            .await?;

        Ok(artifacts.public_url(&self.source_bucket, &key))
    }

    /// The user's past generations, newest first.
    pub async fn history(
        &self,
        user: Option<&UserContext>,
        limit: Option<usize>,
    ) -> Result<Vec<HistoryRecord>> {
        let user = user.ok_or_else(|| {
            StudioError::AuthRequired("Please log in to view history".into())
        })?;

        let history = self
            .history
            .as_ref()
            .ok_or_else(|| StudioError::HistoryError("No history store configured".into()))?;

        history.list_for_user(&user.id, limit).await
    }

    /// Fetches the displayed image for a local save. Inline payloads
    /// decode without a network round trip.
    pub async fn download(&self, image_url: &str) -> Result<DownloadedImage> {
        let bytes = if image_url.starts_with("data:") {
            parse_data_url(image_url)?.1
        } else {
            let response = self
                .downloader
                .get(image_url)
                .send()
                .await
                .map_err(|e| StudioError::RequestError(format!("Download failed: {}", e)))?;

            if !response.status().is_success() {
                return Err(StudioError::RequestError(format!(
                    "Download failed: {}",
                    response.status()
                )));
            }

            response
                .bytes()
                .await
                .map_err(|e| StudioError::RequestError(format!("Download failed: {}", e)))?
                .to_vec()
        };

        Ok(DownloadedImage {
            file_name: format!("genstudio-{}.png", Utc::now().timestamp_millis()),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct MockInvoker {
        image_url: Option<String>,
        calls: AtomicUsize,
        requests: Mutex<Vec<GenerateImageRequest>>,
    }

    impl MockInvoker {
        fn succeeding(image_url: &str) -> Arc<Self> {
            Arc::new(Self {
                image_url: Some(image_url.to_string()),
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                image_url: None,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerationInvoker for MockInvoker {
        async fn generate(&self, request: &GenerateImageRequest) -> Result<GenerateImageResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());

            match &self.image_url {
                Some(url) => Ok(GenerateImageResponse {
                    image_url: url.clone(),
                }),
                None => Err(StudioError::RateLimited(
                    "Rate limit exceeded. Please try again later.".into(),
                )),
            }
        }
    }

    struct MockArtifactStore {
        fail_puts: bool,
        puts: Mutex<Vec<(String, String)>>,
    }

    impl MockArtifactStore {
        fn new(fail_puts: bool) -> Arc<Self> {
            Arc::new(Self {
                fail_puts,
                puts: Mutex::new(Vec::new()),
            })
        }

        fn put_count(&self) -> usize {
            self.puts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ArtifactStore for MockArtifactStore {
        async fn put(
            &self,
            bucket: &str,
            key: &str,
            _bytes: Vec<u8>,
            _content_type: &str,
        ) -> Result<()> {
            if self.fail_puts {
                return Err(StudioError::StorageError("upload refused".into()));
            }
            self.puts
                .lock()
                .unwrap()
                .push((bucket.to_string(), key.to_string()));
            Ok(())
        }

        fn public_url(&self, bucket: &str, key: &str) -> String {
            format!("https://cdn.example.com/{}/{}", bucket, key)
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
    }

    struct MockHistoryStore {
        fail_inserts: bool,
        inserts: Mutex<Vec<NewHistoryRecord>>,
    }

    impl MockHistoryStore {
        fn new(fail_inserts: bool) -> Arc<Self> {
            Arc::new(Self {
                fail_inserts,
                inserts: Mutex::new(Vec::new()),
            })
        }

        fn insert_count(&self) -> usize {
            self.inserts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HistoryStore for MockHistoryStore {
        async fn insert(&self, record: NewHistoryRecord) -> Result<HistoryRecord> {
            if self.fail_inserts {
                return Err(StudioError::HistoryError("insert refused".into()));
            }
            let stored = HistoryRecord {
                id: Uuid::new_v4().to_string(),
                user_id: record.user_id.clone(),
                prompt: record.prompt.clone(),
                image_url: record.image_url.clone(),
                source_image_url: record.source_image_url.clone(),
                created_at: Utc::now(),
            };
            self.inserts.lock().unwrap().push(record);
            Ok(stored)
        }

        async fn list_for_user(
            &self,
            user_id: &str,
            _limit: Option<usize>,
        ) -> Result<Vec<HistoryRecord>> {
            Ok(self
                .inserts
                .lock()
                .unwrap()
                .iter()
                .rev()
                .filter(|record| record.user_id == user_id)
                .map(|record| HistoryRecord {
                    id: Uuid::new_v4().to_string(),
                    user_id: record.user_id.clone(),
                    prompt: record.prompt.clone(),
                    image_url: record.image_url.clone(),
                    source_image_url: record.source_image_url.clone(),
                    created_at: Utc::now(),
                })
                .collect())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
    }

    fn user() -> UserContext {
        UserContext::new("user-1")
    }

    fn reference_image() -> SourceImage {
        SourceImage::new("ref.jpg", "image/jpeg", vec![1, 2, 3])
    }

    #[tokio::test]
    async fn test_empty_prompt_fails_locally_without_any_calls() {
        let invoker = MockInvoker::succeeding("https://cdn.example.com/out.png");
        let artifacts = MockArtifactStore::new(false);
        let client = StudioClient::new(invoker.clone())
            .with_artifact_store(artifacts.clone(), "source-images");

        let result = client
            .generate(Some(&user()), "  \n ", Some(reference_image()))
            .await;

        assert!(matches!(result, Err(StudioError::InvalidRequest(_))));
        assert_eq!(invoker.calls(), 0);
        assert_eq!(artifacts.put_count(), 0);
        assert_eq!(client.phase(), GenerationPhase::Idle);
    }

    #[tokio::test]
    async fn test_missing_user_fails_locally() {
        let invoker = MockInvoker::succeeding("https://cdn.example.com/out.png");
        let client = StudioClient::new(invoker.clone());

        let result = client.generate(None, "a red circle", None).await;

        assert!(matches!(result, Err(StudioError::AuthRequired(_))));
        assert_eq!(invoker.calls(), 0);
    }

    #[tokio::test]
    async fn test_generation_without_reference_writes_one_history_record() {
        let invoker = MockInvoker::succeeding("https://cdn.example.com/out.png");
        let history = MockHistoryStore::new(false);
        let client = StudioClient::new(invoker.clone()).with_history_store(history.clone());

        let outcome = client
            .generate(Some(&user()), "a red circle", None)
            .await
            .unwrap();

        assert_eq!(outcome.image_url, "https://cdn.example.com/out.png");
        assert!(outcome.source_image_url.is_none());
        assert_eq!(invoker.calls(), 1);
        assert_eq!(history.insert_count(), 1);
        assert_eq!(client.phase(), GenerationPhase::Succeeded);

        let record = &history.inserts.lock().unwrap()[0];
        assert_eq!(record.user_id, "user-1");
        assert_eq!(record.image_url, outcome.image_url);
        assert!(record.source_image_url.is_none());
    }

    #[tokio::test]
    async fn test_reference_image_uploads_first_under_user_namespace() {
        let invoker = MockInvoker::succeeding("https://cdn.example.com/out.png");
        let artifacts = MockArtifactStore::new(false);
        let history = MockHistoryStore::new(false);
        let client = StudioClient::new(invoker.clone())
            .with_artifact_store(artifacts.clone(), "source-images")
            .with_history_store(history.clone());

        let outcome = client
            .generate(Some(&user()), "enhance this", Some(reference_image()))
            .await
            .unwrap();

        let (bucket, key) = artifacts.puts.lock().unwrap()[0].clone();
        assert_eq!(bucket, "source-images");
        assert!(key.starts_with("user-1/"));
        assert!(key.ends_with(".jpg"));

        let expected_url = format!("https://cdn.example.com/source-images/{}", key);
        assert_eq!(outcome.source_image_url.as_deref(), Some(expected_url.as_str()));

        // The proxy saw the resolved public URL, and history recorded it.
        let request = invoker.requests.lock().unwrap()[0].clone();
        assert_eq!(request.source_image_url.as_deref(), Some(expected_url.as_str()));
        assert_eq!(
            history.inserts.lock().unwrap()[0].source_image_url.as_deref(),
            Some(expected_url.as_str())
        );
    }

    #[tokio::test]
    async fn test_upload_failure_aborts_before_proxy_call() {
        let invoker = MockInvoker::succeeding("https://cdn.example.com/out.png");
        let artifacts = MockArtifactStore::new(true);
        let history = MockHistoryStore::new(false);
        let client = StudioClient::new(invoker.clone())
            .with_artifact_store(artifacts, "source-images")
            .with_history_store(history.clone());

        let result = client
            .generate(Some(&user()), "enhance this", Some(reference_image()))
            .await;

        assert!(matches!(result, Err(StudioError::StorageError(_))));
        assert_eq!(invoker.calls(), 0);
        assert_eq!(history.insert_count(), 0);
        assert_eq!(client.phase(), GenerationPhase::Failed);
    }

    #[tokio::test]
    async fn test_proxy_failure_writes_no_history() {
        let invoker = MockInvoker::failing();
        let history = MockHistoryStore::new(false);
        let client = StudioClient::new(invoker.clone()).with_history_store(history.clone());

        let result = client.generate(Some(&user()), "a red circle", None).await;

        assert!(matches!(result, Err(StudioError::RateLimited(_))));
        assert_eq!(invoker.calls(), 1);
        assert_eq!(history.insert_count(), 0);
        assert_eq!(client.phase(), GenerationPhase::Failed);
    }

    #[tokio::test]
    async fn test_history_failure_does_not_demote_success() {
        let invoker = MockInvoker::succeeding("https://cdn.example.com/out.png");
        let history = MockHistoryStore::new(true);
        let client = StudioClient::new(invoker).with_history_store(history);

        let outcome = client.generate(Some(&user()), "a red circle", None).await;

        assert!(outcome.is_ok());
        assert_eq!(client.phase(), GenerationPhase::Succeeded);
    }

    #[tokio::test]
    async fn test_history_listing_is_scoped_to_user() {
        let history = MockHistoryStore::new(false);
        let client = StudioClient::new(MockInvoker::succeeding("https://cdn.example.com/out.png"))
            .with_history_store(history.clone());

        client
            .generate(Some(&user()), "first", None)
            .await
            .unwrap();
        client
            .generate(Some(&UserContext::new("user-2")), "second", None)
            .await
            .unwrap();

        let records = client.history(Some(&user()), None).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].prompt, "first");

        assert!(client.history(None, None).await.is_err());
    }

    #[tokio::test]
    async fn test_download_decodes_inline_payload_locally() {
        let client = StudioClient::new(MockInvoker::succeeding("unused"));

        let image = client
            .download("data:image/png;base64,aGVsbG8=")
            .await
            .unwrap();

        assert_eq!(image.bytes, b"hello");
        assert!(image.file_name.starts_with("genstudio-"));
        assert!(image.file_name.ends_with(".png"));
    }
}
