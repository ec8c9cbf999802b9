use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    config::GatewayConfig,
    error::{Result, StudioError},
};

pub const DEFAULT_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash-image";

const REFERENCE_IMAGE_PREFIX: &str = "Based on the provided reference image, ";

/// Seam between the proxy and the multimodal AI service. A successful
/// call yields the generated image as an inline data URL.
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    async fn generate(&self, prompt: &str, source_image_url: Option<&str>) -> Result<String>;
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint that
/// supports image output modalities.
#[derive(Clone)]
pub struct GatewayClient {
    client: reqwest::Client,
    api_key: String,
    url: String,
    model: String,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .ok_or_else(|| StudioError::ConfigError("Gateway API key is required".into()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            url: config.url.unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string()),
            model: config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, prompt: &str, source_image_url: Option<&str>) -> ChatRequest {
        let mut content = Vec::new();

        let full_prompt = match source_image_url {
            Some(_) => format!("{}{}", REFERENCE_IMAGE_PREFIX, prompt),
            None => prompt.to_string(),
        };

        content.push(ContentPart::Text { text: full_prompt });

        if let Some(url) = source_image_url {
            content.push(ContentPart::ImageUrl {
                image_url: ImageUrlRef {
                    url: url.to_string(),
                },
            });
        }

        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content,
            }],
            modalities: vec!["image".to_string(), "text".to_string()],
        }
    }
}

#[async_trait]
impl GenerationGateway for GatewayClient {
    async fn generate(&self, prompt: &str, source_image_url: Option<&str>) -> Result<String> {
        log::info!("Generating image with prompt: {}", prompt);
        log::info!("Source image URL: {}", source_image_url.unwrap_or("none"));

        let _timer = crate::logger::timer("gateway generate");
        let payload = self.build_request(prompt, source_image_url);

        // Single attempt, no retry. Capacity conditions propagate to the
        // caller verbatim.
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| StudioError::RequestError(format!("AI Gateway request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("AI Gateway error: {} {}", status, error_text);

            return Err(match status.as_u16() {
                429 => StudioError::RateLimited(
                    "Rate limit exceeded. Please try again later.".into(),
                ),
                402 => StudioError::QuotaExceeded("Usage limit reached. Please add credits.".into()),
                code => StudioError::UpstreamError {
                    status: code,
                    message: error_text,
                },
            });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| StudioError::ResponseError(format!("Invalid gateway response: {}", e)))?;

        log::info!("AI Gateway response received");

        chat_response
            .into_first_image_url()
            .ok_or(StudioError::NoImageProduced)
    }
}

// Wire types for the chat-completions call.

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    modalities: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrlRef },
}

#[derive(Debug, Serialize, Deserialize)]
struct ImageUrlRef {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    images: Vec<ResponseImage>,
}

#[derive(Debug, Deserialize)]
struct ResponseImage {
    #[serde(default)]
    image_url: Option<ImageUrlRef>,
}

impl ChatResponse {
    fn into_first_image_url(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.images.into_iter().next())
            .and_then(|image| image.image_url)
            .map(|reference| reference.url)
    }
}
