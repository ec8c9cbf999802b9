use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StudioError};

/// Request body accepted by the generation proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateImageRequest {
    /// Tolerates an absent field so a missing prompt surfaces as
    /// `InvalidRequest`, not as a deserialization failure.
    #[serde(default)]
    pub prompt: String,
    #[serde(
        rename = "sourceImageUrl",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source_image_url: Option<String>,
}

impl GenerateImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            source_image_url: None,
        }
    }

    pub fn with_source_image_url(mut self, url: impl Into<String>) -> Self {
        self.source_image_url = Some(url.into());
        self
    }

    /// Rejects empty or whitespace-only prompts before any upstream call.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(StudioError::InvalidRequest("Prompt is required".into()));
        }
        Ok(())
    }
}

/// Success body returned by the generation proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateImageResponse {
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

/// Error body returned by the generation proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Result of a generation: a public URL to a stored artifact, or the
/// inline-encoded image itself when storage is unavailable. Exactly one
/// of the two forms, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutput {
    Stored(String),
    Inline(String),
}

impl ImageOutput {
    pub fn as_url(&self) -> &str {
        match self {
            ImageOutput::Stored(url) => url,
            ImageOutput::Inline(data_url) => data_url,
        }
    }

    pub fn into_url(self) -> String {
        match self {
            ImageOutput::Stored(url) => url,
            ImageOutput::Inline(data_url) => data_url,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, ImageOutput::Inline(_))
    }
}

/// A locally selected reference image handed to the orchestrator before
/// upload.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl SourceImage {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// File extension taken from the original name, `png` when absent.
    pub fn extension(&self) -> &str {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
            .unwrap_or("png")
    }
}

/// State of a single generation attempt as driven by the orchestrator.
/// `Uploading` and `Generating` are sequential, never concurrent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationPhase {
    Idle,
    Uploading,
    Generating,
    Succeeded,
    Failed,
}

/// Splits a `data:<mime>;base64,<payload>` URL into its mime type and
/// decoded bytes.
pub fn parse_data_url(data_url: &str) -> Result<(String, Vec<u8>)> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| StudioError::ResponseError("Not a data URL".into()))?;

    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| StudioError::ResponseError("Malformed data URL".into()))?;

    if !meta.ends_with(";base64") {
        return Err(StudioError::ResponseError(
            "Data URL is not base64-encoded".into(),
        ));
    }

    let mime = meta.trim_end_matches(";base64");
    let mime = if mime.is_empty() { "image/png" } else { mime };

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| StudioError::ResponseError(format!("Invalid base64 image data: {}", e)))?;

    Ok((mime.to_string(), bytes))
}
