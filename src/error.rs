use std::fmt;

#[derive(Debug)]
pub enum StudioError {
    ConfigError(String),
    InvalidRequest(String),
    AuthRequired(String),
    RateLimited(String),
    QuotaExceeded(String),
    UpstreamError { status: u16, message: String },
    NoImageProduced,
    StorageError(String),
    HistoryError(String),
    RequestError(String),
    ResponseError(String),
}

impl fmt::Display for StudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudioError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            StudioError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            StudioError::AuthRequired(msg) => write!(f, "Authentication required: {}", msg),
            StudioError::RateLimited(msg) => write!(f, "Rate limited: {}", msg),
            StudioError::QuotaExceeded(msg) => write!(f, "Quota exceeded: {}", msg),
            StudioError::UpstreamError { status, message } => {
                write!(f, "AI Gateway error: {} - {}", status, message)
            }
            StudioError::NoImageProduced => write!(f, "No image generated"),
            StudioError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            StudioError::HistoryError(msg) => write!(f, "History error: {}", msg),
            StudioError::RequestError(msg) => write!(f, "Request error: {}", msg),
            StudioError::ResponseError(msg) => write!(f, "Response error: {}", msg),
        }
    }
}

impl std::error::Error for StudioError {}

impl StudioError {
    /// HTTP status the proxy answers with for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            StudioError::InvalidRequest(_) | StudioError::AuthRequired(_) => 400,
            StudioError::RateLimited(_) => 429,
            StudioError::QuotaExceeded(_) => 402,
            _ => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;
