pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logger;
pub mod models;
pub mod proxy;
pub mod storage;

pub use client::{
    DownloadedImage, GenerationInvoker, GenerationOutcome, HttpInvoker, StudioClient, UserContext,
};
pub use config::{Config, GatewayConfig, HistoryStoreConfig, ObjectStoreConfig};
pub use error::{Result, StudioError};
pub use gateway::{GatewayClient, GenerationGateway};
pub use models::{
    GenerateImageRequest, GenerateImageResponse, GenerationPhase, HistoryRecord, ImageOutput,
    NewHistoryRecord, SourceImage,
};
pub use proxy::ProxyState;
pub use storage::{ArtifactStore, HistoryStore, RestHistoryStore, RestObjectStore, StorageManager};
