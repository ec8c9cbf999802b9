pub mod generation;
pub mod history;

pub use generation::{
    parse_data_url, ErrorBody, GenerateImageRequest, GenerateImageResponse, GenerationPhase,
    ImageOutput, SourceImage,
};
pub use history::{HistoryRecord, NewHistoryRecord};
