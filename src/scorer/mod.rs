mod encoding;
mod error;
mod model;
pub mod builder;
mod utils;

pub use builder::ScorerBuilder;
pub use error::ScorerError;
pub use model::{CriticalityScores, Scorer};

/// Information about the current state and configuration of a scorer
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScorerInfo {
    /// Path to the ONNX model file
    pub model_path: String,
    /// Path to the tokenizer file
    pub tokenizer_path: String,
    /// Fixed sequence length inputs are padded/truncated to
    pub max_sequence_length: usize,
    /// Number of classification heads
    pub num_tasks: usize,
    /// Number of classes per head
    pub num_classes: usize,
}
