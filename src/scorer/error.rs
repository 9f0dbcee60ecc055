use ort::Error as OrtError;
use std::fmt;

/// Represents the different types of errors that can occur while
/// scoring text.
#[derive(Debug)]
pub enum ScorerError {
    /// Error occurred while loading or using the tokenizer
    TokenizerError(String),
    /// Error occurred while loading or running the ONNX model
    ModelError(String),
    /// Error occurred during the build phase
    BuildError(String),
    /// Error occurred while decoding predictions
    PredictionError(String),
    /// Error occurred due to invalid input
    ValidationError(String),
}

impl fmt::Display for ScorerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TokenizerError(msg) => write!(f, "Tokenizer error: {}", msg),
            Self::ModelError(msg) => write!(f, "Model error: {}", msg),
            Self::BuildError(msg) => write!(f, "Build error: {}", msg),
            Self::PredictionError(msg) => write!(f, "Prediction error: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for ScorerError {}

impl From<OrtError> for ScorerError {
    fn from(err: OrtError) -> Self {
        ScorerError::BuildError(err.to_string())
    }
}
