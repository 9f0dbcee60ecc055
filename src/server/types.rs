use serde::{Deserialize, Serialize};

use crate::scorer::CriticalityScores;

/// Uniform response envelope every endpoint wraps its payload in.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: String,
    pub execution_time_ms: Option<u64>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            execution_time_ms: None,
        }
    }

    pub fn error(message: &str) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
            execution_time_ms: None,
        }
    }

    pub fn with_timing(mut self, elapsed_ms: u64) -> Self {
        self.execution_time_ms = Some(elapsed_ms);
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictionRequest {
    pub text: String,
    /// Optional second text field, concatenated to `text` before
    /// scoring.
    #[serde(default)]
    pub equipment_description: Option<String>,
}

impl PredictionRequest {
    /// The text actually sent to the scorer.
    pub fn scoring_text(&self) -> String {
        match self.equipment_description.as_deref() {
            Some(extra) if !extra.trim().is_empty() => {
                format!("{} {}", self.text, extra)
            }
            _ => self.text.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchPredictionRequest {
    pub texts: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchPredictionItem {
    pub text: String,
    pub predictions: CriticalityScores,
}

#[derive(Debug, Serialize)]
pub struct BatchPredictionResponse {
    pub results: Vec<BatchPredictionItem>,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub message: String,
    pub status: String,
    pub version: String,
    pub model_loaded: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub tokenizer_loaded: bool,
}

/// Returned by the upload endpoint once the file has been accepted
/// and background processing started.
#[derive(Debug, Serialize)]
pub struct UploadAccepted {
    pub filename: String,
    pub sheet_used: String,
    pub total_rows: usize,
    pub processing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoring_text_concatenates() {
        let req = PredictionRequest {
            text: "fuite vapeur".into(),
            equipment_description: Some("chaudière B".into()),
        };
        assert_eq!(req.scoring_text(), "fuite vapeur chaudière B");
    }

    #[test]
    fn test_scoring_text_ignores_blank_extra() {
        let req = PredictionRequest {
            text: "fuite vapeur".into(),
            equipment_description: Some("   ".into()),
        };
        assert_eq!(req.scoring_text(), "fuite vapeur");
    }

    #[test]
    fn test_request_deserializes_without_extra_field() {
        let req: PredictionRequest =
            serde_json::from_str(r#"{"text": "surchauffe moteur"}"#).unwrap();
        assert!(req.equipment_description.is_none());
    }

    #[test]
    fn test_envelope_shape() {
        let ok = ApiResponse::success(1u8).with_timing(12);
        assert!(ok.success);
        assert_eq!(ok.data, Some(1));
        assert!(ok.error.is_none());
        assert_eq!(ok.execution_time_ms, Some(12));

        let err = ApiResponse::<u8>::error("boom");
        assert!(!err.success);
        assert!(err.data.is_none());
        assert_eq!(err.error.as_deref(), Some("boom"));
    }
}
