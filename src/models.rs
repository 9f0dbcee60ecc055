use serde::Serialize;

/// Managed model artifacts known to this crate.
///
/// Each variant maps to a fine-tuned ONNX export plus its tokenizer,
/// hosted as downloadable artifacts and cached locally by
/// [`crate::ModelManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinModel {
    /// CamemBERT-base fine-tuned for anomaly criticality scoring:
    /// three ordinal heads (reliability/integrity, availability,
    /// process safety), six classes each.
    CamembertCriticality,
}

/// Static description of a managed artifact: where to fetch it and
/// how to verify it.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub name: String,
    pub model_url: String,
    pub tokenizer_url: String,
    pub model_hash: String,
    pub tokenizer_hash: String,
}

/// Shape-level facts about a model that the scorer needs at runtime.
#[derive(Debug, Clone, Serialize)]
pub struct ModelCharacteristics {
    /// Hidden size of the transformer encoder.
    pub hidden_size: usize,
    /// Fixed sequence length inputs are padded/truncated to.
    pub max_sequence_length: usize,
    /// Number of classification heads.
    pub num_tasks: usize,
    /// Number of classes per head.
    pub num_classes: usize,
    /// Approximate on-disk size, for logging.
    pub model_size_mb: usize,
}

impl BuiltinModel {
    pub fn get_model_info(&self) -> ModelInfo {
        match self {
            BuiltinModel::CamembertCriticality => ModelInfo {
                name: "camembert-criticality".to_string(),
                model_url: "https://huggingface.co/criticore/camembert-criticality/resolve/main/model.onnx".to_string(),
                tokenizer_url: "https://huggingface.co/criticore/camembert-criticality/resolve/main/tokenizer.json".to_string(),
                model_hash: "5b4c0af6d9cb1f5ad26c4ef26a3ad9d2a4b8e0c3f7d61a9485d3f2e6b7c81d40".to_string(),
                tokenizer_hash: "9d0a7f23c45e81b6d2f84a1c09be53776de14f2a6b3c85d90e71f4ab2c6d83e5".to_string(),
            },
        }
    }

    pub fn characteristics(&self) -> ModelCharacteristics {
        match self {
            BuiltinModel::CamembertCriticality => ModelCharacteristics {
                hidden_size: 768,
                max_sequence_length: 128,
                num_tasks: 3,
                num_classes: 6,
                model_size_mb: 423,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camembert_characteristics() {
        let c = BuiltinModel::CamembertCriticality.characteristics();
        assert_eq!(c.hidden_size, 768);
        assert_eq!(c.max_sequence_length, 128);
        assert_eq!(c.num_tasks, 3);
        assert_eq!(c.num_classes, 6);
    }

    #[test]
    fn test_model_info_urls() {
        let info = BuiltinModel::CamembertCriticality.get_model_info();
        assert!(info.model_url.ends_with(".onnx"));
        assert!(info.tokenizer_url.ends_with("tokenizer.json"));
        assert_eq!(info.model_hash.len(), 64);
        assert_eq!(info.tokenizer_hash.len(), 64);
    }
}
