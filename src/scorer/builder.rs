use std::sync::Arc;

use log::{error, info};
use ort::session::Session;
use tokenizers::Tokenizer;

use super::encoding::TextEncoding;
use super::error::ScorerError;
use super::model::Scorer;
use crate::runtime::{create_session_builder, RuntimeConfig};
use crate::{BuiltinModel, ModelCharacteristics, ModelManager};

/// A builder for constructing a Scorer with a fluent interface.
#[derive(Default, Debug)]
pub struct ScorerBuilder {
    model_path: Option<String>,
    tokenizer_path: Option<String>,
    tokenizer: Option<Tokenizer>,
    session: Option<Session>,
    characteristics: Option<ModelCharacteristics>,
    max_length_override: Option<usize>,
    runtime_config: RuntimeConfig,
}

impl TextEncoding for ScorerBuilder {
    fn tokenizer(&self) -> Option<&Tokenizer> {
        self.tokenizer.as_ref()
    }

    fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn max_sequence_length(&self) -> Option<usize> {
        self.max_length_override
            .or_else(|| self.characteristics.as_ref().map(|c| c.max_sequence_length))
    }

    fn num_tasks(&self) -> Option<usize> {
        self.characteristics.as_ref().map(|c| c.num_tasks)
    }
}

impl ScorerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution.
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Overrides the fixed sequence length inputs are padded and
    /// truncated to. Without this the model's own characteristic
    /// length is used.
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length_override = Some(max_length);
        self
    }

    /// Loads a managed model from the local artifact cache.
    ///
    /// # Errors
    /// Fails if paths were already set, the artifact has not been
    /// downloaded (see [`ModelManager`]), or the model/tokenizer
    /// cannot be loaded or has an unexpected graph structure.
    pub fn with_model(mut self, model: BuiltinModel) -> Result<Self, ScorerError> {
        if self.model_path.is_some() || self.tokenizer_path.is_some() {
            return Err(ScorerError::BuildError(
                "Model and tokenizer paths already set".to_string(),
            ));
        }

        let manager = ModelManager::new_default()
            .map_err(|e| ScorerError::BuildError(format!("Failed to create model manager: {}", e)))?;

        if !manager.is_model_downloaded(model) {
            return Err(ScorerError::BuildError(format!(
                "Model '{:?}' is not downloaded. Please download it first using ModelManager::download_model()",
                model
            )));
        }

        let model_path = manager.get_model_path(model);
        let tokenizer_path = manager.get_tokenizer_path(model);
        let characteristics = model.characteristics();

        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            error!("Failed to load tokenizer: {}", e);
            ScorerError::BuildError(format!("Failed to load tokenizer: {}", e))
        })?;
        info!("Tokenizer loaded");

        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(&model_path)?;

        Self::validate_model(&session, characteristics.num_tasks)?;
        info!("Model structure validated");

        self.characteristics = Some(characteristics);
        self.model_path = Some(model_path.to_string_lossy().to_string());
        self.tokenizer_path = Some(tokenizer_path.to_string_lossy().to_string());
        self.tokenizer = Some(tokenizer);
        self.session = Some(session);
        Ok(self)
    }

    /// Loads a model and tokenizer from explicit paths, bypassing the
    /// artifact cache. Used when `MODEL_PATH`/`TOKENIZER_PATH` point
    /// at a locally exported artifact.
    ///
    /// # Errors
    /// Fails if either path is empty or missing, paths were already
    /// set, or the files cannot be loaded or have an unexpected graph
    /// structure.
    pub fn with_custom_model(
        mut self,
        model_path: &str,
        tokenizer_path: &str,
        max_sequence_length: Option<usize>,
    ) -> Result<Self, ScorerError> {
        if model_path.is_empty() || tokenizer_path.is_empty() {
            return Err(ScorerError::BuildError(
                "Model and tokenizer paths cannot be empty".to_string(),
            ));
        }
        if self.model_path.is_some() || self.tokenizer_path.is_some() {
            return Err(ScorerError::BuildError(
                "Model and tokenizer paths already set".to_string(),
            ));
        }

        if !std::path::Path::new(model_path).exists() {
            return Err(ScorerError::BuildError(format!(
                "Model file not found: {}",
                model_path
            )));
        }
        if !std::path::Path::new(tokenizer_path).exists() {
            return Err(ScorerError::BuildError(format!(
                "Tokenizer file not found: {}",
                tokenizer_path
            )));
        }

        let tokenizer = Tokenizer::from_file(tokenizer_path).map_err(|e| {
            error!("Failed to load tokenizer: {}", e);
            ScorerError::BuildError(format!("Failed to load tokenizer: {}", e))
        })?;
        info!("Tokenizer loaded");

        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(model_path)?;

        // A custom export must still carry the three task heads
        let defaults = BuiltinModel::CamembertCriticality.characteristics();
        Self::validate_model(&session, defaults.num_tasks)?;
        info!("Model structure validated");

        self.tokenizer = Some(tokenizer);
        self.session = Some(session);
        self.characteristics = Some(ModelCharacteristics {
            max_sequence_length: max_sequence_length.unwrap_or(defaults.max_sequence_length),
            ..defaults
        });

        // Probe one forward pass so a mis-exported graph fails here
        // rather than on the first request
        let heads = self.head_logits("essai de validation")?;
        for (task, logits) in heads.iter().enumerate() {
            if logits.len() != defaults.num_classes {
                return Err(ScorerError::ModelError(format!(
                    "Head {} emits {} logits, expected {}",
                    task,
                    logits.len(),
                    defaults.num_classes
                )));
            }
        }
        info!("Model probe succeeded");

        self.model_path = Some(model_path.to_string());
        self.tokenizer_path = Some(tokenizer_path.to_string());
        Ok(self)
    }

    /// Builds and returns the final Scorer instance.
    ///
    /// # Errors
    /// Fails if no model was configured.
    pub fn build(mut self) -> Result<Scorer, ScorerError> {
        if self.model_path.is_none() || self.tokenizer_path.is_none() {
            return Err(ScorerError::BuildError(
                "Model and tokenizer paths must be set".to_string(),
            ));
        }

        let mut characteristics = self
            .characteristics
            .take()
            .ok_or_else(|| ScorerError::BuildError("Model characteristics not set".to_string()))?;
        if let Some(max_length) = self.max_length_override {
            characteristics.max_sequence_length = max_length;
        }

        let tokenizer = Arc::new(
            self.tokenizer
                .take()
                .ok_or_else(|| ScorerError::BuildError("No tokenizer loaded".into()))?,
        );
        let session = Arc::new(
            self.session
                .take()
                .ok_or_else(|| ScorerError::BuildError("No ONNX model loaded".into()))?,
        );

        Ok(Scorer {
            model_path: self.model_path.take().unwrap(),
            tokenizer_path: self.tokenizer_path.take().unwrap(),
            tokenizer,
            session,
            characteristics,
        })
    }

    /// Validates that the graph exposes the expected inputs and one
    /// output per task head.
    fn validate_model(session: &Session, expected_tasks: usize) -> Result<(), ScorerError> {
        let inputs = &session.inputs();
        if inputs.len() < 2 {
            return Err(ScorerError::ModelError(format!(
                "Model must have at least 2 inputs (input_ids and attention_mask), found {}",
                inputs.len()
            )));
        }

        let outputs = &session.outputs();
        if outputs.len() != expected_tasks {
            return Err(ScorerError::ModelError(format!(
                "Model must have exactly {} outputs (one per task head), found {}",
                expected_tasks,
                outputs.len()
            )));
        }

        Ok(())
    }
}
