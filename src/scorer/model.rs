use std::sync::Arc;

use ort::session::Session;
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;

use super::encoding::TextEncoding;
use super::error::ScorerError;
use super::utils::{argmax, normalize_text};
use crate::ModelCharacteristics;

/// The three ordinal scores plus their derived aggregate.
///
/// Each per-task score is the arg-max class index of a six-class
/// head, so it lies in 0-5; `criticite` is always their sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalityScores {
    pub fiabilite_integrite: u8,
    pub disponibilite: u8,
    pub process_safety: u8,
    pub criticite: u8,
}

impl CriticalityScores {
    /// Decodes one score per head and derives the aggregate.
    pub(crate) fn from_heads(heads: &[Vec<f32>]) -> Result<Self, ScorerError> {
        if heads.len() != 3 {
            return Err(ScorerError::PredictionError(format!(
                "Expected 3 task heads, model produced {}",
                heads.len()
            )));
        }
        for (task, logits) in heads.iter().enumerate() {
            if logits.is_empty() {
                return Err(ScorerError::PredictionError(format!(
                    "Head {} produced no logits",
                    task
                )));
            }
        }

        let fiabilite_integrite = argmax(&heads[0]) as u8;
        let disponibilite = argmax(&heads[1]) as u8;
        let process_safety = argmax(&heads[2]) as u8;

        Ok(Self {
            fiabilite_integrite,
            disponibilite,
            process_safety,
            criticite: fiabilite_integrite + disponibilite + process_safety,
        })
    }
}

/// A thread-safe multi-head ordinal text scorer backed by an ONNX
/// model.
///
/// All shared fields are `Arc`-held, so the scorer is `Send + Sync`
/// and one instance can serve every request for the lifetime of the
/// process.
#[derive(Debug)]
pub struct Scorer {
    pub model_path: String,
    pub tokenizer_path: String,
    pub tokenizer: Arc<Tokenizer>,
    pub session: Arc<Session>,
    pub characteristics: ModelCharacteristics,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Scorer>();
    }
};

impl TextEncoding for Scorer {
    fn tokenizer(&self) -> Option<&Tokenizer> {
        Some(&self.tokenizer)
    }

    fn session(&self) -> Option<&Session> {
        Some(&self.session)
    }

    fn max_sequence_length(&self) -> Option<usize> {
        Some(self.characteristics.max_sequence_length)
    }

    fn num_tasks(&self) -> Option<usize> {
        Some(self.characteristics.num_tasks)
    }
}

impl Scorer {
    /// Creates a new ScorerBuilder for fluent construction
    pub fn builder() -> super::builder::ScorerBuilder {
        super::builder::ScorerBuilder::new()
    }

    /// Returns information about the scorer's current state
    pub fn info(&self) -> super::ScorerInfo {
        super::ScorerInfo {
            model_path: self.model_path.clone(),
            tokenizer_path: self.tokenizer_path.clone(),
            max_sequence_length: self.characteristics.max_sequence_length,
            num_tasks: self.characteristics.num_tasks,
            num_classes: self.characteristics.num_classes,
        }
    }

    /// Scores a single text.
    ///
    /// The text is normalized (lower-cased, whitespace collapsed),
    /// tokenized to the model's fixed length and run through one
    /// forward pass; each head's arg-max class index becomes one
    /// score.
    ///
    /// # Errors
    /// - `ValidationError` if the text is empty or whitespace-only
    /// - `TokenizerError` / `ModelError` from the encoding pipeline
    /// - `PredictionError` if the graph produced an unexpected head count
    pub fn predict(&self, text: &str) -> Result<CriticalityScores, ScorerError> {
        let normalized = normalize_text(text);
        if normalized.is_empty() {
            return Err(ScorerError::ValidationError(
                "Input text cannot be empty".into(),
            ));
        }

        let heads = self.head_logits(&normalized)?;
        CriticalityScores::from_heads(&heads)
    }

    /// Scores a slice of texts serially.
    ///
    /// Whitespace-only entries are skipped rather than failing the
    /// whole batch; everything else propagates its error.
    pub fn predict_batch(
        &self,
        texts: &[String],
    ) -> Result<Vec<(String, CriticalityScores)>, ScorerError> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            if text.trim().is_empty() {
                continue;
            }
            let scores = self.predict(text)?;
            results.push((text.clone(), scores));
        }
        Ok(results)
    }
}
