use std::collections::HashMap;

use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use super::error::ScorerError;

/// Fallback pad id when the tokenizer file does not name one.
/// CamemBERT's vocabulary places `<pad>` at index 1.
const DEFAULT_PAD_ID: i64 = 1;

/// Turns text into fixed-length model inputs and runs the multi-head
/// forward pass.
///
/// Implemented by both the builder (which needs a forward pass to
/// probe the model during construction) and the finished scorer. The
/// ONNX graph is expected to:
/// - accept `input_ids` and `attention_mask`, both `[batch, seq_len]` i64
/// - emit one logit tensor of shape `[batch, num_classes]` per task head
pub(crate) trait TextEncoding {
    /// Returns the initialized tokenizer if available
    fn tokenizer(&self) -> Option<&Tokenizer>;

    /// Returns the initialized ONNX session if available
    fn session(&self) -> Option<&Session>;

    /// Fixed sequence length inputs are padded/truncated to
    fn max_sequence_length(&self) -> Option<usize>;

    /// Number of classification heads the graph emits
    fn num_tasks(&self) -> Option<usize>;

    /// Counts tokens before any truncation, special tokens included.
    fn count_tokens(&self, text: &str) -> Result<usize, ScorerError> {
        let tokenizer = self
            .tokenizer()
            .ok_or_else(|| ScorerError::TokenizerError("Tokenizer not initialized".into()))?;

        tokenizer
            .encode(text, true)
            .map_err(|e| ScorerError::TokenizerError(e.to_string()))
            .map(|encoding| encoding.get_ids().len())
    }

    /// Tokenizes `text` to exactly `max_sequence_length` ids.
    ///
    /// Longer inputs are truncated, shorter ones padded with the
    /// tokenizer's pad id. The attention mask covers the real tokens
    /// only — the pad id cannot be inferred from the ids themselves,
    /// so the mask is derived from the pre-padding length.
    fn encode(&self, text: &str) -> Result<(Vec<i64>, Vec<i64>), ScorerError> {
        let tokenizer = self
            .tokenizer()
            .ok_or_else(|| ScorerError::TokenizerError("Tokenizer not initialized".into()))?;
        let max_length = self
            .max_sequence_length()
            .ok_or_else(|| ScorerError::TokenizerError("Max sequence length not set".into()))?;

        let encoding = tokenizer
            .encode(text, true)
            .map_err(|e| ScorerError::TokenizerError(e.to_string()))?;

        let pad_id = tokenizer
            .token_to_id("<pad>")
            .map(i64::from)
            .unwrap_or(DEFAULT_PAD_ID);

        let mut ids: Vec<i64> = encoding
            .get_ids()
            .iter()
            .take(max_length)
            .map(|&id| i64::from(id))
            .collect();
        let real_len = ids.len();
        ids.resize(max_length, pad_id);

        let mut mask = vec![1i64; real_len];
        mask.resize(max_length, 0);

        Ok((ids, mask))
    }

    /// Runs one forward pass and returns the logits of every task
    /// head, in graph output order.
    fn run_heads(&self, ids: &[i64], mask: &[i64]) -> Result<Vec<Vec<f32>>, ScorerError> {
        let session = self
            .session()
            .ok_or_else(|| ScorerError::ModelError("Session not initialized".into()))?;
        let num_tasks = self
            .num_tasks()
            .ok_or_else(|| ScorerError::ModelError("Task count not set".into()))?;

        let input_array = Array2::from_shape_vec((1, ids.len()), ids.to_vec())
            .map_err(|e| ScorerError::ModelError(format!("Failed to create input array: {}", e)))?;
        let input_dyn = input_array.into_dyn();
        let input_ids = input_dyn.as_standard_layout();

        let mask_array = Array2::from_shape_vec((1, mask.len()), mask.to_vec())
            .map_err(|e| ScorerError::ModelError(format!("Failed to create mask array: {}", e)))?;
        let mask_dyn = mask_array.into_dyn();
        let attention_mask = mask_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            "input_ids",
            Tensor::from_array(input_ids.into_owned())
                .map_err(|e| ScorerError::ModelError(format!("Failed to create input tensor: {}", e)))?,
        );
        input_tensors.insert(
            "attention_mask",
            Tensor::from_array(attention_mask.into_owned())
                .map_err(|e| ScorerError::ModelError(format!("Failed to create mask tensor: {}", e)))?,
        );

        let outputs = session
            .run(input_tensors)
            .map_err(|e| ScorerError::ModelError(format!("Failed to run model: {}", e)))?;

        let mut heads = Vec::with_capacity(num_tasks);
        for task in 0..num_tasks {
            let logits = outputs[task]
                .try_extract_array::<f32>()
                .map_err(|e| {
                    ScorerError::ModelError(format!("Failed to extract head {} logits: {}", task, e))
                })?;
            let row = logits.slice(ndarray::s![0, ..]);
            heads.push(row.iter().cloned().collect());
        }

        Ok(heads)
    }

    /// Tokenizes and runs the model in one step.
    fn head_logits(&self, text: &str) -> Result<Vec<Vec<f32>>, ScorerError> {
        let (ids, mask) = self.encode(text)?;
        self.run_heads(&ids, &mask)
    }
}
