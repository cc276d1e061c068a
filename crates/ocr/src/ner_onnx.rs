//! Transformer NER backed by ONNX Runtime.
//!
//! Expects a HuggingFace token-classification export: `model.onnx`,
//! `tokenizer.json`, and the model's `config.json` (for `id2label`).
//! The session is built once and shared; inference takes a lock on it.

use ndarray::Array2;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::ner::{group_token_labels, Entity, EntityRecognizer, NerError};

/// Longest sequence fed to the model; longer OCR output is truncated.
const MAX_TOKENS: usize = 512;

pub struct OnnxEntityRecognizer {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    labels: Vec<String>,
    wants_token_type_ids: bool,
}

impl std::fmt::Debug for OnnxEntityRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEntityRecognizer")
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}

impl OnnxEntityRecognizer {
    pub fn load(model_path: &Path, tokenizer_path: &Path, config_path: &Path) -> Result<Self, NerError> {
        for path in [model_path, tokenizer_path, config_path] {
            if !path.exists() {
                return Err(NerError::Model(format!("file not found: {}", path.display())));
            }
        }

        let config = std::fs::read_to_string(config_path)
            .map_err(|e| NerError::Model(format!("{}: {e}", config_path.display())))?;
        let labels = parse_id2label(&config)?;

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(2))
            .and_then(|b| b.commit_from_file(model_path))
            .map_err(|e| NerError::Model(format!("{}: {e}", model_path.display())))?;
        let wants_token_type_ids = session.inputs.iter().any(|i| i.name == "token_type_ids");

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| NerError::Model(format!("{}: {e}", tokenizer_path.display())))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| NerError::Model(e.to_string()))?;

        info!(labels = labels.len(), "NER model loaded from {}", model_path.display());
        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            labels,
            wants_token_type_ids,
        })
    }
}

impl EntityRecognizer for OnnxEntityRecognizer {
    fn entities(&self, text: &str) -> Result<Vec<Entity>, NerError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| NerError::Inference(format!("tokenization failed: {e}")))?;
        let len = encoding.get_ids().len();
        let ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let mask: Vec<i64> = encoding.get_attention_mask().iter().map(|&m| m as i64).collect();

        let to_tensor = |v: Vec<i64>| {
            Array2::from_shape_vec((1, len), v)
                .map_err(|e| NerError::Inference(e.to_string()))
                .and_then(|a| Value::from_array(a).map_err(|e| NerError::Inference(e.to_string())))
        };
        let ids = to_tensor(ids)?;
        let mask = to_tensor(mask)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| NerError::Inference("session lock poisoned".into()))?;
        let outputs = if self.wants_token_type_ids {
            let types = to_tensor(vec![0i64; len])?;
            session.run(ort::inputs![
                "input_ids" => ids,
                "attention_mask" => mask,
                "token_type_ids" => types
            ])
        } else {
            session.run(ort::inputs![
                "input_ids" => ids,
                "attention_mask" => mask
            ])
        }
        .map_err(|e| NerError::Inference(e.to_string()))?;

        // [batch, seq_len, num_labels]
        let logits = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| NerError::Inference(e.to_string()))?;
        let shape = logits.shape().to_vec();
        if shape.len() != 3 || shape[1] != len {
            return Err(NerError::Inference(format!("unexpected logits shape {shape:?}")));
        }

        let labels: Vec<&str> = (0..len)
            .map(|t| {
                let best = (0..shape[2])
                    .max_by(|&a, &b| logits[[0, t, a]].total_cmp(&logits[[0, t, b]]))
                    .unwrap_or(0);
                self.labels.get(best).map(String::as_str).unwrap_or("O")
            })
            .collect();

        let entities = group_token_labels(text, encoding.get_offsets(), &labels);
        debug!(tokens = len, entities = entities.len(), "NER pass complete");
        Ok(entities)
    }
}

/// Reads `id2label` (`{"0": "O", "1": "B-PER", …}`) into an index-ordered table.
fn parse_id2label(config_json: &str) -> Result<Vec<String>, NerError> {
    #[derive(serde::Deserialize)]
    struct ModelConfig {
        id2label: HashMap<String, String>,
    }

    let config: ModelConfig = serde_json::from_str(config_json)
        .map_err(|e| NerError::Model(format!("invalid model config: {e}")))?;
    let mut labels = vec![String::from("O"); config.id2label.len()];
    for (id, label) in config.id2label {
        let idx: usize = id
            .parse()
            .map_err(|_| NerError::Model(format!("non-numeric label id '{id}'")))?;
        if idx >= labels.len() {
            labels.resize(idx + 1, String::from("O"));
        }
        labels[idx] = label;
    }
    Ok(labels)
}
