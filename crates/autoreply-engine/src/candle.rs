// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quantized GGUF backend on candle.
//!
//! Supports the `llama` and `qwen2` architectures on CPU. The KV cache is
//! cleared by restarting the decode position at zero: both model families
//! discard their cache when called with `index_pos == 0`.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;

use autoreply_core::error::AutoreplyError;
use candle_core::quantized::gguf_file;
use candle_core::{Device, Tensor};
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::{quantized_llama, quantized_qwen2};
use tokenizers::Tokenizer;
use tracing::{debug, warn};

use crate::session::{LoadSpec, ModelLoader, ModelSession, SamplingParams};

/// Special tokens that end generation when present in the vocabulary.
const END_TOKENS: &[&str] = &["<|im_end|>", "<|endoftext|>", "<|eot_id|>", "</s>"];

/// Loads GGUF models with candle.
#[derive(Debug, Default, Clone, Copy)]
pub struct CandleLoader;

impl ModelLoader for CandleLoader {
    fn load(&self, spec: &LoadSpec) -> Result<Box<dyn ModelSession>, AutoreplyError> {
        Ok(Box::new(CandleSession::load(spec)?))
    }
}

enum Weights {
    Llama(quantized_llama::ModelWeights),
    Qwen2(quantized_qwen2::ModelWeights),
}

impl Weights {
    fn forward(&mut self, x: &Tensor, index_pos: usize) -> candle_core::Result<Tensor> {
        match self {
            Weights::Llama(model) => model.forward(x, index_pos),
            Weights::Qwen2(model) => model.forward(x, index_pos),
        }
    }
}

/// Incremental detokenizer that only emits complete UTF-8 text.
#[derive(Default)]
struct PieceDecoder {
    tokens: Vec<u32>,
    emitted: usize,
}

impl PieceDecoder {
    fn clear(&mut self) {
        self.tokens.clear();
        self.emitted = 0;
    }

    fn push(&mut self, tokenizer: &Tokenizer, token: u32) -> Result<String, AutoreplyError> {
        self.tokens.push(token);
        let text = tokenizer
            .decode(&self.tokens, false)
            .map_err(|e| AutoreplyError::Decode(format!("detokenize failed: {e}")))?;
        match next_piece(&text, self.emitted) {
            Some(piece) => {
                self.emitted = text.len();
                Ok(piece.to_string())
            }
            None => Ok(String::new()),
        }
    }
}

/// New text past byte offset `emitted`, or `None` while nothing complete is
/// available. An offset off a char boundary keeps the text pending.
fn next_piece(text: &str, emitted: usize) -> Option<&str> {
    if text.ends_with('\u{FFFD}') || text.len() <= emitted {
        return None;
    }
    text.get(emitted..)
}

/// A loaded GGUF model with its tokenizer and decode state.
///
/// Field order matters for drop order: the sampler and cached logits go
/// first, then the weights, then the tokenizer.
pub struct CandleSession {
    sampler: LogitsProcessor,
    logits: Option<Tensor>,
    position: usize,
    pieces: PieceDecoder,
    weights: Weights,
    tokenizer: Tokenizer,
    device: Device,
    end_tokens: HashSet<u32>,
    context_length: usize,
    label: String,
}

impl CandleSession {
    pub fn load(spec: &LoadSpec) -> Result<Self, AutoreplyError> {
        let path = spec.model_path.display().to_string();
        let file = File::open(&spec.model_path).map_err(|e| AutoreplyError::Load {
            message: format!("cannot open model file {path}"),
            source: Some(Box::new(e)),
        })?;
        let mut reader = BufReader::new(file);
        let content = gguf_file::Content::read(&mut reader).map_err(|e| AutoreplyError::Load {
            message: format!("{path} is not a readable GGUF file"),
            source: Some(Box::new(e)),
        })?;

        let architecture = spec
            .architecture
            .clone()
            .or_else(|| {
                content
                    .metadata
                    .get("general.architecture")
                    .and_then(|v| v.to_string().ok())
                    .cloned()
            })
            .unwrap_or_else(|| "llama".to_string())
            .to_ascii_lowercase();

        let trained_context = metadata_u32(&content, &format!("{architecture}.context_length"))
            .map(|v| v as usize);
        let context_length = match trained_context {
            Some(trained) if trained < spec.context_length => {
                warn!(requested = spec.context_length, trained, "clamping context length to the model's");
                trained
            }
            _ => spec.context_length,
        };

        let tokenizer = Tokenizer::from_file(&spec.tokenizer_path).map_err(|e| {
            AutoreplyError::load(format!(
                "cannot load tokenizer {}: {e}",
                spec.tokenizer_path.display()
            ))
        })?;

        let gguf_end_ids: Vec<u32> = ["tokenizer.ggml.eos_token_id", "tokenizer.ggml.eot_token_id"]
            .iter()
            .filter_map(|key| metadata_u32(&content, key))
            .collect();

        let device = Device::Cpu;
        let weights = match architecture.as_str() {
            "llama" => Weights::Llama(
                quantized_llama::ModelWeights::from_gguf(content, &mut reader, &device)
                    .map_err(|e| load_error(&path, "llama", e))?,
            ),
            "qwen2" => Weights::Qwen2(
                quantized_qwen2::ModelWeights::from_gguf(content, &mut reader, &device)
                    .map_err(|e| load_error(&path, "qwen2", e))?,
            ),
            other => {
                return Err(AutoreplyError::load(format!(
                    "unsupported architecture '{other}' (supported: llama, qwen2)"
                )));
            }
        };

        let mut end_tokens: HashSet<u32> = gguf_end_ids.into_iter().collect();
        end_tokens.extend(END_TOKENS.iter().filter_map(|t| tokenizer.token_to_id(t)));
        if end_tokens.is_empty() {
            warn!("no end-of-generation tokens found; generation stops at max_tokens");
        }

        Ok(Self {
            sampler: LogitsProcessor::new(0, None, None),
            logits: None,
            position: 0,
            pieces: PieceDecoder::default(),
            weights,
            tokenizer,
            device,
            end_tokens,
            context_length,
            label: format!("{architecture}@{path}"),
        })
    }
}

fn metadata_u32(content: &gguf_file::Content, key: &str) -> Option<u32> {
    content.metadata.get(key).and_then(|v| v.to_u32().ok())
}

fn load_error(path: &str, architecture: &str, e: candle_core::Error) -> AutoreplyError {
    AutoreplyError::Load {
        message: format!("failed to load {architecture} weights from {path}"),
        source: Some(Box::new(e)),
    }
}

impl ModelSession for CandleSession {
    fn label(&self) -> &str {
        &self.label
    }

    fn context_length(&self) -> usize {
        self.context_length
    }

    fn reset(&mut self, params: &SamplingParams) {
        self.position = 0;
        self.logits = None;
        self.pieces.clear();
        let temperature = (params.temperature > 0.0).then_some(params.temperature);
        self.sampler = LogitsProcessor::new(params.seed, temperature, None);
    }

    fn tokenize(&mut self, prompt: &str, capacity: usize) -> Result<Vec<u32>, AutoreplyError> {
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| AutoreplyError::Tokenize(e.to_string()))?;
        let ids = encoding.get_ids();
        if ids.len() > capacity {
            return Err(AutoreplyError::Tokenize(format!(
                "prompt needs {} tokens, context holds {capacity}",
                ids.len()
            )));
        }
        Ok(ids.to_vec())
    }

    fn decode(&mut self, tokens: &[u32]) -> Result<(), AutoreplyError> {
        let logits = Tensor::new(tokens, &self.device)
            .and_then(|t| t.unsqueeze(0))
            .and_then(|input| self.weights.forward(&input, self.position))
            .and_then(|logits| logits.squeeze(0))
            .map_err(|e| AutoreplyError::Decode(e.to_string()))?;
        self.position += tokens.len();
        self.logits = Some(logits);
        debug!(position = self.position, batch = tokens.len(), "decoded batch");
        Ok(())
    }

    fn sample(&mut self) -> Result<u32, AutoreplyError> {
        let logits = self
            .logits
            .as_ref()
            .ok_or_else(|| AutoreplyError::Decode("sample called before decode".into()))?;
        self.sampler
            .sample(logits)
            .map_err(|e| AutoreplyError::Decode(format!("sampling failed: {e}")))
    }

    fn is_end_of_generation(&self, token: u32) -> bool {
        self.end_tokens.contains(&token)
    }

    fn token_to_piece(&mut self, token: u32) -> Result<String, AutoreplyError> {
        self.pieces.push(&self.tokenizer, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_piece_emits_only_new_complete_text() {
        assert_eq!(next_piece("Hello", 0), Some("Hello"));
        assert_eq!(next_piece("Hello wor", 5), Some(" wor"));
        assert_eq!(next_piece("Hello", 5), None);
        assert_eq!(next_piece("你\u{FFFD}", 3), None);
    }

    #[test]
    fn next_piece_waits_when_offset_splits_a_char() {
        // "é" spans bytes 1..3, so offset 2 is inside it.
        assert_eq!(next_piece("né!", 2), None);
        assert_eq!(next_piece("né!", 3), Some("!"));
    }
}
