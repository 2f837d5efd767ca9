// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend seam for the inference engine.
//!
//! A [`ModelSession`] is one loaded model with its decode state. It is driven
//! token by token from a blocking thread and is never shared between calls
//! without the engine's lock.

use std::path::PathBuf;

use autoreply_core::error::AutoreplyError;

/// Where and how to load a model.
///
/// The compute thread count is process-wide: the binary sets
/// `RAYON_NUM_THREADS` from `model.threads` before any thread starts.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSpec {
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
    /// Requested context window in tokens.
    pub context_length: usize,
    /// Architecture override; `None` uses the model file's metadata.
    pub architecture: Option<String>,
}

/// Per-call sampling configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub max_tokens: usize,
    pub temperature: f64,
    /// Resolved seed for this call.
    pub seed: u64,
}

/// One loaded model and its mutable decode state.
pub trait ModelSession: Send {
    /// Short description for logs, e.g. `qwen2@/models/x.gguf`.
    fn label(&self) -> &str;

    /// Context window in tokens.
    fn context_length(&self) -> usize;

    /// Drops any cached key/value state and installs a fresh sampler.
    fn reset(&mut self, params: &SamplingParams);

    /// Tokenizes `prompt`. Fails if it needs more than `capacity` tokens.
    fn tokenize(&mut self, prompt: &str, capacity: usize) -> Result<Vec<u32>, AutoreplyError>;

    /// Feeds `tokens` through the model, advancing its position.
    fn decode(&mut self, tokens: &[u32]) -> Result<(), AutoreplyError>;

    /// Draws the next token from the logits of the last decode.
    fn sample(&mut self) -> Result<u32, AutoreplyError>;

    fn is_end_of_generation(&self, token: u32) -> bool;

    /// Text for `token`, emitted once the pending bytes form valid UTF-8.
    /// May return an empty string while a multi-byte character is incomplete.
    fn token_to_piece(&mut self, token: u32) -> Result<String, AutoreplyError>;
}

/// Creates sessions. Called from a blocking thread.
pub trait ModelLoader: Send + Sync {
    fn load(&self, spec: &LoadSpec) -> Result<Box<dyn ModelSession>, AutoreplyError>;
}
