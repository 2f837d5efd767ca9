// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host-facing reply generation API.

use std::sync::Arc;

use autoreply_config::model::ModelConfig;
use autoreply_context::{build_prompt, cleanup};
use autoreply_core::error::AutoreplyError;
use autoreply_core::types::ChatTurn;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::engine::{GenerateRequest, InferenceEngine};
use crate::model_store::ModelStore;

/// Prompt in, cleaned reply out, with a fixed fallback on any failure.
pub struct ReplyGenerator {
    engine: Arc<InferenceEngine>,
    store: ModelStore,
    model: ModelConfig,
    default_reply: String,
    init_lock: Mutex<()>,
}

impl ReplyGenerator {
    pub fn new(
        engine: Arc<InferenceEngine>,
        store: ModelStore,
        model: ModelConfig,
        default_reply: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            store,
            model,
            default_reply: default_reply.into(),
            init_lock: Mutex::new(()),
        }
    }

    pub fn engine(&self) -> &Arc<InferenceEngine> {
        &self.engine
    }

    pub fn default_reply(&self) -> &str {
        &self.default_reply
    }

    /// Loads the selected model. A no-op when already loaded.
    pub async fn initialize(&self) -> Result<(), AutoreplyError> {
        let _init = self.init_lock.lock().await;
        if self.engine.is_loaded() {
            debug!("engine already loaded");
            return Ok(());
        }
        let spec = self.store.load_spec(&self.model)?;
        self.engine.load(spec).await
    }

    pub fn is_ready(&self) -> bool {
        self.engine.is_loaded()
    }

    /// Generates a reply to `message`. Never fails: falls back to the
    /// configured default reply when generation errors or cleans to nothing.
    pub async fn generate_reply(
        &self,
        name: &str,
        style: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> String {
        let prompt = build_prompt(name, style, history, message);
        let request = GenerateRequest {
            max_tokens: self.model.max_tokens,
            temperature: self.model.temperature,
            seed: self.model.seed,
        };

        match self.engine.generate(prompt, request).await {
            Ok(generation) => {
                let reply = cleanup(&generation.text);
                if reply.is_empty() {
                    info!(stop = ?generation.stop, "empty generation, using default reply");
                    self.default_reply.clone()
                } else {
                    reply
                }
            }
            Err(e) => {
                warn!(error = %e, "generation failed, using default reply");
                self.default_reply.clone()
            }
        }
    }

    /// Unloads the model.
    pub async fn release(&self) {
        let _init = self.init_lock.lock().await;
        self.engine.unload().await;
    }
}
