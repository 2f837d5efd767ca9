// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-flight inference engine.
//!
//! The engine owns at most one [`ModelSession`] behind an async mutex. Load,
//! generate and unload all hold the mutex for their whole duration, so a
//! second generation request waits rather than interleaving decode steps.
//! Blocking model work runs on `spawn_blocking` with the owned guard moved in.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use autoreply_core::error::AutoreplyError;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::generation::{Generation, run_generation};
use crate::session::{LoadSpec, ModelLoader, ModelSession, SamplingParams};

/// Lifecycle state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EngineStatus {
    Unloaded = 0,
    Loading = 1,
    Loaded = 2,
    Generating = 3,
}

impl EngineStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => EngineStatus::Loading,
            2 => EngineStatus::Loaded,
            3 => EngineStatus::Generating,
            _ => EngineStatus::Unloaded,
        }
    }
}

/// Sampling request for [`InferenceEngine::generate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerateRequest {
    pub max_tokens: usize,
    pub temperature: f64,
    /// `None` draws a fresh random seed for this call.
    pub seed: Option<u64>,
}

type Slot = Arc<Mutex<Option<Box<dyn ModelSession>>>>;

/// Owns the model session and serializes every access to it.
pub struct InferenceEngine {
    loader: Arc<dyn ModelLoader>,
    session: Slot,
    status: Arc<AtomicU8>,
}

impl InferenceEngine {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            session: Arc::new(Mutex::new(None)),
            status: Arc::new(AtomicU8::new(EngineStatus::Unloaded as u8)),
        }
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// True while a session is loaded, including during generation.
    pub fn is_loaded(&self) -> bool {
        matches!(
            self.status(),
            EngineStatus::Loaded | EngineStatus::Generating
        )
    }

    fn set_status(&self, status: EngineStatus) {
        self.status.store(status as u8, Ordering::Release);
    }

    /// Loads a model, releasing any current session first.
    ///
    /// On failure the engine is left `Unloaded`.
    pub async fn load(&self, spec: LoadSpec) -> Result<(), AutoreplyError> {
        let mut guard = Arc::clone(&self.session).lock_owned().await;
        if guard.take().is_some() {
            info!("releasing previous model session");
        }
        self.set_status(EngineStatus::Loading);
        info!(
            model = %spec.model_path.display(),
            context_length = spec.context_length,
            "loading model"
        );

        let loader = Arc::clone(&self.loader);
        let result = tokio::task::spawn_blocking(move || loader.load(&spec))
            .await
            .map_err(|e| AutoreplyError::Internal(format!("model load task failed: {e}")))
            .and_then(|loaded| loaded);

        match result {
            Ok(session) => {
                info!(model = session.label(), context_length = session.context_length(), "model loaded");
                *guard = Some(session);
                self.set_status(EngineStatus::Loaded);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "model load failed");
                self.set_status(EngineStatus::Unloaded);
                Err(e)
            }
        }
    }

    /// Generates a completion for `prompt`.
    ///
    /// Fails fast when no model is loaded. Tokenize and decode problems are
    /// not errors; they shorten or empty the returned [`Generation`].
    pub async fn generate(
        &self,
        prompt: String,
        request: GenerateRequest,
    ) -> Result<Generation, AutoreplyError> {
        if !self.is_loaded() {
            return Err(AutoreplyError::Internal("inference engine is not loaded".into()));
        }

        let mut guard = Arc::clone(&self.session).lock_owned().await;
        if guard.is_none() {
            return Err(AutoreplyError::Internal("inference engine is not loaded".into()));
        }
        self.set_status(EngineStatus::Generating);

        let params = SamplingParams {
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            seed: request.seed.unwrap_or_else(rand::random),
        };
        let status = Arc::clone(&self.status);
        let joined = tokio::task::spawn_blocking(move || {
            let generation = guard
                .as_mut()
                .map(|session| run_generation(session.as_mut(), &prompt, &params));
            status.store(EngineStatus::Loaded as u8, Ordering::Release);
            generation
        })
        .await;

        match joined {
            Ok(Some(generation)) => Ok(generation),
            Ok(None) => Err(AutoreplyError::Internal("inference engine is not loaded".into())),
            Err(e) => {
                self.set_status(EngineStatus::Loaded);
                Err(AutoreplyError::Internal(format!("generation task failed: {e}")))
            }
        }
    }

    /// Releases the session. Waits for an in-flight generation to finish.
    pub async fn unload(&self) {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.take() {
            info!(model = session.label(), "unloading model");
            drop(session);
        }
        self.set_status(EngineStatus::Unloaded);
    }
}
