// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local inference for the autoreply agent.
//!
//! [`InferenceEngine`] owns one model session and runs generations one at a
//! time. [`ReplyGenerator`] wraps it with prompt assembly, output cleanup and
//! a default-reply fallback. [`CandleLoader`] is the GGUF backend.

pub mod candle;
pub mod engine;
pub mod generation;
pub mod generator;
pub mod model_store;
pub mod session;

pub use candle::{CandleLoader, CandleSession};
pub use engine::{EngineStatus, GenerateRequest, InferenceEngine};
pub use generation::{run_generation, Generation, StopReason};
pub use generator::ReplyGenerator;
pub use model_store::ModelStore;
pub use session::{LoadSpec, ModelLoader, ModelSession, SamplingParams};
