// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A fake model backend that replays scripted replies.
//!
//! Each generation pops the next reply from a shared queue and emits it one
//! word per token, followed by an end-of-generation token. Prompts are
//! tokenized at four characters per token.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use autoreply_core::AutoreplyError;
use autoreply_engine::{LoadSpec, ModelLoader, ModelSession, SamplingParams};

const EOG_TOKEN: u32 = 0;
const FIRST_PIECE_TOKEN: u32 = 1000;
const FALLBACK_REPLY: &str = "ok";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Counters shared by every session a loader creates.
#[derive(Debug, Default)]
pub struct SessionProbe {
    loads: AtomicUsize,
    resets: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    decoded: Mutex<Vec<usize>>,
}

impl SessionProbe {
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Times a session was reset, i.e. generations started.
    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    /// Highest number of sessions decoding at the same moment.
    pub fn max_concurrent_decodes(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// Every prompt tokenized so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        lock(&self.prompts).last().cloned()
    }

    /// Batch sizes passed to decode, in call order.
    pub fn decode_batches(&self) -> Vec<usize> {
        lock(&self.decoded).clone()
    }
}

#[derive(Debug, Clone)]
struct Behavior {
    context_length: usize,
    step_delay: Duration,
    fail_tokenize: bool,
    fail_decode_at: Option<usize>,
    fail_load: bool,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            context_length: 4096,
            step_delay: Duration::ZERO,
            fail_tokenize: false,
            fail_decode_at: None,
            fail_load: false,
        }
    }
}

/// [`ModelLoader`] producing [`ScriptedSession`]s.
#[derive(Clone, Default)]
pub struct ScriptedLoader {
    replies: Arc<Mutex<VecDeque<String>>>,
    behavior: Behavior,
    probe: Arc<SessionProbe>,
}

impl ScriptedLoader {
    /// A loader whose sessions answer with `replies` in order, then `"ok"`.
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            ..Self::default()
        }
    }

    /// Every load fails with a [`AutoreplyError::Load`].
    pub fn failing() -> Self {
        let mut loader = Self::default();
        loader.behavior.fail_load = true;
        loader
    }

    pub fn with_context_length(mut self, tokens: usize) -> Self {
        self.behavior.context_length = tokens;
        self
    }

    /// Sleeps this long inside every decode call.
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.behavior.step_delay = delay;
        self
    }

    pub fn with_tokenize_failure(mut self) -> Self {
        self.behavior.fail_tokenize = true;
        self
    }

    /// The decode call with this zero-based index fails; index 0 is the prefill.
    pub fn with_decode_failure_at(mut self, call: usize) -> Self {
        self.behavior.fail_decode_at = Some(call);
        self
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        lock(&self.replies).push_back(reply.into());
    }

    pub fn probe(&self) -> Arc<SessionProbe> {
        Arc::clone(&self.probe)
    }
}

impl ModelLoader for ScriptedLoader {
    fn load(&self, spec: &LoadSpec) -> Result<Box<dyn ModelSession>, AutoreplyError> {
        if self.behavior.fail_load {
            return Err(AutoreplyError::load(format!(
                "scripted load failure for {}",
                spec.model_path.display()
            )));
        }
        self.probe.loads.fetch_add(1, Ordering::SeqCst);
        let context_length = self.behavior.context_length.min(spec.context_length.max(1));
        Ok(Box::new(ScriptedSession {
            label: format!("scripted@{}", spec.model_path.display()),
            context_length,
            replies: Arc::clone(&self.replies),
            behavior: self.behavior.clone(),
            probe: Arc::clone(&self.probe),
            pieces: Vec::new(),
            cursor: 0,
            decode_calls: 0,
        }))
    }
}

/// Session state for one scripted model.
pub struct ScriptedSession {
    label: String,
    context_length: usize,
    replies: Arc<Mutex<VecDeque<String>>>,
    behavior: Behavior,
    probe: Arc<SessionProbe>,
    pieces: Vec<String>,
    cursor: usize,
    decode_calls: usize,
}

impl ModelSession for ScriptedSession {
    fn label(&self) -> &str {
        &self.label
    }

    fn context_length(&self) -> usize {
        self.context_length
    }

    fn reset(&mut self, _params: &SamplingParams) {
        self.probe.resets.fetch_add(1, Ordering::SeqCst);
        let reply = lock(&self.replies)
            .pop_front()
            .unwrap_or_else(|| FALLBACK_REPLY.to_string());
        self.pieces = reply.split_inclusive(' ').map(str::to_string).collect();
        self.cursor = 0;
        self.decode_calls = 0;
    }

    fn tokenize(&mut self, prompt: &str, capacity: usize) -> Result<Vec<u32>, AutoreplyError> {
        lock(&self.probe.prompts).push(prompt.to_string());
        if self.behavior.fail_tokenize {
            return Err(AutoreplyError::Tokenize("scripted tokenize failure".into()));
        }
        let count = prompt.chars().count().div_ceil(4).max(1);
        if count > capacity {
            return Err(AutoreplyError::Tokenize(format!(
                "prompt needs {count} tokens, context holds {capacity}"
            )));
        }
        Ok((1..=count as u32).collect())
    }

    fn decode(&mut self, tokens: &[u32]) -> Result<(), AutoreplyError> {
        let active = self.probe.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.max_active.fetch_max(active, Ordering::SeqCst);
        lock(&self.probe.decoded).push(tokens.len());
        if !self.behavior.step_delay.is_zero() {
            thread::sleep(self.behavior.step_delay);
        }
        self.probe.active.fetch_sub(1, Ordering::SeqCst);

        let call = self.decode_calls;
        self.decode_calls += 1;
        if self.behavior.fail_decode_at == Some(call) {
            return Err(AutoreplyError::Decode(format!("scripted failure at call {call}")));
        }
        Ok(())
    }

    fn sample(&mut self) -> Result<u32, AutoreplyError> {
        if self.cursor >= self.pieces.len() {
            return Ok(EOG_TOKEN);
        }
        let token = FIRST_PIECE_TOKEN + self.cursor as u32;
        self.cursor += 1;
        Ok(token)
    }

    fn is_end_of_generation(&self, token: u32) -> bool {
        token == EOG_TOKEN
    }

    fn token_to_piece(&mut self, token: u32) -> Result<String, AutoreplyError> {
        token
            .checked_sub(FIRST_PIECE_TOKEN)
            .and_then(|index| self.pieces.get(index as usize))
            .cloned()
            .ok_or_else(|| AutoreplyError::Decode(format!("unknown token {token}")))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use autoreply_engine::{run_generation, StopReason};

    use super::*;

    fn spec() -> LoadSpec {
        LoadSpec {
            model_path: PathBuf::from("/models/test.gguf"),
            tokenizer_path: PathBuf::from("/models/tokenizer.json"),
            context_length: 512,
            architecture: None,
        }
    }

    fn params() -> SamplingParams {
        SamplingParams {
            max_tokens: 32,
            temperature: 0.7,
            seed: 7,
        }
    }

    #[test]
    fn replays_replies_in_order() {
        let loader = ScriptedLoader::new(vec!["hello there".into(), "second".into()]);
        let mut session = loader.load(&spec()).unwrap();

        let first = run_generation(session.as_mut(), "prompt", &params());
        assert_eq!(first.text, "hello there");
        assert_eq!(first.stop, StopReason::EndOfGeneration);

        let second = run_generation(session.as_mut(), "prompt", &params());
        assert_eq!(second.text, "second");

        let third = run_generation(session.as_mut(), "prompt", &params());
        assert_eq!(third.text, "ok");
        assert_eq!(loader.probe().resets(), 3);
    }

    #[test]
    fn failing_loader_reports_load_error() {
        let err = ScriptedLoader::failing().load(&spec()).err().unwrap();
        assert!(matches!(err, AutoreplyError::Load { .. }));
    }
}
