// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The autoregressive sampling loop.

use std::time::Instant;

use autoreply_context::IM_END;
use tracing::{debug, warn};

use crate::session::{ModelSession, SamplingParams};

/// Why generation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The model sampled an end-of-generation token.
    EndOfGeneration,
    /// The accumulated text contained the closing role marker.
    RoleMarker,
    /// `max_tokens` were produced.
    Length,
    /// The context window is full.
    ContextFull,
    /// The prompt could not be tokenized; nothing was generated.
    TokenizeFailed,
    /// The prompt prefill failed; nothing was generated.
    PrefillFailed,
    /// A single-token decode failed; the text so far is kept.
    DecodeFailed,
    /// Sampling failed; the text so far is kept.
    SampleFailed,
}

/// Output of one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    pub prompt_tokens: usize,
    pub generated_tokens: usize,
    pub stop: StopReason,
}

impl Generation {
    fn empty(stop: StopReason) -> Self {
        Self {
            text: String::new(),
            prompt_tokens: 0,
            generated_tokens: 0,
            stop,
        }
    }
}

/// Runs one generation against `session`.
///
/// Order of operations per step: sample, stop on end-of-generation, append
/// the token's text, stop at the closing role marker, then decode the token.
/// Tokenize and prefill failures yield empty text; later decode failures
/// keep the text produced so far. Errors never escape this function.
pub fn run_generation(
    session: &mut dyn ModelSession,
    prompt: &str,
    params: &SamplingParams,
) -> Generation {
    let started_at = Instant::now();
    session.reset(params);

    let capacity = session.context_length();
    let tokens = match session.tokenize(prompt, capacity) {
        Ok(tokens) if !tokens.is_empty() => tokens,
        Ok(_) => {
            warn!("prompt tokenized to nothing");
            return Generation::empty(StopReason::TokenizeFailed);
        }
        Err(e) => {
            warn!(error = %e, "prompt tokenization failed");
            return Generation::empty(StopReason::TokenizeFailed);
        }
    };

    if let Err(e) = session.decode(&tokens) {
        warn!(error = %e, prompt_tokens = tokens.len(), "prompt prefill failed");
        return Generation {
            prompt_tokens: tokens.len(),
            ..Generation::empty(StopReason::PrefillFailed)
        };
    }

    let mut text = String::new();
    let mut generated = 0usize;
    let mut stop = StopReason::Length;
    let mut position = tokens.len();

    while generated < params.max_tokens {
        if position >= capacity {
            stop = StopReason::ContextFull;
            break;
        }

        let token = match session.sample() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, generated, "sampling failed");
                stop = StopReason::SampleFailed;
                break;
            }
        };
        if session.is_end_of_generation(token) {
            stop = StopReason::EndOfGeneration;
            break;
        }
        generated += 1;

        match session.token_to_piece(token) {
            Ok(piece) => text.push_str(&piece),
            Err(e) => debug!(error = %e, token, "token has no text"),
        }
        if let Some(at) = text.find(IM_END) {
            text.truncate(at);
            stop = StopReason::RoleMarker;
            break;
        }

        if let Err(e) = session.decode(&[token]) {
            warn!(error = %e, generated, "decode failed mid-generation, keeping partial output");
            stop = StopReason::DecodeFailed;
            break;
        }
        position += 1;
    }

    debug!(
        model = session.label(),
        latency_ms = started_at.elapsed().as_millis() as u64,
        prompt_tokens = tokens.len(),
        generated_tokens = generated,
        stop = ?stop,
        "generation finished"
    );

    Generation {
        text,
        prompt_tokens: tokens.len(),
        generated_tokens: generated,
        stop,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use autoreply_core::AutoreplyError;

    use super::*;

    const EOS: u32 = 0;

    /// Replays fixed pieces; token `n` maps to `pieces[n - 1]`.
    struct Replay {
        pieces: Vec<&'static str>,
        queue: VecDeque<u32>,
        script: Vec<u32>,
        context: usize,
        fail_tokenize: bool,
        fail_decode_at: Option<usize>,
        decodes: Vec<usize>,
        resets: usize,
    }

    impl Replay {
        fn new(pieces: Vec<&'static str>, script: Vec<u32>) -> Self {
            Self {
                pieces,
                queue: VecDeque::new(),
                script,
                context: 256,
                fail_tokenize: false,
                fail_decode_at: None,
                decodes: Vec::new(),
                resets: 0,
            }
        }
    }

    impl ModelSession for Replay {
        fn label(&self) -> &str {
            "replay"
        }

        fn context_length(&self) -> usize {
            self.context
        }

        fn reset(&mut self, _params: &SamplingParams) {
            self.resets += 1;
            self.queue = self.script.iter().copied().collect();
            self.decodes.clear();
        }

        fn tokenize(&mut self, prompt: &str, capacity: usize) -> Result<Vec<u32>, AutoreplyError> {
            let tokens: Vec<u32> = prompt.split_whitespace().map(|_| 1).collect();
            if self.fail_tokenize || tokens.len() > capacity {
                return Err(AutoreplyError::Tokenize("too long".into()));
            }
            Ok(tokens)
        }

        fn decode(&mut self, tokens: &[u32]) -> Result<(), AutoreplyError> {
            if self.fail_decode_at == Some(self.decodes.len()) {
                return Err(AutoreplyError::Decode("boom".into()));
            }
            self.decodes.push(tokens.len());
            Ok(())
        }

        fn sample(&mut self) -> Result<u32, AutoreplyError> {
            Ok(self.queue.pop_front().unwrap_or(EOS))
        }

        fn is_end_of_generation(&self, token: u32) -> bool {
            token == EOS
        }

        fn token_to_piece(&mut self, token: u32) -> Result<String, AutoreplyError> {
            Ok(self.pieces[token as usize - 1].to_string())
        }
    }

    fn params(max_tokens: usize) -> SamplingParams {
        SamplingParams {
            max_tokens,
            temperature: 0.7,
            seed: 1,
        }
    }

    #[test]
    fn stops_on_end_of_generation() {
        let mut s = Replay::new(vec!["Hi", " there"], vec![1, 2, EOS, 1]);
        let out = run_generation(&mut s, "a b c", &params(16));
        assert_eq!(out.text, "Hi there");
        assert_eq!(out.stop, StopReason::EndOfGeneration);
        assert_eq!(out.prompt_tokens, 3);
        assert_eq!(out.generated_tokens, 2);
        assert_eq!(s.decodes, vec![3, 1, 1]);
    }

    #[test]
    fn truncates_at_role_marker() {
        let mut s = Replay::new(vec!["Hi there<|im", "_end|>trailing", "x"], vec![1, 2, 3]);
        let out = run_generation(&mut s, "p", &params(16));
        assert_eq!(out.text, "Hi there");
        assert_eq!(out.stop, StopReason::RoleMarker);
        // the marker token is never decoded
        assert_eq!(s.decodes, vec![1, 1]);
    }

    #[test]
    fn respects_max_tokens() {
        let mut s = Replay::new(vec!["a"], vec![1; 10]);
        let out = run_generation(&mut s, "p", &params(4));
        assert_eq!(out.text, "aaaa");
        assert_eq!(out.stop, StopReason::Length);
    }

    #[test]
    fn tokenize_failure_is_empty() {
        let mut s = Replay::new(vec!["a"], vec![1]);
        s.fail_tokenize = true;
        let out = run_generation(&mut s, "p", &params(4));
        assert_eq!(out.text, "");
        assert_eq!(out.stop, StopReason::TokenizeFailed);
    }

    #[test]
    fn prompt_over_capacity_fails_tokenize() {
        let mut s = Replay::new(vec!["a"], vec![1]);
        s.context = 2;
        let out = run_generation(&mut s, "one two three", &params(4));
        assert_eq!(out.stop, StopReason::TokenizeFailed);
    }

    #[test]
    fn prefill_failure_is_empty() {
        let mut s = Replay::new(vec!["a"], vec![1]);
        s.fail_decode_at = Some(0);
        let out = run_generation(&mut s, "p", &params(4));
        assert_eq!(out.text, "");
        assert_eq!(out.stop, StopReason::PrefillFailed);
    }

    #[test]
    fn mid_loop_decode_failure_keeps_partial() {
        let mut s = Replay::new(vec!["ab", "cd"], vec![1, 2, 1]);
        s.fail_decode_at = Some(2);
        let out = run_generation(&mut s, "p", &params(8));
        assert_eq!(out.text, "abcd");
        assert_eq!(out.stop, StopReason::DecodeFailed);
    }

    #[test]
    fn stops_when_context_is_full() {
        let mut s = Replay::new(vec!["a"], vec![1; 10]);
        s.context = 4;
        let out = run_generation(&mut s, "p q", &params(10));
        assert_eq!(out.text, "aa");
        assert_eq!(out.stop, StopReason::ContextFull);
    }

    #[test]
    fn every_call_starts_from_reset() {
        let mut s = Replay::new(vec!["a"], vec![1, EOS]);
        run_generation(&mut s, "p", &params(4));
        run_generation(&mut s, "p", &params(4));
        assert_eq!(s.resets, 2);
    }
}
