// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the autoreply agent.

use thiserror::Error;

/// The primary error type used across all autoreply crates.
///
/// Policy rejections are not errors; they are returned as
/// `GateDecision::Reject` values by the policy crate.
#[derive(Debug, Error)]
pub enum AutoreplyError {
    /// Configuration errors (invalid TOML, bad values, unusable patterns).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Model loading failed (missing file, incompatible format, allocation failure).
    #[error("model load error: {message}")]
    Load {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The prompt could not be tokenized into the session's context.
    #[error("tokenize error: {0}")]
    Tokenize(String),

    /// A decode step (prefill or single token) failed.
    #[error("decode error: {0}")]
    Decode(String),

    /// Writing the reply into the host action or invoking it failed.
    #[error("delivery error: {message}")]
    Delivery {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The intake queue rejected an event (full or closed).
    #[error("intake queue error: {0}")]
    Queue(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AutoreplyError {
    /// Shorthand for a [`AutoreplyError::Delivery`] without an underlying source.
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a [`AutoreplyError::Load`] without an underlying source.
    pub fn load(message: impl Into<String>) -> Self {
        Self::Load {
            message: message.into(),
            source: None,
        }
    }
}
