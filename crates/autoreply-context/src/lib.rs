// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation context for reply generation.
//!
//! - [`ConversationStore`]: bounded per-correspondent turn windows
//! - [`build_prompt`]: ChatML prompt assembly from persona, history and message
//! - [`cleanup`]: post-processing of raw model output

pub mod cleanup;
pub mod prompt;
pub mod store;

pub use cleanup::{cleanup, MAX_REPLY_CHARS};
pub use prompt::{build_prompt, IM_END, IM_START, END_OF_TEXT};
pub use store::{ConversationStore, MAX_TURNS};
