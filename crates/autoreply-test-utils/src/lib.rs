// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for autoreply integration tests.
//!
//! Provides a scripted model backend, mock host adapters and a harness that
//! assembles the whole pipeline over a temp SQLite database, so tests run
//! fast and deterministically without model files.
//!
//! # Components
//!
//! - [`ScriptedLoader`] / [`ScriptedSession`] - fake model replaying scripted replies
//! - [`MockAction`] - reply action that captures what it was sent
//! - [`MockSource`] - notification source fed from a queue
//! - [`TestHarness`] - full pipeline with temp storage

pub mod harness;
pub mod mock_action;
pub mod mock_source;
pub mod scripted;

pub use harness::{Processed, TestHarness};
pub use mock_action::{notification, MockAction, TEST_SOURCE};
pub use mock_source::MockSource;
pub use scripted::{ScriptedLoader, ScriptedSession, SessionProbe};
