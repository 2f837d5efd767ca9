// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed queries, one module per persisted collection.

pub mod correspondents;
pub mod outcomes;
pub mod turns;
