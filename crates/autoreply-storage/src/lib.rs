// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the autoreply agent.
//!
//! WAL-mode SQLite with embedded refinery migrations. All statements run on
//! tokio-rusqlite's single background thread, which serializes writes.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
