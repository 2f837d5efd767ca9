// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends.

use async_trait::async_trait;

use crate::error::AutoreplyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChatTurn, Correspondent, OutcomeLogEntry};

/// Adapter for the three persisted collections: correspondents, one turn
/// sequence per correspondent, and the global outcome log.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), AutoreplyError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), AutoreplyError>;

    // --- Correspondents ---

    /// Lists all correspondents ordered by creation time.
    async fn list_correspondents(&self) -> Result<Vec<Correspondent>, AutoreplyError>;

    /// Inserts a correspondent or replaces the one with the same id.
    async fn upsert_correspondent(&self, correspondent: &Correspondent)
        -> Result<(), AutoreplyError>;

    /// Deletes a correspondent and its conversation window.
    /// Returns `false` if no correspondent had that id.
    async fn delete_correspondent(&self, id: &str) -> Result<bool, AutoreplyError>;

    // --- Conversation windows ---

    /// Loads a correspondent's turns in chronological order.
    async fn load_turns(&self, correspondent_id: &str) -> Result<Vec<ChatTurn>, AutoreplyError>;

    /// Replaces a correspondent's stored turns with `turns`.
    async fn save_turns(
        &self,
        correspondent_id: &str,
        turns: &[ChatTurn],
    ) -> Result<(), AutoreplyError>;

    /// Removes all turns for a correspondent.
    async fn clear_turns(&self, correspondent_id: &str) -> Result<(), AutoreplyError>;

    // --- Outcome log ---

    /// Loads up to `limit` outcome entries, newest first.
    async fn load_outcomes(&self, limit: usize) -> Result<Vec<OutcomeLogEntry>, AutoreplyError>;

    /// Appends an entry, then drops the oldest entries beyond `capacity`.
    async fn append_outcome(
        &self,
        entry: &OutcomeLogEntry,
        capacity: usize,
    ) -> Result<(), AutoreplyError>;

    /// Removes every outcome entry.
    async fn clear_outcomes(&self) -> Result<(), AutoreplyError>;
}
