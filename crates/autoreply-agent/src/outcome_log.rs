// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The global outcome log: newest first, capped at [`LOG_CAPACITY`].

use std::collections::VecDeque;
use std::sync::Arc;

use autoreply_core::{AutoreplyError, OutcomeLogEntry, StorageAdapter};
use tokio::sync::Mutex;
use tracing::debug;

/// Maximum entries retained.
pub const LOG_CAPACITY: usize = 200;

/// In-memory log mirrored to storage on every append.
pub struct OutcomeLog {
    entries: Mutex<VecDeque<OutcomeLogEntry>>,
    storage: Arc<dyn StorageAdapter>,
}

impl OutcomeLog {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(LOG_CAPACITY)),
            storage,
        }
    }

    /// Replaces the in-memory log with what storage holds.
    pub async fn restore(&self) -> Result<usize, AutoreplyError> {
        let stored = self.storage.load_outcomes(LOG_CAPACITY).await?;
        let mut entries = self.entries.lock().await;
        *entries = stored.into_iter().collect();
        debug!(entries = entries.len(), "outcome log restored");
        Ok(entries.len())
    }

    /// Prepends `entry` and trims the tail, then persists it.
    ///
    /// The lock is held across the write so storage sees appends in the same
    /// order as memory.
    pub async fn append(&self, entry: OutcomeLogEntry) -> Result<(), AutoreplyError> {
        let mut entries = self.entries.lock().await;
        push_newest(&mut entries, entry.clone(), LOG_CAPACITY);
        self.storage.append_outcome(&entry, LOG_CAPACITY).await
    }

    /// Snapshot, newest first.
    pub async fn entries(&self) -> Vec<OutcomeLogEntry> {
        self.entries.lock().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) -> Result<(), AutoreplyError> {
        let mut entries = self.entries.lock().await;
        entries.clear();
        self.storage.clear_outcomes().await
    }
}

fn push_newest(entries: &mut VecDeque<OutcomeLogEntry>, entry: OutcomeLogEntry, capacity: usize) {
    entries.push_front(entry);
    entries.truncate(capacity);
}
