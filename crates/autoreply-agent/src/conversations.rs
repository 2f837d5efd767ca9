// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation windows with write-through persistence.

use std::sync::Arc;

use autoreply_context::ConversationStore;
use autoreply_core::{AutoreplyError, ChatTurn, Correspondent, StorageAdapter};
use tokio::sync::Mutex;
use tracing::debug;

pub struct Conversations {
    store: ConversationStore,
    storage: Arc<dyn StorageAdapter>,
    write: Mutex<()>,
}

impl Conversations {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self {
            store: ConversationStore::new(),
            storage,
            write: Mutex::new(()),
        }
    }

    /// Loads the stored window of every correspondent.
    pub async fn restore(&self, correspondents: &[Correspondent]) -> Result<(), AutoreplyError> {
        for c in correspondents {
            let turns = self.storage.load_turns(&c.id).await?;
            debug!(correspondent = %c.name, turns = turns.len(), "conversation restored");
            self.store.restore(&c.id, turns);
        }
        Ok(())
    }

    pub fn history(&self, id: &str) -> Vec<ChatTurn> {
        self.store.get(id)
    }

    /// Appends the received message and the reply, then persists the window.
    pub async fn record_exchange(
        &self,
        id: &str,
        received: &str,
        replied: &str,
    ) -> Result<(), AutoreplyError> {
        let _write = self.write.lock().await;
        self.store.append(id, ChatTurn::user(received));
        let window = self.store.append(id, ChatTurn::assistant(replied));
        self.storage.save_turns(id, &window).await
    }

    pub async fn clear(&self, id: &str) -> Result<(), AutoreplyError> {
        let _write = self.write.lock().await;
        self.store.clear(id);
        self.storage.clear_turns(id).await
    }

    /// Drops the in-memory window only; storage is handled by the caller.
    pub(crate) fn forget(&self, id: &str) {
        self.store.clear(id);
    }
}
