// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded conversation windows keyed by correspondent id.

use std::collections::VecDeque;

use autoreply_core::types::ChatTurn;
use dashmap::DashMap;

/// Maximum turns retained per correspondent.
pub const MAX_TURNS: usize = 20;

/// Rolling windows of the most recent [`MAX_TURNS`] turns per correspondent.
///
/// Appends and trims for one id happen under that id's shard lock, so
/// concurrent workers never observe a window longer than the cap.
#[derive(Debug, Default)]
pub struct ConversationStore {
    windows: DashMap<String, VecDeque<ChatTurn>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns for `id` in chronological order. Unknown ids yield an empty list.
    pub fn get(&self, id: &str) -> Vec<ChatTurn> {
        self.windows
            .get(id)
            .map(|window| window.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Appends a turn, evicting from the front past [`MAX_TURNS`].
    ///
    /// Returns the window after the append so callers can persist it.
    pub fn append(&self, id: &str, turn: ChatTurn) -> Vec<ChatTurn> {
        let mut window = self.windows.entry(id.to_string()).or_default();
        window.push_back(turn);
        while window.len() > MAX_TURNS {
            window.pop_front();
        }
        window.iter().cloned().collect()
    }

    /// Replaces the window for `id`, keeping only the newest [`MAX_TURNS`].
    pub fn restore(&self, id: &str, turns: Vec<ChatTurn>) {
        let skip = turns.len().saturating_sub(MAX_TURNS);
        let window: VecDeque<ChatTurn> = turns.into_iter().skip(skip).collect();
        if window.is_empty() {
            self.windows.remove(id);
        } else {
            self.windows.insert(id.to_string(), window);
        }
    }

    /// Empties the window for `id`.
    pub fn clear(&self, id: &str) {
        self.windows.remove(id);
    }

    pub fn len(&self, id: &str) -> usize {
        self.windows.get(id).map(|w| w.len()).unwrap_or(0)
    }

    pub fn is_empty(&self, id: &str) -> bool {
        self.len(id) == 0
    }
}
