// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock reply action for deterministic delivery tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use autoreply_core::{AutoreplyError, NotificationEvent, ReplyAction};
use chrono::Utc;
use tokio::sync::Mutex;

/// Package name the harness configures as the designated source.
pub const TEST_SOURCE: &str = "com.tencent.mm";

/// A reply action that records every send instead of reaching a host.
pub struct MockAction {
    keys: Vec<String>,
    fail: bool,
    sent: Mutex<Vec<HashMap<String, String>>>,
}

impl MockAction {
    /// An action with one `reply_text` slot.
    pub fn new() -> Self {
        Self::with_keys(&["reply_text"])
    }

    pub fn with_keys(keys: &[&str]) -> Self {
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            fail: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// An action with no free-text slot (e.g. "Mark as read").
    pub fn without_inputs() -> Self {
        Self::with_keys(&[])
    }

    /// An action whose send always fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Every set of inputs sent so far.
    pub async fn sent(&self) -> Vec<HashMap<String, String>> {
        self.sent.lock().await.clone()
    }

    /// The text written to the first slot of each send.
    pub async fn sent_texts(&self) -> Vec<String> {
        let first = self.keys.first().cloned().unwrap_or_default();
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|inputs| inputs.get(&first).cloned())
            .collect()
    }
}

impl Default for MockAction {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplyAction for MockAction {
    fn label(&self) -> &str {
        if self.keys.is_empty() { "Mark as read" } else { "Reply" }
    }

    fn input_keys(&self) -> Vec<String> {
        self.keys.clone()
    }

    async fn send(&self, inputs: HashMap<String, String>) -> Result<(), AutoreplyError> {
        if self.fail {
            return Err(AutoreplyError::delivery("mock action refused to send"));
        }
        self.sent.lock().await.push(inputs);
        Ok(())
    }
}

/// A notification from [`TEST_SOURCE`] carrying `action`.
pub fn notification(title: &str, body: &str, action: Arc<MockAction>) -> NotificationEvent {
    NotificationEvent {
        source: TEST_SOURCE.to_string(),
        title: title.to_string(),
        body: body.to_string(),
        posted_at: Utc::now(),
        actions: vec![action as Arc<dyn ReplyAction>],
    }
}
