// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply-capable notification actions.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::AutoreplyError;

/// A host action attached to a notification that can carry a typed reply.
///
/// Each action exposes zero or more free-text input slots. Sending fills
/// the slots and invokes the host's send target.
#[async_trait]
pub trait ReplyAction: Send + Sync {
    /// Short label for logs (the host's action title).
    fn label(&self) -> &str;

    /// Keys of the free-text input slots this action exposes.
    fn input_keys(&self) -> Vec<String>;

    /// Invokes the action with the given slot values.
    async fn send(&self, inputs: HashMap<String, String>) -> Result<(), AutoreplyError>;
}
