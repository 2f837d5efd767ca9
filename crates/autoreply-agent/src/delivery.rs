// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply delivery through a host action.

use std::collections::HashMap;

use autoreply_core::{AutoreplyError, ReplyAction};
use tracing::debug;

/// Writes `text` into every free-text slot of `action`, then invokes it.
///
/// Any failure comes back as [`AutoreplyError::Delivery`].
pub async fn deliver(action: &dyn ReplyAction, text: &str) -> Result<(), AutoreplyError> {
    let keys = action.input_keys();
    if keys.is_empty() {
        return Err(AutoreplyError::delivery(format!(
            "action '{}' has no text input",
            action.label()
        )));
    }

    let inputs: HashMap<String, String> = keys
        .into_iter()
        .map(|key| (key, text.to_string()))
        .collect();
    debug!(action = action.label(), slots = inputs.len(), "sending reply");

    action.send(inputs).await.map_err(|e| match e {
        AutoreplyError::Delivery { .. } => e,
        other => AutoreplyError::Delivery {
            message: format!("action '{}' failed", action.label()),
            source: Some(Box::new(other)),
        },
    })
}
