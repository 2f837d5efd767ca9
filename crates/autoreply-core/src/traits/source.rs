// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification source trait for host integrations.

use async_trait::async_trait;

use crate::error::AutoreplyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::NotificationEvent;

/// Adapter that yields raw notification events posted on the device.
#[async_trait]
pub trait NotificationSource: PluginAdapter {
    /// Waits for the next event. `Ok(None)` means the source is exhausted.
    async fn next_event(&self) -> Result<Option<NotificationEvent>, AutoreplyError>;
}
