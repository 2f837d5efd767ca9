// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source filtering and content extraction for host notifications.
//!
//! Filters are data-driven: one regex for group-conversation titles and a
//! list of literal placeholder markers the host shows for non-text messages.

use autoreply_config::model::IntakeConfig;
use autoreply_core::error::AutoreplyError;
use autoreply_core::types::{IncomingMessage, NotificationEvent};
use regex::Regex;
use tracing::debug;

/// Accepts direct text messages from the designated messaging app.
#[derive(Debug, Clone)]
pub struct MessageExtractor {
    source_package: String,
    group_title: Regex,
    placeholder_markers: Vec<String>,
}

impl MessageExtractor {
    pub fn new(
        source_package: impl Into<String>,
        group_title_pattern: &str,
        placeholder_markers: Vec<String>,
    ) -> Result<Self, AutoreplyError> {
        let group_title = Regex::new(group_title_pattern).map_err(|e| {
            AutoreplyError::Config(format!("invalid group title pattern: {e}"))
        })?;
        Ok(Self {
            source_package: source_package.into(),
            group_title,
            placeholder_markers: placeholder_markers
                .into_iter()
                .filter(|m| !m.trim().is_empty())
                .collect(),
        })
    }

    pub fn from_config(config: &IntakeConfig) -> Result<Self, AutoreplyError> {
        Self::new(
            config.source_package.clone(),
            &config.group_title_pattern,
            config.placeholder_markers.clone(),
        )
    }

    /// Whether the event was posted by the designated messaging app.
    pub fn is_designated_source(&self, event: &NotificationEvent) -> bool {
        event.source == self.source_package
    }

    /// Whether the title looks like a group conversation, e.g. `Family (3)`.
    pub fn is_group_title(&self, title: &str) -> bool {
        self.group_title.is_match(title)
    }

    /// Whether the body is a stand-in for a non-text message.
    pub fn is_placeholder(&self, body: &str) -> bool {
        self.placeholder_markers
            .iter()
            .any(|marker| body.contains(marker.as_str()))
    }

    /// Extracts the sender and text, or `None` if the event is not a direct
    /// text message from the designated source. Rejection has no side effects.
    pub fn extract(&self, event: &NotificationEvent) -> Option<IncomingMessage> {
        if !self.is_designated_source(event) {
            return None;
        }

        let sender = event.title.trim();
        let text = event.body.trim();
        if sender.is_empty() || text.is_empty() {
            debug!(source = %event.source, "ignoring notification without sender or text");
            return None;
        }

        if self.is_group_title(sender) {
            debug!(title = sender, "ignoring group conversation");
            return None;
        }

        if self.is_placeholder(text) {
            debug!(sender, "ignoring non-text message");
            return None;
        }

        Some(IncomingMessage {
            sender: sender.to_string(),
            text: text.to_string(),
        })
    }
}
