// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the autoreply crates.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::traits::ReplyAction;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter plugged into the agent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    /// Host notification feed.
    Source,
    /// Persistence backend.
    Storage,
}

/// A person whose messages may be answered automatically.
///
/// The display name is fuzzy-matched against the sender shown in incoming
/// notifications, so it does not need to be an exact copy of the host's title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correspondent {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    /// Free-form description of how replies to this person should sound.
    pub style: String,
    pub created_at: DateTime<Utc>,
}

impl Correspondent {
    /// Creates an enabled correspondent with a fresh id.
    pub fn new(name: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            enabled: true,
            style: style.into(),
            created_at: Utc::now(),
        }
    }

    /// Fuzzy sender match: either name contains the other.
    pub fn matches_sender(&self, sender: &str) -> bool {
        let name = self.name.trim();
        let sender = sender.trim();
        if name.is_empty() || sender.is_empty() {
            return false;
        }
        sender.contains(name) || name.contains(sender)
    }
}

/// Speaker of a conversation turn.
///
/// Roles read back from storage that are neither `user` nor `assistant`
/// survive as [`Role::Other`] and are skipped when prompts are assembled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Role {
    User,
    Assistant,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Other(other) => other.as_str(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            other => Role::Other(other.to_string()),
        })
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            _ => Role::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        match value {
            Role::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

/// One immutable message in a correspondent's conversation window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A record of one completed or failed reply attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeLogEntry {
    pub id: String,
    pub sender_name: String,
    pub received_text: String,
    pub replied_text: String,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
}

impl OutcomeLogEntry {
    pub fn succeeded(
        sender_name: impl Into<String>,
        received_text: impl Into<String>,
        replied_text: impl Into<String>,
    ) -> Self {
        Self::new(sender_name, received_text, replied_text, true)
    }

    pub fn failed(
        sender_name: impl Into<String>,
        received_text: impl Into<String>,
        replied_text: impl Into<String>,
    ) -> Self {
        Self::new(sender_name, received_text, replied_text, false)
    }

    fn new(
        sender_name: impl Into<String>,
        received_text: impl Into<String>,
        replied_text: impl Into<String>,
        success: bool,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender_name: sender_name.into(),
            received_text: received_text.into(),
            replied_text: replied_text.into(),
            timestamp: Utc::now(),
            success,
        }
    }
}

/// A raw notification delivered by the host.
#[derive(Clone)]
pub struct NotificationEvent {
    /// Package identifier of the app that posted the notification.
    pub source: String,
    pub title: String,
    pub body: String,
    pub posted_at: DateTime<Utc>,
    /// Reply-capable actions attached to the notification.
    pub actions: Vec<Arc<dyn ReplyAction>>,
}

impl NotificationEvent {
    /// The first action that exposes at least one free-text input.
    pub fn reply_action(&self) -> Option<Arc<dyn ReplyAction>> {
        self.actions
            .iter()
            .find(|action| !action.input_keys().is_empty())
            .cloned()
    }
}

impl fmt::Debug for NotificationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.actions.iter().map(|a| a.label()).collect();
        f.debug_struct("NotificationEvent")
            .field("source", &self.source)
            .field("title", &self.title)
            .field("body", &self.body)
            .field("posted_at", &self.posted_at)
            .field("actions", &labels)
            .finish()
    }
}

/// Sender and text pulled out of an accepted notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub sender: String,
    pub text: String,
}
