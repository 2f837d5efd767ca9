// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the autoreply agent.
//!
//! This crate provides the error type, the domain model (correspondents,
//! conversation turns, outcome log entries, notification events) and the
//! adapter traits implemented by hosts and storage backends.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::AutoreplyError;
pub use types::{
    AdapterType, ChatTurn, Correspondent, HealthStatus, IncomingMessage, NotificationEvent,
    OutcomeLogEntry, Role,
};

// Re-export all adapter traits at crate root.
pub use traits::{NotificationSource, PluginAdapter, ReplyAction, StorageAdapter};

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;

    struct Slots(Vec<String>);

    #[async_trait]
    impl ReplyAction for Slots {
        fn label(&self) -> &str {
            "slots"
        }

        fn input_keys(&self) -> Vec<String> {
            self.0.clone()
        }

        async fn send(&self, _inputs: HashMap<String, String>) -> Result<(), AutoreplyError> {
            Ok(())
        }
    }

    fn event_with(actions: Vec<Arc<dyn ReplyAction>>) -> NotificationEvent {
        NotificationEvent {
            source: "com.example.chat".into(),
            title: "Alice".into(),
            body: "hello".into(),
            posted_at: chrono::Utc::now(),
            actions,
        }
    }

    #[test]
    fn role_parses_known_and_unknown_values() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!("assistant".parse::<Role>().unwrap(), Role::Assistant);
        assert_eq!(
            "system".parse::<Role>().unwrap(),
            Role::Other("system".into())
        );
        assert_eq!(Role::Other("tool".into()).to_string(), "tool");
    }

    #[test]
    fn role_serializes_as_plain_string() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        let parsed: Role = serde_json::from_str("\"narrator\"").unwrap();
        assert_eq!(parsed, Role::Other("narrator".into()));
    }

    #[test]
    fn correspondent_matches_either_direction() {
        let alice = Correspondent::new("Alice", "");
        assert!(alice.matches_sender("Alice"));
        assert!(alice.matches_sender("Alice Zhang"));
        assert!(alice.matches_sender("Ali"));
        assert!(!alice.matches_sender("Bob"));
        assert!(!alice.matches_sender("   "));
    }

    #[test]
    fn outcome_constructors_set_success_flag() {
        assert!(OutcomeLogEntry::succeeded("a", "b", "c").success);
        assert!(!OutcomeLogEntry::failed("a", "b", "c").success);
    }

    #[test]
    fn reply_action_skips_actions_without_inputs() {
        let event = event_with(vec![
            Arc::new(Slots(vec![])),
            Arc::new(Slots(vec!["reply_text".into()])),
        ]);
        let action = event.reply_action().expect("should find a reply action");
        assert_eq!(action.input_keys(), vec!["reply_text".to_string()]);

        let none = event_with(vec![Arc::new(Slots(vec![]))]);
        assert!(none.reply_action().is_none());
    }

    #[test]
    fn error_variants_render() {
        let err = AutoreplyError::delivery("no remote input");
        assert_eq!(err.to_string(), "delivery error: no remote input");
        let err = AutoreplyError::load("missing file");
        assert_eq!(err.to_string(), "model load error: missing file");
    }
}
