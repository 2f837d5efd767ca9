// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered, short-circuiting reply admissibility checks.
//!
//! Checks run in this order, and the first failure wins:
//! 1. master switch
//! 2. engine readiness
//! 3. work hours
//! 4. daily quota
//! 5. correspondent whitelist
//! 6. sensitive content (the only rejection that is written to the outcome log)
//! 7. per-sender rate
//! 8. a reply-capable action on the notification
//!
//! Evaluation records nothing. The caller records the rate timestamp on
//! [`GateDecision::Proceed`] and writes the log entry for
//! [`RejectReason::SensitiveContent`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use autoreply_config::model::ReplyConfig;
use autoreply_core::traits::ReplyAction;
use autoreply_core::types::{Correspondent, IncomingMessage, NotificationEvent};
use chrono::{DateTime, Local};
use strum::{Display, IntoStaticStr};
use tracing::debug;

use crate::quota::DailyCounter;
use crate::rate::RateTracker;
use crate::schedule::WorkHours;
use crate::sensitive::SensitiveTerms;

/// Reply text recorded when a message is blocked for sensitive content.
pub const REDACTED_REPLY: &str = "[blocked: sensitive content]";

/// Why the gate declined to reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum RejectReason {
    Disabled,
    EngineNotReady,
    OutsideWorkHours,
    DailyLimitReached,
    NotWhitelisted,
    SensitiveContent,
    RateLimited,
    NoReplyAction,
}

impl RejectReason {
    /// Whether this rejection produces an outcome log entry.
    pub fn logs_outcome(self) -> bool {
        matches!(self, RejectReason::SensitiveContent)
    }
}

/// Result of evaluating one message.
#[derive(Clone)]
pub enum GateDecision {
    /// All checks passed.
    Proceed {
        correspondent: Correspondent,
        action: Arc<dyn ReplyAction>,
    },
    Reject(RejectReason),
}

impl GateDecision {
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            GateDecision::Reject(reason) => Some(*reason),
            GateDecision::Proceed { .. } => None,
        }
    }
}

impl std::fmt::Debug for GateDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateDecision::Proceed {
                correspondent,
                action,
            } => f
                .debug_struct("Proceed")
                .field("correspondent", &correspondent.name)
                .field("action", &action.label())
                .finish(),
            GateDecision::Reject(reason) => f.debug_tuple("Reject").field(reason).finish(),
        }
    }
}

/// Everything the gate looks at for one message.
pub struct GateInput<'a> {
    pub message: &'a IncomingMessage,
    pub now: DateTime<Local>,
    pub engine_ready: bool,
    /// Current correspondent directory snapshot.
    pub correspondents: &'a [Correspondent],
    /// The notification the message came from.
    pub event: &'a NotificationEvent,
}

/// The policy gate. Cheap and synchronous so it can run on the intake path.
pub struct PolicyGate {
    enabled: AtomicBool,
    work_hours: WorkHours,
    sensitive: SensitiveTerms,
    rate: Arc<RateTracker>,
    quota: Arc<DailyCounter>,
}

impl PolicyGate {
    pub fn new(
        enabled: bool,
        work_hours: WorkHours,
        sensitive: SensitiveTerms,
        rate: Arc<RateTracker>,
        quota: Arc<DailyCounter>,
    ) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            work_hours,
            sensitive,
            rate,
            quota,
        }
    }

    /// Builds a gate from the `[reply]` section.
    pub fn from_config(
        config: &ReplyConfig,
        rate: Arc<RateTracker>,
        quota: Arc<DailyCounter>,
    ) -> Self {
        Self::new(
            config.enabled,
            WorkHours::new(config.work_hours_start, config.work_hours_end),
            SensitiveTerms::parse(&config.sensitive_words),
            rate,
            quota,
        )
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn rate(&self) -> &Arc<RateTracker> {
        &self.rate
    }

    pub fn quota(&self) -> &Arc<DailyCounter> {
        &self.quota
    }

    /// Runs the checks in order and returns the first failure, if any.
    pub fn evaluate(&self, input: &GateInput<'_>) -> GateDecision {
        let decision = self.check(input);
        if let GateDecision::Reject(reason) = &decision {
            debug!(sender = %input.message.sender, reason = %reason, "reply rejected");
        }
        decision
    }

    fn check(&self, input: &GateInput<'_>) -> GateDecision {
        use GateDecision::Reject;

        if !self.is_enabled() {
            return Reject(RejectReason::Disabled);
        }
        if !input.engine_ready {
            return Reject(RejectReason::EngineNotReady);
        }
        if !self.work_hours.contains(&input.now) {
            return Reject(RejectReason::OutsideWorkHours);
        }
        if self.quota.is_exhausted_on(input.now.date_naive()) {
            return Reject(RejectReason::DailyLimitReached);
        }

        let sender = input.message.sender.as_str();
        let Some(correspondent) = input
            .correspondents
            .iter()
            .find(|c| c.enabled && c.matches_sender(sender))
        else {
            return Reject(RejectReason::NotWhitelisted);
        };

        if let Some(term) = self.sensitive.find_in(&input.message.text) {
            debug!(sender, term, "message contains a sensitive term");
            return Reject(RejectReason::SensitiveContent);
        }

        if !self
            .rate
            .can_send_at(sender, input.now.timestamp_millis())
        {
            return Reject(RejectReason::RateLimited);
        }

        let Some(action) = input.event.reply_action() else {
            return Reject(RejectReason::NoReplyAction);
        };

        GateDecision::Proceed {
            correspondent: correspondent.clone(),
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use autoreply_core::AutoreplyError;
    use chrono::TimeZone;

    use super::*;

    struct TextAction(Vec<String>);

    #[async_trait]
    impl ReplyAction for TextAction {
        fn label(&self) -> &str {
            "Reply"
        }

        fn input_keys(&self) -> Vec<String> {
            self.0.clone()
        }

        async fn send(&self, _inputs: HashMap<String, String>) -> Result<(), AutoreplyError> {
            Ok(())
        }
    }

    fn event_with(action: Arc<dyn ReplyAction>) -> NotificationEvent {
        NotificationEvent {
            source: "com.tencent.mm".into(),
            title: "Alice".into(),
            body: "hello".into(),
            posted_at: chrono::Utc::now(),
            actions: vec![action],
        }
    }

    struct Fixture {
        gate: PolicyGate,
        correspondents: Vec<Correspondent>,
        event: NotificationEvent,
        now: DateTime<Local>,
    }

    impl Fixture {
        fn new() -> Self {
            let config = ReplyConfig {
                enabled: true,
                sensitive_words: "password, loan".into(),
                ..ReplyConfig::default()
            };
            let gate = PolicyGate::from_config(
                &config,
                Arc::new(RateTracker::new(config.per_minute_limit)),
                Arc::new(DailyCounter::new(config.daily_limit)),
            );
            Self {
                gate,
                correspondents: vec![Correspondent::new("Alice", "friendly")],
                event: event_with(Arc::new(TextAction(vec!["reply".into()]))),
                now: Local.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap(),
            }
        }

        fn evaluate(&self, sender: &str, text: &str, engine_ready: bool) -> GateDecision {
            let message = IncomingMessage {
                sender: sender.into(),
                text: text.into(),
            };
            self.gate.evaluate(&GateInput {
                message: &message,
                now: self.now,
                engine_ready,
                correspondents: &self.correspondents,
                event: &self.event,
            })
        }
    }

    #[test]
    fn happy_path_proceeds() {
        let fx = Fixture::new();
        match fx.evaluate("Alice", "hello", true) {
            GateDecision::Proceed { correspondent, .. } => assert_eq!(correspondent.name, "Alice"),
            other => panic!("expected proceed, got {other:?}"),
        }
    }

    #[test]
    fn disabled_switch_wins_and_records_nothing() {
        let fx = Fixture::new();
        fx.gate.set_enabled(false);
        let decision = fx.evaluate("Alice", "password", false);
        assert_eq!(decision.reject_reason(), Some(RejectReason::Disabled));
        assert_eq!(fx.gate.rate().recorded("Alice"), 0);
    }

    #[test]
    fn engine_must_be_ready() {
        let fx = Fixture::new();
        assert_eq!(
            fx.evaluate("Alice", "hi", false).reject_reason(),
            Some(RejectReason::EngineNotReady)
        );
    }

    #[test]
    fn outside_work_hours() {
        let mut fx = Fixture::new();
        fx.gate.work_hours = WorkHours::new(8, 10);
        assert_eq!(
            fx.evaluate("Alice", "hi", true).reject_reason(),
            Some(RejectReason::OutsideWorkHours)
        );
        fx.now = Local.with_ymd_and_hms(2026, 6, 1, 9, 30, 0).unwrap();
        assert!(fx.evaluate("Alice", "hi", true).reject_reason().is_none());
    }

    #[test]
    fn daily_limit_reached() {
        let mut fx = Fixture::new();
        fx.gate.quota = Arc::new(DailyCounter::starting_at(1, fx.now.date_naive(), 1));
        assert_eq!(
            fx.evaluate("Alice", "hi", true).reject_reason(),
            Some(RejectReason::DailyLimitReached)
        );
    }

    #[test]
    fn whitelist_is_fuzzy_and_respects_enabled() {
        let mut fx = Fixture::new();
        assert!(fx.evaluate("Alice Wong", "hi", true).reject_reason().is_none());
        assert_eq!(
            fx.evaluate("Bob", "hi", true).reject_reason(),
            Some(RejectReason::NotWhitelisted)
        );
        fx.correspondents[0].enabled = false;
        assert_eq!(
            fx.evaluate("Alice", "hi", true).reject_reason(),
            Some(RejectReason::NotWhitelisted)
        );
    }

    #[test]
    fn sensitive_content_is_the_logged_rejection() {
        let fx = Fixture::new();
        let reason = fx.evaluate("Alice", "send me your Password", true).reject_reason();
        assert_eq!(reason, Some(RejectReason::SensitiveContent));
        assert!(reason.unwrap().logs_outcome());
        assert!(!RejectReason::RateLimited.logs_outcome());
    }

    #[test]
    fn rate_limit_uses_tracker_state() {
        let fx = Fixture::new();
        let now_ms = fx.now.timestamp_millis();
        for i in 0..3 {
            fx.gate.rate().record_at("Alice", now_ms - 1_000 * i);
        }
        assert_eq!(
            fx.evaluate("Alice", "hi", true).reject_reason(),
            Some(RejectReason::RateLimited)
        );
    }

    #[test]
    fn needs_reply_capable_action() {
        let mut fx = Fixture::new();
        fx.event = event_with(Arc::new(TextAction(Vec::new())));
        assert_eq!(
            fx.evaluate("Alice", "hi", true).reject_reason(),
            Some(RejectReason::NoReplyAction)
        );
    }

    #[test]
    fn reason_codes_are_snake_case() {
        assert_eq!(RejectReason::DailyLimitReached.to_string(), "daily_limit_reached");
        let code: &'static str = RejectReason::NoReplyAction.into();
        assert_eq!(code, "no_reply_action");
    }
}
