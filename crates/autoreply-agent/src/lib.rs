// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The reply pipeline for the autoreply agent.
//!
//! The [`Pipeline`] is the central coordinator that:
//! - Drains the bounded intake queue fed by the host
//! - Extracts (sender, text) and runs the policy gate
//! - Spawns one async worker per admitted message for generation, a
//!   randomized delay, delivery and logging
//! - Keeps conversation windows, the outcome log and the correspondent
//!   directory in sync with storage
//! - Drains in-flight workers on shutdown

pub mod conversations;
pub mod delay;
pub mod delivery;
pub mod directory;
pub mod intake;
pub mod outcome_log;
pub mod shutdown;

use std::sync::Arc;
use std::time::Duration;

use autoreply_config::model::AutoreplyConfig;
use autoreply_core::{
    AutoreplyError, Correspondent, IncomingMessage, NotificationEvent, OutcomeLogEntry,
    ReplyAction, StorageAdapter,
};
use autoreply_engine::ReplyGenerator;
use autoreply_policy::{
    DailyCounter, GateDecision, GateInput, MessageExtractor, PolicyGate, QuotaSlot,
    RateTracker, RejectReason, REDACTED_REPLY,
};
use chrono::{DateTime, Local};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub use conversations::Conversations;
pub use delay::ReplyDelay;
pub use delivery::deliver;
pub use directory::CorrespondentDirectory;
pub use intake::{forward_events, intake_queue, IntakeHandle, IntakeReceiver};
pub use outcome_log::{OutcomeLog, LOG_CAPACITY};

/// What the dispatcher did with one notification.
pub enum Admission {
    /// The extractor dropped it (wrong source, group chat, placeholder body).
    Ignored,
    /// The policy gate declined it.
    Rejected(RejectReason),
    /// Passed every check; ready for a reply worker.
    Accepted(ReplyJob),
}

impl Admission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Admission::Accepted(_))
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            Admission::Rejected(reason) => Some(*reason),
            _ => None,
        }
    }
}

/// An admitted message with everything a worker needs to answer it.
///
/// Holds a daily quota reservation; dropping the job unanswered releases it.
pub struct ReplyJob {
    pub message: IncomingMessage,
    pub correspondent: Correspondent,
    pub action: Arc<dyn ReplyAction>,
    slot: QuotaSlot,
}

/// Wires extraction, policy, generation, delivery and persistence together.
pub struct Pipeline {
    extractor: MessageExtractor,
    gate: PolicyGate,
    generator: Arc<ReplyGenerator>,
    storage: Arc<dyn StorageAdapter>,
    directory: Arc<CorrespondentDirectory>,
    conversations: Conversations,
    outcomes: OutcomeLog,
    delay: ReplyDelay,
    refresh_every: Duration,
}

impl Pipeline {
    /// Builds the pipeline and restores persisted state.
    ///
    /// `storage` must already be initialized. The daily counter is seeded
    /// from today's successful log entries.
    pub async fn open(
        config: &AutoreplyConfig,
        storage: Arc<dyn StorageAdapter>,
        generator: Arc<ReplyGenerator>,
    ) -> Result<Self, AutoreplyError> {
        let extractor = MessageExtractor::from_config(&config.intake)?;

        let directory = Arc::new(CorrespondentDirectory::new(Arc::clone(&storage)));
        directory.refresh().await?;

        let conversations = Conversations::new(Arc::clone(&storage));
        conversations.restore(&directory.snapshot()).await?;

        let outcomes = OutcomeLog::new(Arc::clone(&storage));
        outcomes.restore().await?;

        let quota = Arc::new(DailyCounter::from_log(
            config.reply.daily_limit,
            &outcomes.entries().await,
            Local::now().date_naive(),
        ));
        let rate = Arc::new(RateTracker::new(config.reply.per_minute_limit));
        let gate = PolicyGate::from_config(&config.reply, rate, quota);

        info!(
            agent_name = config.agent.name.as_str(),
            enabled = gate.is_enabled(),
            correspondents = directory.snapshot().len(),
            replies_today = gate.quota().count(),
            "reply pipeline initialized"
        );

        Ok(Self {
            extractor,
            gate,
            generator,
            storage,
            directory,
            conversations,
            outcomes,
            delay: ReplyDelay::from_secs(config.reply.min_delay_secs, config.reply.max_delay_secs),
            refresh_every: Duration::from_secs(config.intake.directory_refresh_secs.max(1)),
        })
    }

    /// Replaces the pre-delivery delay.
    pub fn with_delay(mut self, delay: ReplyDelay) -> Self {
        self.delay = delay;
        self
    }

    pub fn gate(&self) -> &PolicyGate {
        &self.gate
    }

    pub fn generator(&self) -> &Arc<ReplyGenerator> {
        &self.generator
    }

    pub fn directory(&self) -> &Arc<CorrespondentDirectory> {
        &self.directory
    }

    pub fn conversations(&self) -> &Conversations {
        &self.conversations
    }

    pub fn outcomes(&self) -> &OutcomeLog {
        &self.outcomes
    }

    /// Deletes a correspondent together with its conversation window.
    pub async fn remove_correspondent(&self, key: &str) -> Result<Correspondent, AutoreplyError> {
        let removed = self.directory.remove(key).await?;
        self.conversations.forget(&removed.id);
        Ok(removed)
    }

    /// Runs extraction and the policy gate for one event at the current time.
    pub async fn admit(&self, event: &NotificationEvent) -> Admission {
        self.admit_at(event, Local::now()).await
    }

    /// Like [`admit`](Self::admit) with an explicit clock reading.
    ///
    /// On acceptance a daily quota slot is reserved and the sender's rate
    /// timestamp is recorded. A sensitive content rejection appends a failed
    /// entry to the outcome log. No other path has side effects.
    pub async fn admit_at(&self, event: &NotificationEvent, now: DateTime<Local>) -> Admission {
        let Some(message) = self.extractor.extract(event) else {
            return Admission::Ignored;
        };

        let correspondents = self.directory.snapshot();
        let decision = self.gate.evaluate(&GateInput {
            message: &message,
            now,
            engine_ready: self.generator.is_ready(),
            correspondents: &correspondents,
            event,
        });

        match decision {
            GateDecision::Proceed {
                correspondent,
                action,
            } => {
                let Some(slot) = self.gate.quota().try_reserve_on(now.date_naive()) else {
                    debug!(
                        sender = %message.sender,
                        reason = %RejectReason::DailyLimitReached,
                        "reply rejected"
                    );
                    return Admission::Rejected(RejectReason::DailyLimitReached);
                };
                self.gate
                    .rate()
                    .record_at(&message.sender, now.timestamp_millis());
                debug!(
                    sender = %message.sender,
                    correspondent = %correspondent.name,
                    action = action.label(),
                    "message admitted"
                );
                Admission::Accepted(ReplyJob {
                    message,
                    correspondent,
                    action,
                    slot,
                })
            }
            GateDecision::Reject(reason) => {
                if reason.logs_outcome() {
                    let entry =
                        OutcomeLogEntry::failed(&message.sender, &message.text, REDACTED_REPLY);
                    if let Err(e) = self.outcomes.append(entry).await {
                        warn!(error = %e, "failed to record blocked message");
                    }
                }
                Admission::Rejected(reason)
            }
        }
    }

    /// Generates, waits, delivers and records one reply.
    ///
    /// Never fails: delivery errors become a failed outcome entry.
    pub async fn reply(&self, job: ReplyJob) -> OutcomeLogEntry {
        let ReplyJob {
            message,
            correspondent,
            action,
            slot,
        } = job;

        let history = self.conversations.history(&correspondent.id);
        let reply = self
            .generator
            .generate_reply(
                &correspondent.name,
                &correspondent.style,
                &history,
                &message.text,
            )
            .await;

        let pause = self.delay.sample();
        if !pause.is_zero() {
            debug!(sender = %message.sender, delay_ms = pause.as_millis() as u64, "delaying reply");
            tokio::time::sleep(pause).await;
        }

        let entry = match deliver(action.as_ref(), &reply).await {
            Ok(()) => {
                slot.commit();
                info!(
                    sender = %message.sender,
                    chars = reply.chars().count(),
                    replies_today = self.gate.quota().count(),
                    "reply delivered"
                );
                if let Err(e) = self
                    .conversations
                    .record_exchange(&correspondent.id, &message.text, &reply)
                    .await
                {
                    warn!(error = %e, "failed to persist conversation");
                }
                OutcomeLogEntry::succeeded(&message.sender, &message.text, &reply)
            }
            Err(e) => {
                drop(slot);
                warn!(sender = %message.sender, error = %e, "reply delivery failed");
                OutcomeLogEntry::failed(
                    &message.sender,
                    &message.text,
                    format!("[delivery failed: {e}]"),
                )
            }
        };

        if let Err(e) = self.outcomes.append(entry.clone()).await {
            warn!(error = %e, "failed to persist outcome");
        }
        entry
    }

    /// Drains `intake` until it closes or `cancel` fires, then waits up to
    /// `drain_timeout` for in-flight replies, releases the model and closes
    /// storage.
    pub async fn run(
        self: Arc<Self>,
        mut intake: IntakeReceiver,
        cancel: CancellationToken,
        drain_timeout: Duration,
    ) -> Result<(), AutoreplyError> {
        info!("reply pipeline running");

        let refresh_cancel = cancel.child_token();
        let refresher =
            Arc::clone(&self.directory).spawn_refresh(self.refresh_every, refresh_cancel.clone());
        let mut workers: JoinSet<()> = JoinSet::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping intake");
                    break;
                }
                Some(joined) = workers.join_next(), if !workers.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "reply worker ended abnormally");
                    }
                }
                next = intake.recv() => match next {
                    Some(event) => {
                        if let Admission::Accepted(job) = self.admit(&event).await {
                            let pipeline = Arc::clone(&self);
                            workers.spawn(async move {
                                pipeline.reply(job).await;
                            });
                        }
                    }
                    None => {
                        info!("intake closed");
                        break;
                    }
                },
            }
        }

        intake.close();
        shutdown::drain_workers(&mut workers, drain_timeout).await;

        refresh_cancel.cancel();
        if let Err(e) = refresher.await {
            warn!(error = %e, "directory refresh task ended abnormally");
        }

        self.generator.release().await;
        self.storage.close().await?;

        info!("reply pipeline stopped");
        Ok(())
    }
}
