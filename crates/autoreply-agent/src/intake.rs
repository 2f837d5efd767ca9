// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded, non-blocking event intake.
//!
//! The host pushes notifications through an [`IntakeHandle`]. Pushing never
//! waits: a full queue drops the event with a [`AutoreplyError::Queue`].

use std::sync::Arc;

use autoreply_core::{AutoreplyError, NotificationEvent, NotificationSource};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Receiving end drained by the pipeline.
pub type IntakeReceiver = mpsc::Receiver<NotificationEvent>;

/// Push side of the intake queue. Cheap to clone.
#[derive(Clone)]
pub struct IntakeHandle {
    tx: mpsc::Sender<NotificationEvent>,
}

impl IntakeHandle {
    /// Enqueues an event without waiting.
    pub fn submit(&self, event: NotificationEvent) -> Result<(), AutoreplyError> {
        self.tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => AutoreplyError::Queue("intake queue is full".into()),
            TrySendError::Closed(_) => AutoreplyError::Queue("intake queue is closed".into()),
        })
    }

    /// Free slots left in the queue.
    pub fn remaining(&self) -> usize {
        self.tx.capacity()
    }
}

/// Creates an intake queue holding at most `capacity` pending events.
pub fn intake_queue(capacity: usize) -> (IntakeHandle, IntakeReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (IntakeHandle { tx }, rx)
}

/// Pulls events from `source` and pushes them into the intake queue until the
/// source is exhausted or `cancel` fires. Events that do not fit are dropped.
pub async fn forward_events(
    source: Arc<dyn NotificationSource>,
    intake: IntakeHandle,
    cancel: CancellationToken,
) -> Result<(), AutoreplyError> {
    info!(source = source.name(), "notification source attached");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("intake forwarding cancelled");
                return Ok(());
            }
            next = source.next_event() => match next? {
                Some(event) => {
                    if let Err(e) = intake.submit(event) {
                        warn!(error = %e, "dropping notification");
                    }
                }
                None => {
                    info!(source = source.name(), "notification source exhausted");
                    return Ok(());
                }
            },
        }
    }
}
