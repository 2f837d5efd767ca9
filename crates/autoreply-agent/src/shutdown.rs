// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.
//!
//! Installs handlers for SIGTERM and SIGINT (Ctrl+C), triggering a
//! [`CancellationToken`] that the pipeline monitors. In-flight replies are
//! drained before the process exits.

use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is received.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => {
                            info!("received SIGINT (Ctrl+C), initiating shutdown");
                        }
                        _ = sigterm.recv() => {
                            info!("received SIGTERM, initiating shutdown");
                        }
                    }
                }
                Err(e) => {
                    error!(error = %e, "failed to install SIGTERM handler");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Waits up to `timeout` for in-flight reply workers, then aborts the rest.
///
/// Returns how many workers were aborted.
pub async fn drain_workers(workers: &mut JoinSet<()>, timeout: Duration) -> usize {
    if workers.is_empty() {
        info!("no in-flight replies to drain");
        return 0;
    }

    info!(count = workers.len(), "waiting for in-flight replies to complete");

    let drained = tokio::time::timeout(timeout, async {
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "reply worker ended abnormally");
            }
        }
    })
    .await;

    match drained {
        Ok(()) => {
            info!("all replies drained");
            0
        }
        Err(_) => {
            let remaining = workers.len();
            warn!(remaining, "drain timeout reached, aborting remaining replies");
            workers.abort_all();
            while workers.join_next().await.is_some() {}
            remaining
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn install_signal_handler_returns_token() {
        let token = install_signal_handler();
        assert!(!token.is_cancelled());
        token.cancel();
    }

    #[tokio::test]
    async fn drain_empty_set() {
        let mut workers = JoinSet::new();
        assert_eq!(drain_workers(&mut workers, Duration::from_millis(10)).await, 0);
    }

    #[tokio::test]
    async fn drain_waits_for_quick_workers() {
        let mut workers = JoinSet::new();
        for _ in 0..3 {
            workers.spawn(async {
                tokio::time::sleep(Duration::from_millis(5)).await;
            });
        }
        assert_eq!(drain_workers(&mut workers, Duration::from_secs(5)).await, 0);
        assert!(workers.is_empty());
    }

    #[tokio::test]
    async fn drain_aborts_stragglers() {
        let mut workers = JoinSet::new();
        workers.spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });
        assert_eq!(drain_workers(&mut workers, Duration::from_millis(20)).await, 1);
        assert!(workers.is_empty());
    }
}
