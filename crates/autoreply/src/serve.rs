// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `autoreply serve`: the long-running reply pipeline.

use std::sync::Arc;
use std::time::Duration;

use autoreply_agent::{forward_events, intake_queue, shutdown, Pipeline};
use autoreply_config::AutoreplyConfig;
use autoreply_core::{AutoreplyError, NotificationSource, StorageAdapter};
use autoreply_engine::{CandleLoader, InferenceEngine, ModelStore, ReplyGenerator};
use autoreply_storage::SqliteStorage;
use tokio::io::BufReader;
use tracing::{error, info, warn};

use crate::host::{LineSource, ReplyWriter};

/// How long in-flight replies may take to finish after shutdown starts.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs the pipeline until stdin closes or a shutdown signal arrives.
pub async fn run_serve(config: AutoreplyConfig) -> Result<(), AutoreplyError> {
    info!(agent_name = config.agent.name.as_str(), "starting autoreply");

    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let storage: Arc<dyn StorageAdapter> = Arc::new(storage);

    let engine = Arc::new(InferenceEngine::new(Arc::new(CandleLoader)));
    let generator = Arc::new(ReplyGenerator::new(
        engine,
        ModelStore::from_config(&config.model),
        config.model.clone(),
        config.reply.default_reply.clone(),
    ));
    if let Err(e) = generator.initialize().await {
        warn!(error = %e, "model unavailable, replies will be rejected until it loads");
    }

    let pipeline = match Pipeline::open(&config, Arc::clone(&storage), generator).await {
        Ok(pipeline) => Arc::new(pipeline),
        Err(e) => {
            if let Err(close_err) = storage.close().await {
                warn!(error = %close_err, "failed to close storage");
            }
            return Err(e);
        }
    };

    let cancel = shutdown::install_signal_handler();
    let (intake, rx) = intake_queue(config.intake.queue_capacity);

    let writer = Arc::new(ReplyWriter::new(tokio::io::stdout()));
    let source: Arc<dyn NotificationSource> =
        Arc::new(LineSource::new(BufReader::new(tokio::io::stdin()), writer));
    let forwarder = tokio::spawn(forward_events(source, intake, cancel.clone()));

    let result = pipeline.run(rx, cancel.clone(), DRAIN_TIMEOUT).await;

    cancel.cancel();
    match forwarder.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "notification source failed"),
        Err(e) => error!(error = %e, "notification forwarder panicked"),
    }

    info!("autoreply stopped");
    result
}
