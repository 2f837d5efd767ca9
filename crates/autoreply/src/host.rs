// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON-lines host bridge.
//!
//! Each input line is one notification:
//!
//! ```json
//! {"source":"com.tencent.mm","title":"Alice","body":"hi","actions":[{"key":"reply","inputs":["reply_text"]}]}
//! ```
//!
//! Delivering a reply writes one line to the output:
//!
//! ```json
//! {"action":"reply","inputs":{"reply_text":"hello!"}}
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use autoreply_core::{
    AdapterType, AutoreplyError, HealthStatus, NotificationEvent, NotificationSource,
    PluginAdapter, ReplyAction,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct WireNotification {
    source: String,
    title: String,
    body: String,
    #[serde(default)]
    actions: Vec<WireAction>,
}

#[derive(Debug, Deserialize)]
struct WireAction {
    key: String,
    #[serde(default)]
    inputs: Vec<String>,
}

#[derive(Debug, Serialize)]
struct WireReply<'a> {
    action: &'a str,
    inputs: &'a HashMap<String, String>,
}

/// Serialized writer shared by every action of the bridge.
pub struct ReplyWriter {
    out: Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
}

impl ReplyWriter {
    pub fn new(out: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
        }
    }

    async fn write_reply(
        &self,
        action: &str,
        inputs: &HashMap<String, String>,
    ) -> Result<(), AutoreplyError> {
        let mut line = serde_json::to_string(&WireReply { action, inputs })
            .map_err(|e| delivery_err("failed to encode reply", e))?;
        line.push('\n');

        let mut out = self.out.lock().await;
        out.write_all(line.as_bytes())
            .await
            .map_err(|e| delivery_err("failed to write reply", e))?;
        out.flush()
            .await
            .map_err(|e| delivery_err("failed to flush reply", e))
    }
}

fn delivery_err(message: &str, e: impl std::error::Error + Send + Sync + 'static) -> AutoreplyError {
    AutoreplyError::Delivery {
        message: message.to_string(),
        source: Some(Box::new(e)),
    }
}

/// A notification action that answers through the [`ReplyWriter`].
pub struct LineAction {
    key: String,
    inputs: Vec<String>,
    writer: Arc<ReplyWriter>,
}

#[async_trait]
impl ReplyAction for LineAction {
    fn label(&self) -> &str {
        &self.key
    }

    fn input_keys(&self) -> Vec<String> {
        self.inputs.clone()
    }

    async fn send(&self, inputs: HashMap<String, String>) -> Result<(), AutoreplyError> {
        self.writer.write_reply(&self.key, &inputs).await
    }
}

/// Notification source reading JSON lines.
///
/// Blank and malformed lines are skipped with a warning.
pub struct LineSource<R> {
    lines: Mutex<Lines<R>>,
    writer: Arc<ReplyWriter>,
}

impl<R: AsyncBufRead + Send + Unpin + 'static> LineSource<R> {
    pub fn new(reader: R, writer: Arc<ReplyWriter>) -> Self {
        Self {
            lines: Mutex::new(reader.lines()),
            writer,
        }
    }

    fn parse(&self, line: &str) -> Result<NotificationEvent, serde_json::Error> {
        let wire: WireNotification = serde_json::from_str(line)?;
        let actions = wire
            .actions
            .into_iter()
            .map(|a| {
                Arc::new(LineAction {
                    key: a.key,
                    inputs: a.inputs,
                    writer: Arc::clone(&self.writer),
                }) as Arc<dyn ReplyAction>
            })
            .collect();
        Ok(NotificationEvent {
            source: wire.source,
            title: wire.title,
            body: wire.body,
            posted_at: Utc::now(),
            actions,
        })
    }
}

#[async_trait]
impl<R: AsyncBufRead + Send + Unpin + 'static> PluginAdapter for LineSource<R> {
    fn name(&self) -> &str {
        "stdio"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Source
    }

    async fn health_check(&self) -> Result<HealthStatus, AutoreplyError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), AutoreplyError> {
        Ok(())
    }
}

#[async_trait]
impl<R: AsyncBufRead + Send + Unpin + 'static> NotificationSource for LineSource<R> {
    async fn next_event(&self) -> Result<Option<NotificationEvent>, AutoreplyError> {
        let mut lines = self.lines.lock().await;
        loop {
            let Some(line) = lines
                .next_line()
                .await
                .map_err(|e| AutoreplyError::Internal(format!("failed to read notification: {e}")))?
            else {
                return Ok(None);
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match self.parse(line) {
                Ok(event) => {
                    debug!(source = %event.source, title = %event.title, "notification received");
                    return Ok(Some(event));
                }
                Err(e) => warn!(error = %e, "skipping malformed notification line"),
            }
        }
    }
}
