// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock notification source fed from an in-memory queue.

use std::collections::VecDeque;

use async_trait::async_trait;
use autoreply_core::{
    AdapterType, AutoreplyError, HealthStatus, NotificationEvent, NotificationSource,
    PluginAdapter,
};
use tokio::sync::Mutex;

/// Yields queued events in order, then reports exhaustion.
pub struct MockSource {
    events: Mutex<VecDeque<NotificationEvent>>,
}

impl MockSource {
    pub fn new(events: Vec<NotificationEvent>) -> Self {
        Self {
            events: Mutex::new(VecDeque::from(events)),
        }
    }

    pub async fn remaining(&self) -> usize {
        self.events.lock().await.len()
    }
}

#[async_trait]
impl PluginAdapter for MockSource {
    fn name(&self) -> &str {
        "mock-source"
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
impl NotificationSource for MockSource {
    async fn next_event(&self) -> Result<Option<NotificationEvent>, AutoreplyError> {
        Ok(self.events.lock().await.pop_front())
    }
}
