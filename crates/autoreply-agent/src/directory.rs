// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lock-free snapshot of the correspondent whitelist.
//!
//! The gate reads [`CorrespondentDirectory::snapshot`] on the intake path.
//! Mutations go to storage first and then republish the snapshot.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use autoreply_core::{AutoreplyError, Correspondent, StorageAdapter};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct CorrespondentDirectory {
    storage: Arc<dyn StorageAdapter>,
    snapshot: ArcSwap<Vec<Correspondent>>,
}

impl CorrespondentDirectory {
    /// An empty directory. Call [`refresh`](Self::refresh) to populate it.
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self {
            storage,
            snapshot: ArcSwap::from_pointee(Vec::new()),
        }
    }

    pub fn snapshot(&self) -> Arc<Vec<Correspondent>> {
        self.snapshot.load_full()
    }

    /// Reloads the snapshot from storage.
    pub async fn refresh(&self) -> Result<usize, AutoreplyError> {
        let all = self.storage.list_correspondents().await?;
        let count = all.len();
        self.snapshot.store(Arc::new(all));
        debug!(count, "correspondent directory refreshed");
        Ok(count)
    }

    /// Looks up by exact id, then by case-insensitive name.
    pub fn find(&self, key: &str) -> Option<Correspondent> {
        let snapshot = self.snapshot.load();
        snapshot
            .iter()
            .find(|c| c.id == key)
            .or_else(|| snapshot.iter().find(|c| c.name.eq_ignore_ascii_case(key)))
            .cloned()
    }

    pub async fn add(&self, name: &str, style: &str) -> Result<Correspondent, AutoreplyError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AutoreplyError::Config(
                "correspondent name must not be empty".into(),
            ));
        }
        let correspondent = Correspondent::new(name, style.trim());
        self.storage.upsert_correspondent(&correspondent).await?;
        self.refresh().await?;
        info!(name = %correspondent.name, id = %correspondent.id, "correspondent added");
        Ok(correspondent)
    }

    pub async fn set_enabled(
        &self,
        key: &str,
        enabled: bool,
    ) -> Result<Correspondent, AutoreplyError> {
        self.update(key, |c| c.enabled = enabled).await
    }

    pub async fn set_style(&self, key: &str, style: &str) -> Result<Correspondent, AutoreplyError> {
        let style = style.trim().to_string();
        self.update(key, move |c| c.style = style).await
    }

    /// Deletes a correspondent and its stored conversation.
    pub async fn remove(&self, key: &str) -> Result<Correspondent, AutoreplyError> {
        let existing = self.require(key)?;
        self.storage.delete_correspondent(&existing.id).await?;
        self.refresh().await?;
        info!(name = %existing.name, "correspondent removed");
        Ok(existing)
    }

    /// Refreshes every `every` until cancelled. Failures keep the previous
    /// snapshot.
    pub fn spawn_refresh(
        self: Arc<Self>,
        every: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = self.refresh().await {
                            warn!(error = %e, "correspondent refresh failed");
                        }
                    }
                }
            }
            debug!("directory refresh stopped");
        })
    }

    async fn update(
        &self,
        key: &str,
        change: impl FnOnce(&mut Correspondent),
    ) -> Result<Correspondent, AutoreplyError> {
        let mut correspondent = self.require(key)?;
        change(&mut correspondent);
        self.storage.upsert_correspondent(&correspondent).await?;
        self.refresh().await?;
        Ok(correspondent)
    }

    fn require(&self, key: &str) -> Result<Correspondent, AutoreplyError> {
        self.find(key)
            .ok_or_else(|| AutoreplyError::Config(format!("no correspondent matches '{key}'")))
    }
}
