// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use autoreply_config::model::StorageConfig;
use autoreply_core::types::{ChatTurn, Correspondent, OutcomeLogEntry};
use autoreply_core::{AdapterType, AutoreplyError, HealthStatus, PluginAdapter, StorageAdapter};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// The database is opened on [`StorageAdapter::initialize`]; every other
/// operation fails with a storage error until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, AutoreplyError> {
        self.db.get().ok_or_else(|| AutoreplyError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, AutoreplyError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), AutoreplyError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), AutoreplyError> {
        let path = self.config.database_path.clone();
        let db = Database::open(&path).await?;
        self.db.set(db).map_err(|_| AutoreplyError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), AutoreplyError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Correspondents ---

    async fn list_correspondents(&self) -> Result<Vec<Correspondent>, AutoreplyError> {
        queries::correspondents::list(self.db()?).await
    }

    async fn upsert_correspondent(
        &self,
        correspondent: &Correspondent,
    ) -> Result<(), AutoreplyError> {
        queries::correspondents::upsert(self.db()?, correspondent).await
    }

    async fn delete_correspondent(&self, id: &str) -> Result<bool, AutoreplyError> {
        queries::correspondents::delete(self.db()?, id).await
    }

    // --- Conversation windows ---

    async fn load_turns(&self, correspondent_id: &str) -> Result<Vec<ChatTurn>, AutoreplyError> {
        queries::turns::load(self.db()?, correspondent_id).await
    }

    async fn save_turns(
        &self,
        correspondent_id: &str,
        turns: &[ChatTurn],
    ) -> Result<(), AutoreplyError> {
        queries::turns::save(self.db()?, correspondent_id, turns).await
    }

    async fn clear_turns(&self, correspondent_id: &str) -> Result<(), AutoreplyError> {
        queries::turns::clear(self.db()?, correspondent_id).await
    }

    // --- Outcome log ---

    async fn load_outcomes(&self, limit: usize) -> Result<Vec<OutcomeLogEntry>, AutoreplyError> {
        queries::outcomes::load(self.db()?, limit).await
    }

    async fn append_outcome(
        &self,
        entry: &OutcomeLogEntry,
        capacity: usize,
    ) -> Result<(), AutoreplyError> {
        queries::outcomes::append(self.db()?, entry, capacity).await
    }

    async fn clear_outcomes(&self) -> Result<(), AutoreplyError> {
        queries::outcomes::clear(self.db()?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_creates_database_and_parent_dir() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn operations_before_initialize_fail() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("uninit.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert!(storage.list_correspondents().await.is_err());
        assert!(storage.health_check().await.is_err());
        // Shutdown of a never-opened store is a no-op.
        storage.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn double_initialize_is_rejected() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(storage.initialize().await.is_err());
    }
}
