// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection setup and lifecycle.
//!
//! Migrations run on a short-lived synchronous connection; all later work
//! goes through one tokio-rusqlite connection. Do not open a second
//! connection for writes.

use std::path::Path;

use autoreply_core::AutoreplyError;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::migrations::run_migrations;

/// Handle to the single tokio-rusqlite connection.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (creating if needed) the database at `path` and migrates it.
    pub async fn open(path: &str) -> Result<Self, AutoreplyError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| AutoreplyError::Storage {
                source: Box::new(e),
            })?;
        }

        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), AutoreplyError> {
            let mut conn = rusqlite::Connection::open(&migrate_path).map_err(storage_err)?;
            let mode: String = conn
                .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
                .map_err(storage_err)?;
            debug!(journal_mode = %mode, "journal mode set");
            run_migrations(&mut conn)
        })
        .await
        .map_err(|e| AutoreplyError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| AutoreplyError::Storage {
                source: Box::new(e),
            })?;
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(
                "PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;
                 PRAGMA foreign_keys = ON;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Truncates the WAL into the main database file.
    pub async fn checkpoint(&self) -> Result<(), AutoreplyError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> AutoreplyError {
    AutoreplyError::Storage {
        source: Box::new(e),
    }
}

fn storage_err(e: rusqlite::Error) -> AutoreplyError {
    AutoreplyError::Storage {
        source: Box::new(e),
    }
}

/// Parses an RFC 3339 column value.
pub(crate) fn parse_timestamp(idx: usize, value: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
