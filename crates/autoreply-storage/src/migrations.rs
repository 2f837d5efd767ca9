// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary via
//! `embed_migrations!` and applied when the database is opened.

use autoreply_core::AutoreplyError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Apply all pending migrations on `conn`.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), AutoreplyError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(|e| AutoreplyError::Storage {
            source: Box::new(e),
        })?;
    for migration in report.applied_migrations() {
        tracing::info!(migration = %migration, "applied migration");
    }
    Ok(())
}
