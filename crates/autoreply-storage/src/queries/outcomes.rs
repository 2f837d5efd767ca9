// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outcome log persistence. Rows are read newest first.

use autoreply_core::AutoreplyError;
use autoreply_core::types::OutcomeLogEntry;
use rusqlite::params;

use crate::database::{map_tr_err, parse_timestamp, Database};

pub async fn load(db: &Database, limit: usize) -> Result<Vec<OutcomeLogEntry>, AutoreplyError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, sender_name, received_text, replied_text, timestamp, success
                 FROM outcome_log ORDER BY seq DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], |row| {
                let timestamp: String = row.get(4)?;
                Ok(OutcomeLogEntry {
                    id: row.get(0)?,
                    sender_name: row.get(1)?,
                    received_text: row.get(2)?,
                    replied_text: row.get(3)?,
                    timestamp: parse_timestamp(4, &timestamp)?,
                    success: row.get(5)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Inserts `entry`, then deletes everything but the newest `capacity` rows.
pub async fn append(
    db: &Database,
    entry: &OutcomeLogEntry,
    capacity: usize,
) -> Result<(), AutoreplyError> {
    let e = entry.clone();
    let capacity = i64::try_from(capacity).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO outcome_log
                     (id, sender_name, received_text, replied_text, timestamp, success)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    e.id,
                    e.sender_name,
                    e.received_text,
                    e.replied_text,
                    e.timestamp.to_rfc3339(),
                    e.success,
                ],
            )?;
            tx.execute(
                "DELETE FROM outcome_log WHERE seq NOT IN
                     (SELECT seq FROM outcome_log ORDER BY seq DESC LIMIT ?1)",
                params![capacity],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn clear(db: &Database) -> Result<(), AutoreplyError> {
    db.connection()
        .call(|conn| -> Result<_, rusqlite::Error> {
            conn.execute("DELETE FROM outcome_log", [])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn load_returns_newest_first() {
        let (db, _dir) = setup_db().await;
        for i in 0..3 {
            let entry = OutcomeLogEntry::succeeded("Alice", format!("msg {i}"), "ok");
            append(&db, &entry, 10).await.unwrap();
        }

        let texts: Vec<_> = load(&db, 10)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.received_text)
            .collect();
        assert_eq!(texts, vec!["msg 2", "msg 1", "msg 0"]);
    }

    #[tokio::test]
    async fn append_trims_to_capacity() {
        let (db, _dir) = setup_db().await;
        for i in 0..5 {
            let entry = OutcomeLogEntry::failed("Bob", format!("msg {i}"), "[delivery failed]");
            append(&db, &entry, 3).await.unwrap();
        }

        let all = load(&db, 100).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].received_text, "msg 4");
        assert_eq!(all[2].received_text, "msg 2");
        assert!(all.iter().all(|e| !e.success));
    }

    #[tokio::test]
    async fn load_respects_limit_and_clear_empties() {
        let (db, _dir) = setup_db().await;
        for i in 0..4 {
            let entry = OutcomeLogEntry::succeeded("Carol", format!("msg {i}"), "ok");
            append(&db, &entry, 200).await.unwrap();
        }
        assert_eq!(load(&db, 2).await.unwrap().len(), 2);

        clear(&db).await.unwrap();
        assert!(load(&db, 200).await.unwrap().is_empty());
    }
}
