// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation window persistence.

use autoreply_core::AutoreplyError;
use autoreply_core::types::{ChatTurn, Role};
use rusqlite::params;

use crate::database::{map_tr_err, parse_timestamp, Database};

/// Turns for a correspondent in insertion order.
pub async fn load(db: &Database, correspondent_id: &str) -> Result<Vec<ChatTurn>, AutoreplyError> {
    let id = correspondent_id.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT role, text, timestamp FROM chat_turns
                 WHERE correspondent_id = ?1 ORDER BY seq ASC",
            )?;
            let rows = stmt.query_map(params![id], |row| {
                let role: String = row.get(0)?;
                let timestamp: String = row.get(2)?;
                Ok(ChatTurn {
                    role: Role::from(role),
                    text: row.get(1)?,
                    timestamp: parse_timestamp(2, &timestamp)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Replaces the stored turns for a correspondent.
pub async fn save(
    db: &Database,
    correspondent_id: &str,
    turns: &[ChatTurn],
) -> Result<(), AutoreplyError> {
    let id = correspondent_id.to_string();
    let rows: Vec<(String, String, String)> = turns
        .iter()
        .map(|t| (t.role.to_string(), t.text.clone(), t.timestamp.to_rfc3339()))
        .collect();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM chat_turns WHERE correspondent_id = ?1", params![id])?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO chat_turns (correspondent_id, role, text, timestamp)
                     VALUES (?1, ?2, ?3, ?4)",
                )?;
                for (role, text, timestamp) in &rows {
                    stmt.execute(params![id, role, text, timestamp])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn clear(db: &Database, correspondent_id: &str) -> Result<(), AutoreplyError> {
    let id = correspondent_id.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute("DELETE FROM chat_turns WHERE correspondent_id = ?1", params![id])?;
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
    async fn save_and_load_preserve_order_and_roles() {
        let (db, _dir) = setup_db().await;
        let window = vec![
            ChatTurn::user("are you free tonight?"),
            ChatTurn::assistant("Maybe, what's up?"),
            ChatTurn {
                role: Role::Other("system".into()),
                text: "note".into(),
                timestamp: chrono::Utc::now(),
            },
        ];
        save(&db, "c1", &window).await.unwrap();

        let loaded = load(&db, "c1").await.unwrap();
        assert_eq!(loaded, window);
    }

    #[tokio::test]
    async fn save_replaces_previous_window() {
        let (db, _dir) = setup_db().await;
        save(&db, "c1", &[ChatTurn::user("one"), ChatTurn::assistant("two")])
            .await
            .unwrap();
        save(&db, "c1", &[ChatTurn::user("three")]).await.unwrap();

        let loaded = load(&db, "c1").await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].text, "three");
    }

    #[tokio::test]
    async fn windows_are_per_correspondent() {
        let (db, _dir) = setup_db().await;
        save(&db, "a", &[ChatTurn::user("for a")]).await.unwrap();
        save(&db, "b", &[ChatTurn::user("for b")]).await.unwrap();

        clear(&db, "a").await.unwrap();
        assert!(load(&db, "a").await.unwrap().is_empty());
        assert_eq!(load(&db, "b").await.unwrap()[0].text, "for b");
    }
}
