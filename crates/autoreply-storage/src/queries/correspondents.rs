// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Correspondent CRUD.

use autoreply_core::AutoreplyError;
use autoreply_core::types::Correspondent;
use rusqlite::params;

use crate::database::{map_tr_err, parse_timestamp, Database};

pub async fn list(db: &Database) -> Result<Vec<Correspondent>, AutoreplyError> {
    db.connection()
        .call(|conn| -> Result<_, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, name, enabled, style, created_at
                 FROM correspondents ORDER BY created_at ASC, rowid ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                let created_at: String = row.get(4)?;
                Ok(Correspondent {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    enabled: row.get(2)?,
                    style: row.get(3)?,
                    created_at: parse_timestamp(4, &created_at)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn upsert(db: &Database, correspondent: &Correspondent) -> Result<(), AutoreplyError> {
    let c = correspondent.clone();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            conn.execute(
                "INSERT INTO correspondents (id, name, enabled, style, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     enabled = excluded.enabled,
                     style = excluded.style",
                params![c.id, c.name, c.enabled, c.style, c.created_at.to_rfc3339()],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Deletes the correspondent and its turns in one transaction.
pub async fn delete(db: &Database, id: &str) -> Result<bool, AutoreplyError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> Result<_, rusqlite::Error> {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM chat_turns WHERE correspondent_id = ?1", params![id])?;
            let removed = tx.execute("DELETE FROM correspondents WHERE id = ?1", params![id])?;
            tx.commit()?;
            Ok(removed > 0)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::turns;
    use autoreply_core::types::ChatTurn;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn upsert_and_list_roundtrips() {
        let (db, _dir) = setup_db().await;
        let alice = Correspondent::new("Alice", "brief");
        upsert(&db, &alice).await.unwrap();

        let all = list(&db).await.unwrap();
        assert_eq!(all, vec![alice]);
    }

    #[tokio::test]
    async fn upsert_replaces_existing_row() {
        let (db, _dir) = setup_db().await;
        let mut bob = Correspondent::new("Bob", "");
        upsert(&db, &bob).await.unwrap();

        bob.enabled = false;
        bob.style = "formal".to_string();
        upsert(&db, &bob).await.unwrap();

        let all = list(&db).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(!all[0].enabled);
        assert_eq!(all[0].style, "formal");
    }

    #[tokio::test]
    async fn list_is_ordered_by_creation() {
        let (db, _dir) = setup_db().await;
        let mut first = Correspondent::new("First", "");
        let second = Correspondent::new("Second", "");
        first.created_at = second.created_at - chrono::Duration::seconds(10);

        upsert(&db, &second).await.unwrap();
        upsert(&db, &first).await.unwrap();

        let names: Vec<_> = list(&db).await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[tokio::test]
    async fn delete_removes_correspondent_and_turns() {
        let (db, _dir) = setup_db().await;
        let carol = Correspondent::new("Carol", "");
        upsert(&db, &carol).await.unwrap();
        turns::save(&db, &carol.id, &[ChatTurn::user("hi")]).await.unwrap();

        assert!(delete(&db, &carol.id).await.unwrap());
        assert!(list(&db).await.unwrap().is_empty());
        assert!(turns::load(&db, &carol.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_unknown_returns_false() {
        let (db, _dir) = setup_db().await;
        assert!(!delete(&db, "no-such-id").await.unwrap());
    }
}
