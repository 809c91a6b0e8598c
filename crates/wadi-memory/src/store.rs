// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed memory store with vector BLOB storage.
//!
//! Every query is scoped by `(user_id, project_id)`; memories are never
//! visible across users.

use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;
use wadi_core::WadiError;
use wadi_storage::{map_tr_err, Database};

use crate::types::{blob_to_vec, vec_to_blob, MemoryEntry};

const MEMORY_COLUMNS: &str =
    "id, user_id, project_id, content, embedding, metadata, run_id, created_at";

fn row_to_entry(row: &Row<'_>) -> Result<MemoryEntry, rusqlite::Error> {
    let blob: Vec<u8> = row.get(4)?;
    let metadata: String = row.get(5)?;
    let metadata = serde_json::from_str(&metadata).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(MemoryEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        project_id: row.get(2)?,
        content: row.get(3)?,
        embedding: blob_to_vec(&blob),
        metadata,
        run_id: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Persistent store for memory entries.
#[derive(Clone)]
pub struct MemoryStore {
    conn: Connection,
}

impl MemoryStore {
    /// Wraps an existing connection. The `memories` table must already exist.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Store sharing the service database.
    pub fn from_database(db: &Database) -> Self {
        Self::new(db.connection().clone())
    }

    /// Insert a memory entry.
    pub async fn insert(&self, entry: &MemoryEntry) -> Result<(), WadiError> {
        let entry = entry.clone();
        let blob = vec_to_blob(&entry.embedding);
        let metadata = entry.metadata.to_string();
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO memories (id, user_id, project_id, content, embedding, metadata, run_id, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        entry.id,
                        entry.user_id,
                        entry.project_id,
                        entry.content,
                        blob,
                        metadata,
                        entry.run_id,
                        entry.created_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Get a memory by ID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<MemoryEntry>, WadiError> {
        let id = id.to_string();
        self.conn
            .call(move |conn| -> Result<Option<MemoryEntry>, rusqlite::Error> {
                let sql = format!("SELECT {MEMORY_COLUMNS} FROM memories WHERE id = ?1");
                conn.query_row(&sql, params![id], row_to_entry).optional()
            })
            .await
            .map_err(map_tr_err)
    }

    /// All memories of a project, oldest first.
    pub async fn list_scope(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> Result<Vec<MemoryEntry>, WadiError> {
        let user_id = user_id.to_string();
        let project_id = project_id.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<MemoryEntry>, rusqlite::Error> {
                let sql = format!(
                    "SELECT {MEMORY_COLUMNS} FROM memories
                     WHERE user_id = ?1 AND project_id = ?2
                     ORDER BY created_at ASC, rowid ASC"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![user_id, project_id], row_to_entry)?;
                rows.collect()
            })
            .await
            .map_err(map_tr_err)
    }

    /// Number of memories in a project.
    pub async fn count(&self, user_id: &str, project_id: &str) -> Result<usize, WadiError> {
        let user_id = user_id.to_string();
        let project_id = project_id.to_string();
        self.conn
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                let n: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM memories WHERE user_id = ?1 AND project_id = ?2",
                    params![user_id, project_id],
                    |row| row.get(0),
                )?;
                Ok(n as usize)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Embedding width used by a project, or `None` if it has no memories.
    pub async fn dimensions(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> Result<Option<usize>, WadiError> {
        let user_id = user_id.to_string();
        let project_id = project_id.to_string();
        self.conn
            .call(move |conn| -> Result<Option<usize>, rusqlite::Error> {
                let bytes: Option<i64> = conn
                    .query_row(
                        "SELECT length(embedding) FROM memories
                         WHERE user_id = ?1 AND project_id = ?2
                         LIMIT 1",
                        params![user_id, project_id],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(bytes.map(|b| b as usize / 4))
            })
            .await
            .map_err(map_tr_err)
    }

    /// Delete the oldest memories of a project until at most `cap` remain.
    ///
    /// Returns the number deleted. Ties on `created_at` fall back to
    /// insertion order.
    pub async fn prune(
        &self,
        user_id: &str,
        project_id: &str,
        cap: usize,
    ) -> Result<usize, WadiError> {
        let user_id = user_id.to_string();
        let project_id = project_id.to_string();
        let cap = cap as i64;
        self.conn
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "DELETE FROM memories WHERE rowid IN (
                         SELECT rowid FROM memories
                         WHERE user_id = ?1 AND project_id = ?2
                         ORDER BY created_at DESC, rowid DESC
                         LIMIT -1 OFFSET ?3
                     )",
                    params![user_id, project_id, cap],
                )
            })
            .await
            .map_err(map_tr_err)
    }

    /// Delete every memory of one project.
    pub async fn delete_project(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> Result<usize, WadiError> {
        let user_id = user_id.to_string();
        let project_id = project_id.to_string();
        self.conn
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "DELETE FROM memories WHERE user_id = ?1 AND project_id = ?2",
                    params![user_id, project_id],
                )
            })
            .await
            .map_err(map_tr_err)
    }

    /// Delete every memory a user owns, across projects.
    pub async fn delete_user(&self, user_id: &str) -> Result<usize, WadiError> {
        let user_id = user_id.to_string();
        self.conn
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute("DELETE FROM memories WHERE user_id = ?1", params![user_id])
            })
            .await
            .map_err(map_tr_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wadi_storage::now_timestamp;

    fn entry(user: &str, project: &str, content: &str) -> MemoryEntry {
        MemoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.into(),
            project_id: project.into(),
            content: content.into(),
            embedding: vec![0.25, 0.5, 1.0],
            metadata: serde_json::json!({"source": "test"}),
            run_id: None,
            created_at: now_timestamp(),
        }
    }

    async fn test_store() -> MemoryStore {
        let db = Database::open_in_memory().await.unwrap();
        MemoryStore::from_database(&db)
    }

    #[tokio::test]
    async fn insert_and_get() {
        let store = test_store().await;
        let mut e = entry("u1", "p1", "likes rust");
        e.run_id = Some("run-1".into());
        store.insert(&e).await.unwrap();

        let fetched = store.get_by_id(&e.id).await.unwrap().unwrap();
        assert_eq!(fetched, e);
        assert!(store.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn scope_isolates_users_and_projects() {
        let store = test_store().await;
        store.insert(&entry("u1", "p1", "a")).await.unwrap();
        store.insert(&entry("u1", "p2", "b")).await.unwrap();
        store.insert(&entry("u2", "p1", "c")).await.unwrap();

        let scoped = store.list_scope("u1", "p1").await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].content, "a");
        assert_eq!(store.count("u2", "p1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn prune_keeps_newest() {
        let store = test_store().await;
        for i in 0..15 {
            store.insert(&entry("u1", "p1", &format!("m{i}"))).await.unwrap();
        }
        assert_eq!(store.prune("u1", "p1", 10).await.unwrap(), 5);
        let remaining = store.list_scope("u1", "p1").await.unwrap();
        assert_eq!(remaining.len(), 10);
        assert_eq!(remaining[0].content, "m5");
        assert_eq!(remaining[9].content, "m14");

        // Already at cap: nothing to delete.
        assert_eq!(store.prune("u1", "p1", 10).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_project_and_user() {
        let store = test_store().await;
        store.insert(&entry("u1", "p1", "a")).await.unwrap();
        store.insert(&entry("u1", "p2", "b")).await.unwrap();
        store.insert(&entry("u2", "p1", "c")).await.unwrap();

        assert_eq!(store.delete_project("u1", "p1").await.unwrap(), 1);
        assert_eq!(store.count("u1", "p2").await.unwrap(), 1);
        assert_eq!(store.delete_user("u1").await.unwrap(), 1);
        assert_eq!(store.count("u2", "p1").await.unwrap(), 1);
    }
}
