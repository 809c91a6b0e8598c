// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session operations.
//!
//! The "one active session per (user, project)" rule is enforced by the
//! `idx_sessions_one_active` partial unique index, so reuse-or-create is a
//! single conflict-ignoring insert followed by a read.

use std::str::FromStr;

use rusqlite::{params, Row};
use wadi_core::{Session, SessionState, WadiError};

use crate::database::{map_tr_err, now_timestamp, Database};

fn row_to_session(row: &Row<'_>) -> Result<Session, rusqlite::Error> {
    let state: String = row.get(3)?;
    let state = SessionState::from_str(&state).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Session {
        id: row.get(0)?,
        user_id: row.get(1)?,
        project_id: row.get(2)?,
        state,
        created_at: row.get(4)?,
    })
}

/// Return the active session for `(user_id, project_id)`, creating it if absent.
///
/// Concurrent callers always observe the same session id.
pub async fn get_or_create_active_session(
    db: &Database,
    user_id: &str,
    project_id: &str,
) -> Result<Session, WadiError> {
    let user_id = user_id.to_string();
    let project_id = project_id.to_string();
    let candidate_id = uuid::Uuid::new_v4().to_string();
    let now = now_timestamp();

    db.connection()
        .call(move |conn| -> Result<Session, rusqlite::Error> {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO sessions (id, user_id, project_id, state, created_at)
                 VALUES (?1, ?2, ?3, 'active', ?4)
                 ON CONFLICT DO NOTHING",
                params![candidate_id, user_id, project_id, now],
            )?;
            let session = tx.query_row(
                "SELECT id, user_id, project_id, state, created_at
                 FROM sessions
                 WHERE user_id = ?1 AND project_id = ?2 AND state = 'active'",
                params![user_id, project_id],
                row_to_session,
            )?;
            tx.commit()?;
            Ok(session)
        })
        .await
        .map_err(map_tr_err)
}

/// Close the active session for `(user_id, project_id)`.
///
/// Returns `true` if a session was closed. The next run starts a new one.
pub async fn close_active_session(
    db: &Database,
    user_id: &str,
    project_id: &str,
) -> Result<bool, WadiError> {
    let user_id = user_id.to_string();
    let project_id = project_id.to_string();
    let now = now_timestamp();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE sessions SET state = 'closed', closed_at = ?3
                 WHERE user_id = ?1 AND project_id = ?2 AND state = 'active'",
                params![user_id, project_id, now],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reuses_active_session() {
        let db = Database::open_in_memory().await.unwrap();
        let first = get_or_create_active_session(&db, "u1", "p1").await.unwrap();
        let second = get_or_create_active_session(&db, "u1", "p1").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.state, SessionState::Active);
    }

    #[tokio::test]
    async fn sessions_are_scoped_by_user_and_project() {
        let db = Database::open_in_memory().await.unwrap();
        let a = get_or_create_active_session(&db, "u1", "p1").await.unwrap();
        let b = get_or_create_active_session(&db, "u1", "p2").await.unwrap();
        let c = get_or_create_active_session(&db, "u2", "p1").await.unwrap();
        assert_ne!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }

    #[tokio::test]
    async fn concurrent_creation_yields_one_session() {
        let db = Database::open_in_memory().await.unwrap();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                get_or_create_active_session(&db, "u1", "p1").await.unwrap().id
            }));
        }
        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap());
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
    }

    #[tokio::test]
    async fn closing_starts_a_new_session() {
        let db = Database::open_in_memory().await.unwrap();
        let first = get_or_create_active_session(&db, "u1", "p1").await.unwrap();
        assert!(close_active_session(&db, "u1", "p1").await.unwrap());
        assert!(!close_active_session(&db, "u1", "p1").await.unwrap());

        let second = get_or_create_active_session(&db, "u1", "p1").await.unwrap();
        assert_ne!(first.id, second.id);

        let id = first.id.clone();
        let state: String = db
            .connection()
            .call(move |conn| {
                conn.query_row("SELECT state FROM sessions WHERE id = ?1", params![id], |row| {
                    row.get(0)
                })
            })
            .await
            .unwrap();
        assert_eq!(state, SessionState::Closed.to_string());
    }
}
