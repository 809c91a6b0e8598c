// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Run persistence.
//!
//! Output is written only while a run is `pending`; once terminal, only the
//! status column may change.

use std::str::FromStr;

use rusqlite::{params, Row};
use wadi_core::{Run, RunStatus, WadiError};

use crate::database::{map_tr_err, now_timestamp, Database};

const RUN_COLUMNS: &str =
    "id, user_id, project_id, input, output, model, session_id, status, created_at";

fn row_to_run(row: &Row<'_>) -> Result<Run, rusqlite::Error> {
    let status: String = row.get(7)?;
    let status = RunStatus::from_str(&status).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Run {
        id: row.get(0)?,
        user_id: row.get(1)?,
        project_id: row.get(2)?,
        input: row.get(3)?,
        output: row.get(4)?,
        model: row.get(5)?,
        session_id: row.get(6)?,
        status,
        created_at: row.get(8)?,
    })
}

/// Insert a new run.
pub async fn insert_run(db: &Database, run: &Run) -> Result<(), WadiError> {
    let run = run.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO runs (id, user_id, project_id, input, output, model, session_id,
                                   status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                params![
                    run.id,
                    run.user_id,
                    run.project_id,
                    run.input,
                    run.output,
                    run.model,
                    run.session_id,
                    run.status.to_string(),
                    run.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a run by ID.
pub async fn get_run(db: &Database, id: &str) -> Result<Option<Run>, WadiError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Run>, rusqlite::Error> {
            let sql = format!("SELECT {RUN_COLUMNS} FROM runs WHERE id = ?1");
            match conn.query_row(&sql, params![id], row_to_run) {
                Ok(run) => Ok(Some(run)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// List a user's runs in a project, newest first.
pub async fn list_runs(
    db: &Database,
    user_id: &str,
    project_id: &str,
    limit: usize,
) -> Result<Vec<Run>, WadiError> {
    let user_id = user_id.to_string();
    let project_id = project_id.to_string();
    let limit = limit as i64;
    db.connection()
        .call(move |conn| -> Result<Vec<Run>, rusqlite::Error> {
            let sql = format!(
                "SELECT {RUN_COLUMNS} FROM runs
                 WHERE user_id = ?1 AND project_id = ?2
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![user_id, project_id, limit], row_to_run)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Move a pending run to a terminal status with its final output.
///
/// Returns `false` (and changes nothing) if the run is no longer pending.
pub async fn finalize_run(
    db: &Database,
    id: &str,
    status: RunStatus,
    output: &str,
) -> Result<bool, WadiError> {
    let id = id.to_string();
    let output = output.to_string();
    let status = status.to_string();
    let now = now_timestamp();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE runs SET status = ?2, output = ?3, updated_at = ?4
                 WHERE id = ?1 AND status = 'pending'",
                params![id, status, output, now],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Count a user's runs in a project.
pub async fn count_runs(db: &Database, user_id: &str, project_id: &str) -> Result<u64, WadiError> {
    let user_id = user_id.to_string();
    let project_id = project_id.to_string();
    db.connection()
        .call(move |conn| -> Result<u64, rusqlite::Error> {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM runs WHERE user_id = ?1 AND project_id = ?2",
                params![user_id, project_id],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
        .await
        .map_err(map_tr_err)
}

/// Build a fresh run record with a new id and current timestamp.
pub fn new_run(
    user_id: &str,
    project_id: &str,
    input: &str,
    model: &str,
    session_id: Option<String>,
    status: RunStatus,
) -> Run {
    Run {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        project_id: project_id.to_string(),
        input: input.to_string(),
        output: String::new(),
        model: model.to_string(),
        session_id,
        status,
        created_at: now_timestamp(),
    }
}
