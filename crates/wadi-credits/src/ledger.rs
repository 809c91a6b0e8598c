// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent credit ledger.
//!
//! Balances live in `credit_balances` (with a `balance >= 0` check) and every
//! movement appends one row to `credit_history`. Debits are a single
//! conditional decrement, so two concurrent debits can never both spend the
//! same credit.

use std::str::FromStr;

use rusqlite::{params, OptionalExtension};
use tracing::{debug, info};
use wadi_core::{CreditEntry, CreditKind, WadiError};
use wadi_storage::{map_tr_err, now_timestamp, Database};

/// Result of a successful debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebitReceipt {
    /// Balance after the debit was applied.
    pub new_balance: i64,
    /// History row recording the debit.
    pub entry_id: i64,
}

enum DebitAttempt {
    Applied(DebitReceipt),
    Insufficient { available: i64 },
}

/// Per-user credit balances with an immutable usage history.
#[derive(Clone)]
pub struct CreditLedger {
    conn: tokio_rusqlite::Connection,
}

impl CreditLedger {
    /// Create a ledger over an existing tokio-rusqlite connection.
    ///
    /// The credit tables must already exist (created by storage migrations).
    pub fn new(conn: tokio_rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Create a ledger sharing the service database.
    pub fn from_database(db: &Database) -> Self {
        Self::new(db.connection().clone())
    }

    /// Current balance. Users with no ledger row have a balance of zero.
    pub async fn get_balance(&self, user_id: &str) -> Result<i64, WadiError> {
        let user_id = user_id.to_string();
        self.conn
            .call(move |conn| -> Result<i64, rusqlite::Error> {
                let balance = conn
                    .query_row(
                        "SELECT balance FROM credit_balances WHERE user_id = ?1",
                        params![user_id],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(balance.unwrap_or(0))
            })
            .await
            .map_err(map_tr_err)
    }

    /// Atomically debit `amount` if the balance covers it.
    ///
    /// Fails with [`WadiError::InsufficientCredits`] and changes nothing when
    /// `amount` exceeds the current balance.
    pub async fn debit(
        &self,
        user_id: &str,
        amount: i64,
        reason: &str,
        metadata: serde_json::Value,
    ) -> Result<DebitReceipt, WadiError> {
        if amount <= 0 {
            return Err(WadiError::InvalidInput(format!(
                "debit amount must be positive, got {amount}"
            )));
        }

        let uid = user_id.to_string();
        let reason_owned = reason.to_string();
        let metadata = metadata.to_string();
        let now = now_timestamp();

        let attempt = self
            .conn
            .call(move |conn| -> Result<DebitAttempt, rusqlite::Error> {
                let tx = conn.transaction()?;
                let changed = tx.execute(
                    "UPDATE credit_balances
                     SET balance = balance - ?1, updated_at = ?3
                     WHERE user_id = ?2 AND balance >= ?1",
                    params![amount, uid, now],
                )?;
                if changed == 0 {
                    let available: Option<i64> = tx
                        .query_row(
                            "SELECT balance FROM credit_balances WHERE user_id = ?1",
                            params![uid],
                            |row| row.get(0),
                        )
                        .optional()?;
                    // Dropping the transaction rolls it back; nothing was written.
                    return Ok(DebitAttempt::Insufficient {
                        available: available.unwrap_or(0),
                    });
                }
                let new_balance: i64 = tx.query_row(
                    "SELECT balance FROM credit_balances WHERE user_id = ?1",
                    params![uid],
                    |row| row.get(0),
                )?;
                tx.execute(
                    "INSERT INTO credit_history (user_id, kind, amount, reason, metadata, created_at)
                     VALUES (?1, 'debit', ?2, ?3, ?4, ?5)",
                    params![uid, amount, reason_owned, metadata, now],
                )?;
                let entry_id = tx.last_insert_rowid();
                tx.commit()?;
                Ok(DebitAttempt::Applied(DebitReceipt {
                    new_balance,
                    entry_id,
                }))
            })
            .await
            .map_err(map_tr_err)?;

        match attempt {
            DebitAttempt::Applied(receipt) => {
                metrics::counter!("wadi_credits_debited_total").increment(amount as u64);
                info!(
                    user_id = user_id,
                    amount,
                    reason = reason,
                    new_balance = receipt.new_balance,
                    "credits debited"
                );
                Ok(receipt)
            }
            DebitAttempt::Insufficient { available } => {
                debug!(
                    user_id = user_id,
                    required = amount,
                    available,
                    "debit rejected"
                );
                Err(WadiError::InsufficientCredits {
                    required: amount,
                    available,
                })
            }
        }
    }

    /// Add `amount` to the balance. Used for purchases, grants and refunds.
    ///
    /// Returns the new balance.
    pub async fn credit(
        &self,
        user_id: &str,
        amount: i64,
        reason: &str,
        metadata: serde_json::Value,
    ) -> Result<i64, WadiError> {
        if amount <= 0 {
            return Err(WadiError::InvalidInput(format!(
                "credit amount must be positive, got {amount}"
            )));
        }

        let uid = user_id.to_string();
        let reason_owned = reason.to_string();
        let metadata = metadata.to_string();
        let now = now_timestamp();

        let new_balance = self
            .conn
            .call(move |conn| -> Result<i64, rusqlite::Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO credit_balances (user_id, balance, updated_at)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT (user_id) DO UPDATE
                     SET balance = balance + excluded.balance, updated_at = excluded.updated_at",
                    params![uid, amount, now],
                )?;
                tx.execute(
                    "INSERT INTO credit_history (user_id, kind, amount, reason, metadata, created_at)
                     VALUES (?1, 'credit', ?2, ?3, ?4, ?5)",
                    params![uid, amount, reason_owned, metadata, now],
                )?;
                let balance: i64 = tx.query_row(
                    "SELECT balance FROM credit_balances WHERE user_id = ?1",
                    params![uid],
                    |row| row.get(0),
                )?;
                tx.commit()?;
                Ok(balance)
            })
            .await
            .map_err(map_tr_err)?;

        info!(
            user_id = user_id,
            amount,
            reason = reason,
            new_balance,
            "credits added"
        );
        Ok(new_balance)
    }

    /// Usage history for a user, newest first, at most `limit` entries.
    pub async fn history(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<CreditEntry>, WadiError> {
        let user_id = user_id.to_string();
        let limit = limit as i64;
        self.conn
            .call(move |conn| -> Result<Vec<CreditEntry>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, kind, amount, reason, metadata, created_at
                     FROM credit_history
                     WHERE user_id = ?1
                     ORDER BY id DESC
                     LIMIT ?2",
                )?;
                let rows = stmt.query_map(params![user_id, limit], |row| {
                    let kind: String = row.get(2)?;
                    let kind = CreditKind::from_str(&kind).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            2,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;
                    let metadata: String = row.get(5)?;
                    let metadata = serde_json::from_str(&metadata).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            5,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;
                    Ok(CreditEntry {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        kind,
                        amount: row.get(3)?,
                        reason: row.get(4)?,
                        metadata,
                        created_at: row.get(6)?,
                    })
                })?;
                rows.collect()
            })
            .await
            .map_err(map_tr_err)
    }
}
