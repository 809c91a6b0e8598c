// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `wadi credits`: operator access to the ledger.

use wadi_config::WadiConfig;
use wadi_core::{CreditEntry, WadiError};
use wadi_credits::CreditLedger;
use wadi_storage::Database;

async fn open_ledger(config: &WadiConfig) -> Result<CreditLedger, WadiError> {
    let db = Database::open(&config.storage.database_path, config.storage.wal_mode).await?;
    Ok(CreditLedger::from_database(&db))
}

pub async fn grant(
    config: &WadiConfig,
    user_id: &str,
    amount: i64,
    reason: &str,
) -> Result<(), WadiError> {
    let ledger = open_ledger(config).await?;
    let balance = ledger
        .credit(user_id, amount, reason, serde_json::json!({ "source": "cli" }))
        .await?;
    println!("granted {amount} credits to {user_id}; balance is now {balance}");
    Ok(())
}

pub async fn balance(config: &WadiConfig, user_id: &str) -> Result<(), WadiError> {
    let ledger = open_ledger(config).await?;
    let balance = ledger.get_balance(user_id).await?;
    println!("{user_id}: {balance}");
    Ok(())
}

pub async fn history(config: &WadiConfig, user_id: &str, limit: usize) -> Result<(), WadiError> {
    let ledger = open_ledger(config).await?;
    let entries = ledger.history(user_id, limit).await?;
    if entries.is_empty() {
        println!("no ledger entries for {user_id}");
        return Ok(());
    }
    for entry in &entries {
        println!("{}", format_entry(entry));
    }
    Ok(())
}

fn format_entry(entry: &CreditEntry) -> String {
    format!(
        "{}  {:>+6}  {}",
        entry.created_at,
        entry.signed_amount(),
        entry.reason
    )
}
