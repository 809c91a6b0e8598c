// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the WADI generation service.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and typed operations for sessions
//! and runs. The credit and memory tables are created here and queried by
//! their owning crates through [`Database::connection`].

pub mod database;
pub mod migrations;
pub mod queries;

pub use database::{map_tr_err, now_timestamp, Database};
