// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for sessions and runs.

pub mod runs;
pub mod sessions;
