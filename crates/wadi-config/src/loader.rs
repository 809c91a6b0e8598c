// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./wadi.toml` > `~/.config/wadi/wadi.toml` > `/etc/wadi/wadi.toml`
//! with environment variable overrides via `WADI_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::WadiConfig;

/// Top-level sections addressable from the environment.
const SECTIONS: &[&str] = &[
    "service",
    "gateway",
    "provider",
    "embedding",
    "storage",
    "memory",
    "prometheus",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/wadi/wadi.toml` (system-wide)
/// 3. `~/.config/wadi/wadi.toml` (user XDG config)
/// 4. `./wadi.toml` (local directory)
/// 5. `WADI_*` environment variables
pub fn load_config() -> Result<WadiConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<WadiConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WadiConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<WadiConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WadiConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(WadiConfig::default()))
        .merge(Toml::file("/etc/wadi/wadi.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("wadi/wadi.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("wadi.toml"))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so that keys containing
/// underscores survive: `WADI_GATEWAY_AUTH_TIMEOUT_SECS` maps to
/// `gateway.auth_timeout_secs`.
fn env_provider() -> Env {
    Env::prefixed("WADI_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
