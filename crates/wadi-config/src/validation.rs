// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::WadiConfig;

/// Backend families the provider client understands.
pub const KNOWN_BACKENDS: &[&str] = &["openai", "groq"];

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every error rather than failing fast.
pub fn validate_config(config: &WadiConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "service.log_level `{}` must be one of: {}",
                config.service.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("gateway.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.gateway.port == 0 {
        errors.push(ConfigError::Validation {
            message: "gateway.port must be non-zero".to_string(),
        });
    }

    if config.gateway.heartbeat_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "gateway.heartbeat_interval_secs must be at least 1".to_string(),
        });
    }

    if config.gateway.auth_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "gateway.auth_timeout_secs must be at least 1".to_string(),
        });
    }

    for (token, user_id) in &config.gateway.tokens {
        if token.trim().is_empty() || user_id.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: "gateway.tokens entries must have a non-empty token and user id"
                    .to_string(),
            });
            break;
        }
    }

    if !KNOWN_BACKENDS.contains(&config.provider.backend.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "provider.backend `{}` must be one of: {}",
                config.provider.backend,
                KNOWN_BACKENDS.join(", ")
            ),
        });
    }

    if config.provider.max_tokens == 0 {
        errors.push(ConfigError::Validation {
            message: "provider.max_tokens must be greater than zero".to_string(),
        });
    }

    if config.provider.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "provider.timeout_secs must be greater than zero".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
