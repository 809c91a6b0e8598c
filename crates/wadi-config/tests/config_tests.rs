// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the WADI configuration system.

use wadi_config::diagnostic::ConfigError;
use wadi_config::model::WadiConfig;
use wadi_config::{load_and_validate_str, load_config_from_str};

#[test]
fn valid_toml_deserializes_into_wadi_config() {
    let toml = r#"
[service]
name = "wadi-test"
log_level = "debug"

[gateway]
host = "0.0.0.0"
port = 8080
heartbeat_interval_secs = 10
auth_timeout_secs = 5

[gateway.tokens]
"tok-alice" = "alice"
"tok-bob" = "bob"

[provider]
backend = "groq"
api_key = "gsk-123"
max_tokens = 512
max_retries = 2

[embedding]
api_key = "sk-emb"
model = "text-embedding-3-large"

[storage]
database_path = "/tmp/wadi.db"
wal_mode = false

[memory]
enabled = false
context_max_tokens = 200

[prometheus]
enabled = false
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.service.name, "wadi-test");
    assert_eq!(config.gateway.port, 8080);
    assert_eq!(config.gateway.tokens.get("tok-alice").map(String::as_str), Some("alice"));
    assert_eq!(config.gateway.auth_timeout_secs, 5);
    assert_eq!(config.provider.backend, "groq");
    assert_eq!(config.provider.api_key.as_deref(), Some("gsk-123"));
    assert_eq!(config.provider.max_retries, 2);
    assert_eq!(config.embedding.model, "text-embedding-3-large");
    assert_eq!(config.storage.database_path, "/tmp/wadi.db");
    assert!(!config.storage.wal_mode);
    assert!(!config.memory.enabled);
    assert!(config.memory.record_runs);
    assert_eq!(config.memory.context_max_tokens, 200);
    assert!(!config.prometheus.enabled);
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML should deserialize");
    let defaults = WadiConfig::default();
    assert_eq!(config.gateway.port, defaults.gateway.port);
    assert_eq!(config.gateway.heartbeat_interval_secs, 30);
    assert_eq!(config.provider.backend, "openai");
    assert_eq!(config.embedding.model, "text-embedding-3-small");
    assert!(config.memory.enabled);
}

#[test]
fn unknown_field_produces_suggestion() {
    let toml = r#"
[gateway]
prot = 3000
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "prot");
            assert_eq!(suggestion.as_deref(), Some("port"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_section_is_rejected() {
    let errors = load_and_validate_str("[telegram]\nbot_token = \"x\"\n").unwrap_err();
    assert!(matches!(errors[0], ConfigError::UnknownKey { .. }));
}

#[test]
fn wrong_type_produces_invalid_type() {
    let errors = load_and_validate_str("[gateway]\nport = \"eighty\"\n").unwrap_err();
    assert!(matches!(errors[0], ConfigError::InvalidType { .. }));
}

#[test]
fn validation_errors_surface_from_str_loader() {
    let errors = load_and_validate_str("[provider]\nbackend = \"anthropic\"\n").unwrap_err();
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}

#[test]
fn debug_output_redacts_secrets() {
    let config = load_config_from_str(
        "[provider]\napi_key = \"sk-secret\"\n[gateway.tokens]\n\"tok-secret\" = \"u1\"\n",
    )
    .unwrap();
    let debug = format!("{config:?}");
    assert!(!debug.contains("sk-secret"));
    assert!(!debug.contains("tok-secret"));
}
