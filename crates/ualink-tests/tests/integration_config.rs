// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Config Integration Tests
//!
//! Tests for session configuration loading:
//!
//! - File loading in YAML, TOML and JSON
//! - Environment placeholders
//! - Validation of reconnection and keep-alive limits
//! - Building a session from a loaded file

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use ualink_session::config::ConfigFormat;
use ualink_session::{
    ClientSession, ConfigurationError, RepairFailurePolicy, SessionConfig, UaError, UserIdentity,
};
use ualink_tests::prelude::*;

const YAML_CONFIG: &str = r#"
endpoint: "opc.tcp://plc-07:4840"
session_name: "line 7"
session_timeout: "90s"
request_timeout: "5s"
locale_ids: ["en-US", "de-DE"]
reconnection:
  max_restore_attempts: 3
  restore_wait_timeout: "20s"
  on_repair_failure: fail_all
keep_alive:
  enabled: false
"#;

#[test]
fn test_config_yaml_file() {
    init_test_logging();
    let dir = temp_test_dir("ualink_config");
    let path = dir.path().join("session.yaml");
    fs::write(&path, YAML_CONFIG).unwrap();

    let config = SessionConfig::from_file(&path).assert_ok();
    assert_eq!(config.endpoint, "opc.tcp://plc-07:4840");
    assert_eq!(config.session_name, "line 7");
    assert_eq!(config.session_timeout, Duration::from_secs(90));
    assert_eq!(config.request_timeout, Duration::from_secs(5));
    assert_eq!(config.locale_ids, vec!["en-US", "de-DE"]);
    assert_eq!(config.reconnection.max_restore_attempts, 3);
    assert_eq!(config.reconnection.restore_wait_timeout, Duration::from_secs(20));
    assert_eq!(
        config.reconnection.on_repair_failure,
        RepairFailurePolicy::FailAll
    );
    assert!(!config.keep_alive.enabled);
    assert_eq!(config.user_identity, UserIdentity::Anonymous);
}

#[test]
fn test_config_toml_file() {
    init_test_logging();
    let dir = temp_test_dir("ualink_config");
    let path = dir.path().join("session.toml");
    fs::write(
        &path,
        r#"
endpoint = "opc.tcp://localhost:4840"

[user_identity]
type = "issued_token"
token = "dG9rZW4="

[keep_alive]
interval = "2s"
failure_threshold = 4
"#,
    )
    .unwrap();

    let config = SessionConfig::from_file(&path).assert_ok();
    assert_eq!(config.user_identity.type_name(), "IssuedToken");
    assert_eq!(config.keep_alive.interval, Duration::from_secs(2));
    assert_eq!(config.keep_alive.failure_threshold, 4);
    assert_eq!(config.reconnection.on_repair_failure, RepairFailurePolicy::Retain);
}

#[test]
fn test_config_json_file() {
    init_test_logging();
    let dir = temp_test_dir("ualink_config");
    let path = dir.path().join("session.json");
    fs::write(
        &path,
        r#"{"endpoint": "opc.tcp://localhost:4840", "reconnection": {"max_restore_attempts": 1}}"#,
    )
    .unwrap();

    let config = SessionConfig::from_file(&path).assert_ok();
    assert_eq!(config.reconnection.max_restore_attempts, 1);
    assert_eq!(config.session_timeout, Duration::from_secs(60));
}

#[test]
fn test_config_env_placeholder() {
    init_test_logging();
    let var = format!("UALINK_{}", unique_test_id().to_uppercase());
    std::env::set_var(&var, "opc.tcp://from-env:4840");

    let content = format!("endpoint: \"${{{}}}\"\n", var);
    let config = SessionConfig::from_str_with_format(&content, ConfigFormat::Yaml).assert_ok();
    assert_eq!(config.endpoint, "opc.tcp://from-env:4840");

    std::env::remove_var(&var);
}

#[test]
fn test_config_validation_errors() {
    init_test_logging();
    let zero_attempts = r#"
endpoint: "opc.tcp://localhost:4840"
reconnection:
  max_restore_attempts: 0
"#;
    let error = SessionConfig::from_str_with_format(zero_attempts, ConfigFormat::Yaml).assert_err();
    assert!(matches!(
        error,
        UaError::Configuration(ConfigurationError::InvalidValue { .. })
    ));

    let bad_endpoint = r#"{"endpoint": "tcp://nope"}"#;
    assert!(SessionConfig::from_str_with_format(bad_endpoint, ConfigFormat::Json).is_err());

    let dir = temp_test_dir("ualink_config");
    let missing = dir.path().join("absent.yaml");
    let error = SessionConfig::from_file(&missing).assert_err();
    assert!(matches!(
        error,
        UaError::Configuration(ConfigurationError::FileRead { .. })
    ));
}

#[tokio::test]
async fn test_config_loaded_file_builds_session() {
    init_test_logging();
    let dir = temp_test_dir("ualink_config");
    let path = dir.path().join("session.yml");
    fs::write(&path, YAML_CONFIG).unwrap();
    let config = SessionConfig::from_file(&path).assert_ok();

    let owner = MockOwner::shared();
    let identity = ualink_session::SessionIdentity {
        revised_timeout: Duration::ZERO,
        ..IdentityFixtures::initial()
    };
    let session = ClientSession::builder(Arc::new(MockChannel::echoing()), owner.clone(), identity)
        .config(config)
        .build()
        .assert_ok();

    // An identity without a revised lifetime falls back to the requested one.
    assert_eq!(session.timeout(), Duration::from_secs(90));
    assert_eq!(session.config().session_name, "line 7");
    session.close(true).await.assert_ok();
}
