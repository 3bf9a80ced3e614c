//! No-mock configuration tests.
//!
//! Covers:
//! - Loading JSON and YAML files from disk
//! - Validation failures surfaced with stable codes
//! - A full session built from config redacting a log end to end

use scrub_config::{ScrubConfig, ValidationError};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const YAML_CONFIG: &str = r#"
schema_version: "1.0.0"
pseudonymization:
  mode: counter
  format: custom
  custom_prefix: "user-"
  scope:
    ports: false
  replacements:
    root: superuser
discovery:
  mode: two_pass
  rules:
    - name: home
      kind: username
      pattern: "/home/([a-z]+)"
      allowlist: [shared]
static_patterns:
  ipv4: '\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b'
"#;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write config");
    path
}

#[test]
fn test_load_yaml_file() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "scrub.yaml", YAML_CONFIG);
    let config = ScrubConfig::from_file(&path).unwrap();
    config.validate().unwrap();
    assert!(!config.pseudonymization.scope.ports);
    assert!(config.pseudonymization.scope.strings);
    assert_eq!(config.discovery.rules[0].allowlist, vec!["shared"]);
}

#[test]
fn test_load_json_file() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "scrub.json",
        r#"{"pseudonymization": {"mode": "realistic", "patterns": {"ip": "10\\.0\\.[0-9]{1,3}\\.[0-9]{1,3}"}}}"#,
    );
    let config = ScrubConfig::from_file(&path).unwrap();
    config.validate().unwrap();
    let p = config.build_pseudonymizer().unwrap();
    assert!(p.pattern_generator().has_pattern("ip"));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = ScrubConfig::from_file(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ValidationError::IoError(_)));
    assert_eq!(err.code(), 60);
}

#[test]
fn test_yaml_parsed_as_json_fails() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "scrub.json", YAML_CONFIG);
    let err = ScrubConfig::from_file(&path).unwrap_err();
    assert_eq!(err.code(), 61);
}

#[test]
fn test_session_from_config_redacts_log() {
    let config = ScrubConfig::parse_yaml(YAML_CONFIG).unwrap();
    let mut session = config.build_session().unwrap();
    let log = [
        "alice opened a session from 192.168.1.20",
        "cwd=/home/alice",
        "cwd=/home/shared",
        "root logged in",
        "alice logged out",
    ];
    let out = session
        .run(|| log.iter().map(|l| l.to_string()).collect::<Vec<_>>())
        .unwrap();

    assert_eq!(out[0], "user-1 opened a session from user-2");
    assert_eq!(out[1], "cwd=/home/user-1");
    assert_eq!(out[2], "cwd=/home/shared");
    assert_eq!(out[3], "root logged in");
    assert_eq!(out[4], "user-1 logged out");

    let p = session.pseudonymizer_mut();
    assert_eq!(p.pseudonymize(Some("root"), "***"), "superuser");
    assert_eq!(p.pseudonymize_port(22), 22);
}

#[test]
fn test_invalid_rule_rejected_before_build() {
    let config = ScrubConfig::parse_json(
        r#"{"discovery": {"rules": [{"name": "both", "pattern": "x", "property_key": "y"}]}}"#,
    )
    .unwrap();
    let err = config.build_session().unwrap_err();
    assert!(matches!(err, ValidationError::SemanticError(_)));
}
