mod common;

use std::path::PathBuf;

use common::PosterQuizProcess;
use posterquiz::config::{ConfigLoader, LoaderOptions};
use posterquiz::error::ConfigError;

fn write_config(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, body).unwrap();
    path
}

/// Empty YAML file should be rejected with a parse error.
#[test]
fn empty_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "empty.yaml", "");
    let err = ConfigLoader::default().load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }), "{err}");
}

/// Binary content should be rejected (not a valid YAML file).
#[test]
fn binary_content_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("binary.yaml");
    std::fs::write(&path, b"\x00\x01\x02\x03\xff\xfe\xfd\xfc").unwrap();

    let output = PosterQuizProcess::spawn_command(&["validate", "--config", path.to_str().unwrap()]);
    assert!(
        !output.status.success(),
        "binary content should fail validation"
    );
}

/// YAML syntax errors carry the line they occurred on.
#[test]
fn yaml_syntax_error_reports_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        "broken.yaml",
        "services: [s3]\nquestions:\n  - prompt: [unclosed\n",
    );
    match ConfigLoader::default().load(&path).unwrap_err() {
        ConfigError::ParseError { line, .. } => assert!(line.is_some()),
        other => panic!("expected parse error, got {other}"),
    }
}

/// Unknown top-level keys are rejected rather than silently ignored.
#[test]
fn unknown_field_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        "typo.yaml",
        "services: [s3]\nquestion:\n  - prompt: Storage?\n    correct_answer: s3\n",
    );
    let err = ConfigLoader::default().load(&path).unwrap_err();
    assert!(err.to_string().contains("question"), "{err}");
}

/// Every validation error is reported, not just the first.
#[test]
fn all_errors_collected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        "bad.yaml",
        r#"
services: [s3, s3, ""]
questions:
  - prompt: ""
    correct_answer: ecs
"#,
    );
    match ConfigLoader::default().load(&path).unwrap_err() {
        ConfigError::ValidationError { errors, .. } => {
            let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
            assert!(paths.contains(&"services[1]"), "{paths:?}");
            assert!(paths.contains(&"services[2]"), "{paths:?}");
            assert!(paths.contains(&"questions[0].prompt"), "{paths:?}");
            assert!(paths.contains(&"questions[0].correct_answer"), "{paths:?}");
        }
        other => panic!("expected validation error, got {other}"),
    }
}

/// Empty explanations and unused services are warnings only.
#[test]
fn soft_issues_are_warnings() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        "soft.yaml",
        "services: [s3, sqs]\nquestions:\n  - prompt: Storage?\n    correct_answer: s3\n",
    );
    let loaded = ConfigLoader::default().load(&path).unwrap();
    let locations: Vec<_> = loaded
        .warnings
        .iter()
        .filter_map(|w| w.location.as_deref())
        .collect();
    assert_eq!(locations, vec!["questions[0].explanation", "services[1]"]);
}

/// Files over the size limit are refused before parsing.
#[test]
fn oversized_config_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "big.yaml", &"# padding\n".repeat(100));
    let loader = ConfigLoader::new(LoaderOptions {
        max_config_size: 64,
    });
    let err = loader.load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::TooLarge { limit: 64, .. }), "{err}");
}

/// Environment references are expanded before parsing.
#[test]
fn env_defaults_expand() {
    let loaded = ConfigLoader::default()
        .load(&PosterQuizProcess::fixture_path("quiz.yaml"))
        .unwrap();
    assert_eq!(loaded.config.analytics.client.as_deref(), Some("kiosk-01"));
}
