//! Error types for `posterquiz`
//!
//! Gameplay itself never fails: out-of-phase events are dropped and
//! analytics failures are swallowed. Errors only surface at the edges of
//! the crate (configuration, scripts, sinks, process I/O) and map onto
//! process exit codes.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `posterquiz` CLI operations.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Replay script error (bad step, unknown service)
    pub const SCRIPT_ERROR: i32 = 4;

    /// Usage error (unknown command, invalid or missing arguments)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `posterquiz` operations.
#[derive(Debug, Error)]
pub enum QuizError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Replay script error
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl QuizError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Json(_) | Self::Yaml(_) => ExitCode::CONFIG_ERROR,
            Self::Script(_) => ExitCode::SCRIPT_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Game configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Configuration validation failed
    #[error("validation failed for {path}: {}", summarize(errors))]
    ValidationError {
        /// Path (or label) of the configuration
        path: String,
        /// List of validation issues found
        errors: Vec<ValidationIssue>,
    },

    /// Referenced configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Configuration file exceeds the size limit
    #[error("configuration too large: {size} bytes (limit: {limit})")]
    TooLarge {
        /// Actual file size in bytes
        size: usize,
        /// Configured limit in bytes
        limit: usize,
    },
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found during configuration validation.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the problematic field (e.g., "questions[2].correct_answer")
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", prefix, self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Prevents the configuration from being used
    Error,
    /// Reported, but the configuration still loads
    Warning,
}

// ============================================================================
// Script Errors
// ============================================================================

/// Errors raised while loading or replaying an event script.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Script file could not be parsed
    #[error("invalid script {path}: {message}")]
    Parse {
        /// Path to the script
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// A step's timestamp went backwards
    #[error("step {index} at {at:?} is earlier than the previous step")]
    OutOfOrder {
        /// Zero-based step index
        index: usize,
        /// Offending timestamp
        at: std::time::Duration,
    },

    /// A step selects a service outside the configured set
    #[error("step {index} selects unknown service '{service}'")]
    UnknownService {
        /// Zero-based step index
        index: usize,
        /// The unknown service id
        service: String,
    },
}

// ============================================================================
// Sink Errors
// ============================================================================

/// Failure reported by an analytics sink.
///
/// Never propagated into gameplay; the logger swallows it.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink could not serialize the record
    #[error("record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The sink's writer failed
    #[error("sink write failed: {0}")]
    Io(#[from] std::io::Error),

    /// The sink refused the record
    #[error("sink rejected record: {0}")]
    Rejected(String),
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `posterquiz` operations.
pub type Result<T> = std::result::Result<T, QuizError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::SUCCESS, 0);
        assert_eq!(ExitCode::CONFIG_ERROR, 2);
        assert_eq!(ExitCode::IO_ERROR, 3);
        assert_eq!(ExitCode::SCRIPT_ERROR, 4);
        assert_eq!(ExitCode::USAGE_ERROR, 64);
        assert_eq!(ExitCode::INTERRUPTED, 130);
        assert_eq!(ExitCode::TERMINATED, 143);
    }

    #[test]
    fn test_config_error_exit_code() {
        let err: QuizError = ConfigError::MissingFile {
            path: PathBuf::from("/test"),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::CONFIG_ERROR);
    }

    #[test]
    fn test_script_error_exit_code() {
        let err: QuizError = ScriptError::UnknownService {
            index: 2,
            service: "rds".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::SCRIPT_ERROR);
        assert!(err.to_string().contains("rds"));
    }

    #[test]
    fn test_io_error_exit_code() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err: QuizError = io_err.into();
        assert_eq!(err.exit_code(), ExitCode::IO_ERROR);
    }

    #[test]
    fn test_validation_error_lists_only_errors() {
        let err = ConfigError::ValidationError {
            path: "quiz.yaml".to_string(),
            errors: vec![
                ValidationIssue {
                    path: "questions".to_string(),
                    message: "question bank is empty".to_string(),
                    severity: Severity::Error,
                },
                ValidationIssue {
                    path: "questions[0].explanation".to_string(),
                    message: "explanation is empty".to_string(),
                    severity: Severity::Warning,
                },
            ],
        };
        let text = err.to_string();
        assert!(text.contains("question bank is empty"));
        assert!(!text.contains("explanation is empty"));
    }

    #[test]
    fn test_validation_issue_display() {
        let issue = ValidationIssue {
            path: "services[1]".to_string(),
            message: "duplicate service".to_string(),
            severity: Severity::Warning,
        };
        assert_eq!(issue.to_string(), "warning: duplicate service at services[1]");
    }
}
