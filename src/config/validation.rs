//! Configuration validation
//!
//! Semantic checks on a deserialized [`GameConfig`]. Validation collects
//! every issue rather than stopping at the first one.

use std::collections::HashSet;

use crate::config::schema::GameConfig;
use crate::error::{Severity, ValidationIssue};

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Configuration validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a configuration and returns every issue found.
    pub fn validate(&mut self, config: &GameConfig) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_services(config);
        self.validate_questions(config);
        self.validate_timings(config);

        if config.analytics.session_key.trim().is_empty() {
            self.error("analytics.session_key", "session key must not be empty");
        }

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    fn validate_services(&mut self, config: &GameConfig) {
        if config.services.is_empty() {
            self.error("services", "at least one service is required");
        }
        let mut seen = HashSet::new();
        for (i, service) in config.services.iter().enumerate() {
            if service.as_str().trim().is_empty() {
                self.error(&format!("services[{i}]"), "service id must not be empty");
            } else if !seen.insert(service) {
                self.error(
                    &format!("services[{i}]"),
                    &format!("duplicate service '{service}'"),
                );
            }
        }
    }

    fn validate_questions(&mut self, config: &GameConfig) {
        if config.questions.is_empty() {
            self.error("questions", "question bank is empty");
        }
        let mut answered = HashSet::new();
        for (i, question) in config.questions.iter().enumerate() {
            if question.prompt.trim().is_empty() {
                self.error(&format!("questions[{i}].prompt"), "prompt must not be empty");
            }
            if config.services.contains(&question.correct_answer) {
                answered.insert(&question.correct_answer);
            } else {
                self.error(
                    &format!("questions[{i}].correct_answer"),
                    &format!(
                        "'{}' is not one of the configured services",
                        question.correct_answer
                    ),
                );
            }
            if question.explanation.trim().is_empty() {
                self.warning(
                    &format!("questions[{i}].explanation"),
                    "explanation is empty",
                );
            }
        }
        for (i, service) in config.services.iter().enumerate() {
            if !config.questions.is_empty() && !answered.contains(service) {
                self.warning(
                    &format!("services[{i}]"),
                    &format!("service '{service}' is never a correct answer"),
                );
            }
        }
    }

    fn validate_timings(&mut self, config: &GameConfig) {
        let t = &config.timings;
        if t.message_duration > t.advance_delay + t.next_question_delay {
            self.warning(
                "timings.message_duration",
                "feedback message outlives the transition to the next question",
            );
        }
        if config.marker.debounce >= t.advance_delay {
            self.warning(
                "marker.debounce",
                "debounce window is as long as the answer transition",
            );
        }
    }

    fn error(&mut self, path: &str, message: &str) {
        self.errors.push(issue(path, message, Severity::Error));
    }

    fn warning(&mut self, path: &str, message: &str) {
        self.warnings.push(issue(path, message, Severity::Warning));
    }
}

fn issue(path: &str, message: &str, severity: Severity) -> ValidationIssue {
    ValidationIssue {
        path: path.to_owned(),
        message: message.to_owned(),
        severity,
    }
}
