//! `validate` command
//!
//! Loads a configuration file and reports its warnings without running a
//! session.

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::loader::ConfigLoader;
use crate::error::{ConfigError, QuizError, Severity, ValidationIssue};

/// Validate a configuration file.
///
/// # Errors
///
/// Returns a config error if the file is missing or invalid, or if
/// `--strict` is set and the file produced warnings.
pub fn run(args: &ValidateArgs) -> Result<(), QuizError> {
    let path = &args.config;
    tracing::info!(file = %path.display(), "validating configuration");
    let load_result = ConfigLoader::default().load(path)?;

    if args.strict && !load_result.warnings.is_empty() {
        let errors = load_result
            .warnings
            .iter()
            .map(|w| ValidationIssue {
                path: w.location.clone().unwrap_or_default(),
                message: w.message.clone(),
                severity: Severity::Error,
            })
            .collect();
        return Err(ConfigError::ValidationError {
            path: path.display().to_string(),
            errors,
        }
        .into());
    }

    let config = &load_result.config;
    match args.format {
        OutputFormat::Human => {
            for warning in &load_result.warnings {
                println!(
                    "warning: {} at {}",
                    warning.message,
                    warning.location.as_deref().unwrap_or("<unknown>")
                );
            }
            println!(
                "{}: valid ({} questions, {} services)",
                path.display(),
                config.questions.len(),
                config.services.len()
            );
        }
        OutputFormat::Json => {
            let warnings: Vec<_> = load_result
                .warnings
                .iter()
                .map(|w| serde_json::json!({ "message": w.message, "location": w.location }))
                .collect();
            let report = serde_json::json!({
                "file": path.display().to_string(),
                "valid": true,
                "questions": config.questions.len(),
                "services": config.services.len(),
                "warnings": warnings,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
