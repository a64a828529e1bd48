//! Configuration loader
//!
//! Loading pipeline:
//! 1. Size check
//! 2. Environment variable expansion (pre-parse, on raw text)
//! 3. YAML parsing into [`GameConfig`]
//! 4. Validation
//! 5. Freeze with `Arc`

use std::path::Path;
use std::sync::Arc;

use crate::config::schema::GameConfig;
use crate::config::validation::Validator;
use crate::error::{ConfigError, ValidationIssue};

/// Default maximum configuration size in bytes.
pub const DEFAULT_MAX_CONFIG_SIZE: usize = 1024 * 1024;

/// Options for the configuration loader.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Maximum configuration file size in bytes.
    pub max_config_size: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            max_config_size: env_or("POSTERQUIZ_MAX_CONFIG_SIZE", DEFAULT_MAX_CONFIG_SIZE),
        }
    }
}

/// Result of loading a configuration.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded and validated configuration.
    pub config: Arc<GameConfig>,

    /// Warnings encountered during loading and validation.
    pub warnings: Vec<LoadWarning>,
}

/// Warning during configuration loading.
#[derive(Debug, Clone)]
pub struct LoadWarning {
    /// Warning message.
    pub message: String,

    /// Location where the warning occurred.
    pub location: Option<String>,
}

impl From<ValidationIssue> for LoadWarning {
    fn from(issue: ValidationIssue) -> Self {
        Self {
            message: issue.message,
            location: Some(issue.path),
        }
    }
}

/// Configuration loader.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: LoaderOptions,
}

impl ConfigLoader {
    /// Creates a loader with the given options.
    #[must_use]
    pub const fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Loads, validates and freezes a configuration file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file is missing, too large, fails
    /// to parse, or fails validation.
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        let size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        self.check_size(size)?;

        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        self.load_str(&raw, path)
    }

    /// Loads a configuration from YAML text; `source` labels errors.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the text is too large, fails to parse,
    /// or fails validation.
    pub fn load_str(&self, raw: &str, source: &Path) -> Result<LoadResult, ConfigError> {
        self.check_size(raw.len())?;

        // Handle UTF-8 BOM
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

        let mut warnings = Vec::new();
        let expanded = expand_env(raw, source, &mut warnings);

        let config: GameConfig =
            serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
                path: source.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;

        let result = Validator::new().validate(&config);
        if result.has_errors() {
            return Err(ConfigError::ValidationError {
                path: source.display().to_string(),
                errors: result.errors,
            });
        }
        warnings.extend(result.warnings.into_iter().map(LoadWarning::from));

        Ok(LoadResult {
            config: Arc::new(config),
            warnings,
        })
    }

    const fn check_size(&self, size: usize) -> Result<(), ConfigError> {
        if size > self.options.max_config_size {
            return Err(ConfigError::TooLarge {
                size,
                limit: self.options.max_config_size,
            });
        }
        Ok(())
    }
}

/// Expands environment variables in raw YAML text.
///
/// Supports:
/// - `${VAR}` - expand to value (empty string if unset, with a warning)
/// - `${VAR:-default}` - expand to default if unset
/// - `$$` - literal `$`
fn expand_env(raw: &str, source: &Path, warnings: &mut Vec<LoadWarning>) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix("$$") {
            out.push('$');
            rest = after;
            continue;
        }

        let Some(close) = tail.strip_prefix("${").and_then(|t| t.find('}')) else {
            out.push('$');
            rest = &tail[1..];
            continue;
        };

        let reference = &tail[2..2 + close];
        let (name, default) = reference
            .split_once(":-")
            .map_or((reference, None), |(n, d)| (n, Some(d)));

        match (std::env::var(name), default) {
            (Ok(value), _) => out.push_str(&value),
            (Err(_), Some(default)) => out.push_str(default),
            (Err(_), None) => warnings.push(LoadWarning {
                message: format!("environment variable '{name}' is not set, using empty string"),
                location: Some(source.display().to_string()),
            }),
        }
        rest = &tail[2 + close + 1..];
    }

    out.push_str(rest);
    out
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
