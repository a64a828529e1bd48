//! Logging initialization for `posterquiz`.
//!
//! Structured logging via `tracing` with human-readable and JSON output,
//! configurable verbosity, and an environment override via
//! `POSTERQUIZ_LOG_LEVEL`.

use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

use crate::cli::args::ColorChoice;

/// Environment variable that overrides the verbosity flags.
pub const LOG_LEVEL_ENV: &str = "POSTERQUIZ_LOG_LEVEL";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with optional ANSI colors.
    #[default]
    Human,
    /// Newline-delimited JSON for machine consumption.
    Json,
}

/// Maps a verbosity level to a tracing directive string.
///
/// - 0 → `"warn"`
/// - 1 → `"info"`
/// - 2 → `"debug"`
/// - 3+ → `"trace"` (saturates)
#[must_use]
pub const fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Builds the level filter.
///
/// A parseable `override_directives` (the value of `POSTERQUIZ_LOG_LEVEL`)
/// wins over `verbosity`; an unparseable one is reported and ignored.
#[must_use]
pub fn build_filter(override_directives: Option<&str>, verbosity: u8) -> EnvFilter {
    let fallback = verbosity_to_directive(verbosity);
    match override_directives.map(str::trim).filter(|d| !d.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|e| {
            eprintln!("ignoring {LOG_LEVEL_ENV}={directives:?}: {e}");
            EnvFilter::new(fallback)
        }),
        None => EnvFilter::new(fallback),
    }
}

/// Whether stderr output should carry ANSI colors.
#[must_use]
pub const fn use_ansi(color: ColorChoice, stderr_is_terminal: bool, no_color_set: bool) -> bool {
    match color {
        ColorChoice::Auto => stderr_is_terminal && !no_color_set,
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    }
}

/// Initializes the global tracing subscriber on stderr.
///
/// Uses `try_init()` so calling this more than once (e.g. in tests) is safe.
pub fn init_logging(format: LogFormat, verbosity: u8, color: ColorChoice) {
    let override_directives = std::env::var(LOG_LEVEL_ENV).ok();
    let filter = build_filter(override_directives.as_deref(), verbosity);
    let show_target = verbosity >= 2;
    let ansi = use_ansi(
        color,
        std::io::stderr().is_terminal(),
        std::env::var_os("NO_COLOR").is_some(),
    );

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(show_target)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Human => {
            let _ = builder.with_ansi(ansi).try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_default_is_human() {
        assert_eq!(LogFormat::default(), LogFormat::Human);
    }

    #[test]
    fn init_logging_does_not_panic() {
        // repeated try_init calls return Err and are ignored
        init_logging(LogFormat::Human, 0, ColorChoice::Auto);
        init_logging(LogFormat::Json, 3, ColorChoice::Never);
    }

    #[test]
    fn verbosity_mapping() {
        assert_eq!(verbosity_to_directive(0), "warn");
        assert_eq!(verbosity_to_directive(1), "info");
        assert_eq!(verbosity_to_directive(2), "debug");
        assert_eq!(verbosity_to_directive(255), "trace");
    }

    #[test]
    fn log_level_override_beats_verbosity() {
        let filter = build_filter(Some("posterquiz=trace"), 0);
        assert_eq!(filter.to_string(), "posterquiz=trace");
    }

    #[test]
    fn verbosity_applies_without_override() {
        assert_eq!(build_filter(None, 2).to_string(), "debug");
        assert_eq!(build_filter(Some("  "), 1).to_string(), "info");
    }

    #[test]
    fn unparseable_override_falls_back_to_verbosity() {
        assert_eq!(build_filter(Some("posterquiz=loud"), 1).to_string(), "info");
    }

    #[test]
    fn color_choice_resolution() {
        assert!(use_ansi(ColorChoice::Auto, true, false));
        assert!(!use_ansi(ColorChoice::Auto, true, true));
        assert!(!use_ansi(ColorChoice::Auto, false, false));
        assert!(use_ansi(ColorChoice::Always, false, true));
        assert!(!use_ansi(ColorChoice::Never, true, false));
    }
}
