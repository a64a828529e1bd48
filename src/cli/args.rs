//! CLI argument definitions
//!
//! All Clap derive structs for `posterquiz` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::observability::LogFormat;

// ============================================================================
// Root CLI
// ============================================================================

/// Trivia session engine for AR marker poster games.
#[derive(Parser, Debug)]
#[command(name = "posterquiz", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "POSTERQUIZ_COLOR")]
    pub color: ColorChoice,

    /// Diagnostic log format.
    #[arg(long, default_value = "human", global = true, env = "POSTERQUIZ_LOG_FORMAT")]
    pub log_format: LogFormat,
}

// ============================================================================
// Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a timestamped event script under virtual time.
    Replay(ReplayArgs),

    /// Run a live session, reading commands from stdin.
    Play(PlayArgs),

    /// Validate a game configuration file.
    Validate(ValidateArgs),

    /// Display version information.
    Version(VersionArgs),
}

/// Arguments for `replay`.
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Path to the YAML event script.
    #[arg(short, long)]
    pub script: PathBuf,

    /// Path to the game configuration (built-in game if omitted).
    #[arg(short, long, env = "POSTERQUIZ_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write analytics records as JSONL to this file instead of stdout.
    #[arg(long)]
    pub events_file: Option<PathBuf>,
}

/// Arguments for `play`.
#[derive(Args, Debug)]
pub struct PlayArgs {
    /// Path to the game configuration (built-in game if omitted).
    #[arg(short, long, env = "POSTERQUIZ_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write analytics records as JSONL to this file instead of the log.
    #[arg(long)]
    pub events_file: Option<PathBuf>,

    /// Directory holding the persisted session id (process memory if omitted).
    #[arg(long, env = "POSTERQUIZ_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Expose Prometheus metrics on this port.
    #[arg(long, env = "POSTERQUIZ_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration file to validate.
    #[arg(short, long)]
    pub config: PathBuf,

    /// Treat warnings as errors.
    #[arg(long)]
    pub strict: bool,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `version`.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

// ============================================================================
// Tests
// ============================================================================
