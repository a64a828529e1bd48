//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod play;
pub mod replay;
pub mod validate;
pub mod version;

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cli::args::{Cli, Commands};
use crate::config::loader::ConfigLoader;
use crate::config::schema::GameConfig;
use crate::error::QuizError;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli, cancel: CancellationToken) -> Result<(), QuizError> {
    match cli.command {
        Commands::Replay(args) => replay::run(&args),
        Commands::Play(args) => play::run(&args, cancel).await,
        Commands::Validate(args) => validate::run(&args),
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}

/// Loads the configuration at `path`, or the built-in game when `None`.
///
/// Load warnings are logged.
///
/// # Errors
///
/// Returns a config error if the file is missing or invalid.
pub fn load_config(path: Option<&Path>) -> Result<Arc<GameConfig>, QuizError> {
    let Some(path) = path else {
        tracing::info!("using built-in game configuration");
        return Ok(Arc::new(GameConfig::default()));
    };

    tracing::info!(config = %path.display(), "loading configuration");
    let load_result = ConfigLoader::default().load(path)?;
    for warning in &load_result.warnings {
        tracing::warn!(
            location = warning.location.as_deref().unwrap_or("<unknown>"),
            "{}",
            warning.message
        );
    }
    Ok(load_result.config)
}
