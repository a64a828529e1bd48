//! `replay` command
//!
//! Runs a scripted session under virtual time and prints the resulting UI
//! intents; analytics records go to stdout or `--events-file` as JSONL.

use std::sync::Arc;

use chrono::Utc;

use crate::cli::args::ReplayArgs;
use crate::cli::commands::load_config;
use crate::clock::{Clock, ManualClock};
use crate::error::QuizError;
use crate::observability::events::{JsonlSink, LogSink, SessionEventLogger};
use crate::script::{self, Script};
use crate::session::GameSession;
use crate::session_id::MemoryStore;
use crate::ui::ConsoleUi;

/// Replay an event script.
///
/// # Errors
///
/// Returns a config or script error if either file is invalid, or an I/O
/// error if the events file cannot be created.
pub fn run(args: &ReplayArgs) -> Result<(), QuizError> {
    let config = load_config(args.config.as_deref())?;
    let script = Script::load(&args.script)?;
    script.validate(&config.bank())?;
    tracing::info!(
        script = %args.script.display(),
        steps = script.steps.len(),
        "replaying script"
    );

    let clock = ManualClock::new(Utc::now());
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());

    let sink: Box<dyn LogSink> = match args.events_file {
        Some(ref path) => Box::new(JsonlSink::from_file(path)?),
        None => Box::new(JsonlSink::stdout()),
    };
    let logger = SessionEventLogger::new(Arc::clone(&shared), sink);
    let ui = ConsoleUi::stdout(Arc::clone(&shared));

    let mut session = GameSession::new(&config, shared, &MemoryStore::new(), logger, ui);
    script::replay(&script, &mut session, &clock);

    let state = session.state();
    println!(
        "{}: score {}/{} (question {})",
        state.phase,
        state.score,
        config.questions.len(),
        state.current_question_index
    );
    Ok(())
}
