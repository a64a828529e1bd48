//! `play` command
//!
//! Runs a live session on the tokio runtime. Commands are read from stdin,
//! one per line: `loaded`, `found`, `lost`, `select <service>`, `restart`,
//! `selfie`, `saved`, `quit`.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::cli::args::PlayArgs;
use crate::cli::commands::load_config;
use crate::clock::{Clock, TokioClock};
use crate::error::QuizError;
use crate::observability::events::{JsonlSink, LogSink, SessionEventLogger, TracingSink};
use crate::session::{GameSession, InputEvent};
use crate::session_id::{FileStore, MemoryStore, SessionStore};
use crate::ui::ConsoleUi;

/// Run a live session until `quit`, end of input, or cancellation.
///
/// # Errors
///
/// Returns a config error if the configuration is invalid, or an I/O error
/// if the events file or metrics listener cannot be set up.
pub async fn run(args: &PlayArgs, cancel: CancellationToken) -> Result<(), QuizError> {
    if let Some(port) = args.metrics_port {
        crate::observability::init_metrics(Some(port))?;
        tracing::info!(port, "Prometheus metrics endpoint started");
    }

    let config = load_config(args.config.as_deref())?;

    let clock = TokioClock::start();
    let shared: Arc<dyn Clock> = Arc::new(clock);

    let sink: Box<dyn LogSink> = match args.events_file {
        Some(ref path) => Box::new(JsonlSink::from_file(path)?),
        None => Box::new(TracingSink),
    };
    let (err_tx, mut err_rx) = mpsc::unbounded_channel();
    let logger = SessionEventLogger::new(Arc::clone(&shared), sink).with_error_channel(err_tx);

    let store: Box<dyn SessionStore> = match args.state_dir {
        Some(ref dir) => Box::new(FileStore::new(dir)),
        None => Box::new(MemoryStore::new()),
    };
    let ui = ConsoleUi::stdout(Arc::clone(&shared));
    let session = GameSession::new(&config, shared, store.as_ref(), logger, ui);

    let (tx, rx) = mpsc::unbounded_channel();
    let reader = tokio::spawn(read_commands(tx, cancel.clone()));

    let session = session.run(clock, rx, cancel.clone()).await;
    reader.abort();

    if let Ok(err) = err_rx.try_recv() {
        tracing::warn!(error = %err, "analytics forwarding failed during the session");
    }
    let state = session.state();
    println!(
        "{}: score {}/{}",
        state.phase,
        state.score,
        config.questions.len()
    );
    Ok(())
}

/// Forwards parsed stdin commands until `quit` or end of input.
async fn read_commands(tx: mpsc::UnboundedSender<InputEvent>, cancel: CancellationToken) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            () = cancel.cancelled() => break,
            line = lines.next_line() => line,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stdin");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == "quit" {
            break;
        }
        match line.parse::<InputEvent>() {
            Ok(event) => {
                if tx.send(event).is_err() {
                    break;
                }
            }
            Err(message) => eprintln!("{message}"),
        }
    }
}
