//! Metrics collection for `posterquiz`.
//!
//! Prometheus-compatible counters for game flow. Every recording function
//! is a silent no-op until [`init_metrics`] installs a recorder.

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::QuizError;
use crate::game::Phase;

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Label used for selections outside the configured service set.
pub const UNKNOWN_LABEL: &str = "__unknown__";

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`.  When `None`, the recorder is installed without
/// an HTTP endpoint.
///
/// # Errors
///
/// Returns `QuizError::Io` if the recorder or HTTP listener
/// cannot be installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), QuizError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| QuizError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

/// Registers metric descriptions with the global recorder.
fn describe_metrics() {
    describe_counter!(
        "posterquiz_games_started_total",
        "Sessions started by a first marker detection"
    );
    describe_counter!(
        "posterquiz_answers_total",
        "Answers accepted, by selected service and correctness"
    );
    describe_counter!(
        "posterquiz_games_completed_total",
        "Sessions that reached the completion screen"
    );
    describe_counter!("posterquiz_restarts_total", "Explicit game restarts");
    describe_counter!(
        "posterquiz_dropped_events_total",
        "Input events ignored because they arrived out of phase"
    );
    describe_counter!(
        "posterquiz_log_forward_failures_total",
        "Analytics records the sink did not accept"
    );
    describe_gauge!("posterquiz_score", "Committed score of the current session");
}

/// Records a first marker detection.
pub fn record_game_started() {
    counter!("posterquiz_games_started_total").increment(1);
}

/// Records an accepted answer.
///
/// `service` should already be sanitized to a configured id or
/// [`UNKNOWN_LABEL`].
pub fn record_answer(service: &str, correct: bool) {
    counter!(
        "posterquiz_answers_total",
        "service" => service.to_owned(),
        "correct" => if correct { "true" } else { "false" },
    )
    .increment(1);
}

/// Records a completed game.
pub fn record_game_completed() {
    counter!("posterquiz_games_completed_total").increment(1);
}

/// Records an explicit restart.
pub fn record_restart() {
    counter!("posterquiz_restarts_total").increment(1);
}

/// Records an input dropped while in `phase`.
pub fn record_dropped_event(event: &'static str, phase: Phase) {
    counter!(
        "posterquiz_dropped_events_total",
        "event" => event,
        "phase" => phase.as_str(),
    )
    .increment(1);
}

/// Records an analytics record the sink refused.
pub fn record_log_forward_failure() {
    counter!("posterquiz_log_forward_failures_total").increment(1);
}

/// Sets the committed score gauge.
pub fn set_score(score: u32) {
    gauge!("posterquiz_score").set(f64::from(score));
}
