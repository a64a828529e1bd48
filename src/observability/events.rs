//! Analytics records for `posterquiz`.
//!
//! Game transitions become [`LogRecord`]s stamped with wall time, session
//! id and a per-session sequence number, then forwarded to an injected
//! [`LogSink`]. Forwarding is fire-and-forget: a refused record is counted
//! and warned about once for that call, never retried, and never reaches
//! gameplay.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::SinkError;
use crate::game::SessionState;

use super::metrics;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Kind of analytics event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// First marker detection of the session
    GameStarted,
    /// An answer was accepted
    AnswerSubmitted,
    /// The bank was exhausted
    GameCompleted,
    /// The player asked for a selfie
    SelfieTaken,
}

impl EventKind {
    /// Wire name of the event.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GameStarted => "game_started",
            Self::AnswerSubmitted => "answer_submitted",
            Self::GameCompleted => "game_completed",
            Self::SelfieTaken => "selfie_taken",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One analytics record.
///
/// Context fields are flattened next to the fixed fields when serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    /// Zero-based, monotonically increasing per logger.
    pub sequence: u64,
    /// Wall-clock time of the event.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub event_type: EventKind,
    /// Session correlation id.
    pub session_id: String,
    /// Client label (kiosk or device name), if configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    /// Event-specific context.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl LogRecord {
    /// Looks up a context field.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Destination for analytics records.
pub trait LogSink: Send {
    /// Forwards one record.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] when the record was not accepted. The caller
    /// swallows it.
    fn send(&self, record: &LogRecord) -> Result<(), SinkError>;
}

impl<T: LogSink + Sync + ?Sized> LogSink for Arc<T> {
    fn send(&self, record: &LogRecord) -> Result<(), SinkError> {
        (**self).send(record)
    }
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn send(&self, _record: &LogRecord) -> Result<(), SinkError> {
        Ok(())
    }
}

/// In-memory sink; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything received so far, in order.
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default()
    }

    /// Event kinds received so far, in order.
    #[must_use]
    pub fn kinds(&self) -> Vec<EventKind> {
        self.records().iter().map(|r| r.event_type).collect()
    }
}

impl LogSink for MemorySink {
    fn send(&self, record: &LogRecord) -> Result<(), SinkError> {
        self.records
            .lock()
            .map_err(|_| SinkError::Rejected("memory sink poisoned".to_owned()))?
            .push(record.clone());
        Ok(())
    }
}

/// Sink that writes records to the `tracing` console.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn send(&self, record: &LogRecord) -> Result<(), SinkError> {
        let line = serde_json::to_string(record)?;
        info!(target: "posterquiz::analytics", event = %record.event_type, "{line}");
        Ok(())
    }
}

/// Buffered JSONL writer; one record per line, flushed per record.
pub struct JsonlSink {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
}

impl std::fmt::Debug for JsonlSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlSink").finish_non_exhaustive()
    }
}

impl JsonlSink {
    /// Creates a sink that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
        }
    }

    /// Creates a sink that writes to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Creates a sink that writes to a file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }
}

impl LogSink for JsonlSink {
    fn send(&self, record: &LogRecord) -> Result<(), SinkError> {
        let line = serde_json::to_string(record)?;
        let mut w = self
            .writer
            .lock()
            .map_err(|_| SinkError::Rejected("writer lock poisoned".to_owned()))?;
        writeln!(w, "{line}")?;
        w.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Logger
// ---------------------------------------------------------------------------

/// Turns game transitions into records and forwards them.
pub struct SessionEventLogger {
    clock: Arc<dyn Clock>,
    sink: Box<dyn LogSink>,
    client: Option<String>,
    sequence: u64,
    failures: u64,
    error_channel: Option<mpsc::UnboundedSender<SinkError>>,
}

impl std::fmt::Debug for SessionEventLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEventLogger")
            .field("client", &self.client)
            .field("sequence", &self.sequence)
            .field("failures", &self.failures)
            .finish_non_exhaustive()
    }
}

impl SessionEventLogger {
    /// Creates a logger stamping records from `clock` and forwarding to `sink`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, sink: Box<dyn LogSink>) -> Self {
        Self {
            clock,
            sink,
            client: None,
            sequence: 0,
            failures: 0,
            error_channel: None,
        }
    }

    /// Attaches a client label to every record.
    #[must_use]
    pub fn with_client(mut self, client: Option<String>) -> Self {
        self.client = client;
        self
    }

    /// Reports the first forwarding failure on `tx`.
    #[must_use]
    pub fn with_error_channel(mut self, tx: mpsc::UnboundedSender<SinkError>) -> Self {
        self.error_channel = Some(tx);
        self
    }

    /// Builds the record for an event without forwarding it.
    #[must_use]
    pub fn build(
        &self,
        kind: EventKind,
        fields: Map<String, Value>,
        state: &SessionState,
    ) -> LogRecord {
        LogRecord {
            sequence: self.sequence,
            timestamp: self.clock.wall(),
            event_type: kind,
            session_id: state.session_id.clone(),
            client: self.client.clone(),
            fields,
        }
    }

    /// Builds, forwards and returns a record. Never fails.
    pub fn record(
        &mut self,
        kind: EventKind,
        fields: Map<String, Value>,
        state: &SessionState,
    ) -> LogRecord {
        let record = self.build(kind, fields, state);
        self.sequence += 1;

        if let Err(err) = self.sink.send(&record) {
            self.failures += 1;
            metrics::record_log_forward_failure();
            warn!(event = %kind, sequence = record.sequence, error = %err, "analytics record dropped");
            if self.failures == 1 {
                if let Some(tx) = self.error_channel.take() {
                    let _ = tx.send(err);
                }
            }
        }
        record
    }

    /// Number of records emitted so far.
    #[must_use]
    pub const fn emitted(&self) -> u64 {
        self.sequence
    }

    /// Number of records the sink refused.
    #[must_use]
    pub const fn failures(&self) -> u64 {
        self.failures
    }
}

/// Builds a context field map from `(key, value)` pairs.
#[must_use]
pub fn fields<const N: usize>(pairs: [(&str, Value); N]) -> Map<String, Value> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use serde_json::json;

    use super::*;
    use crate::clock::ManualClock;

    /// In-memory writer for capturing sink output in tests.
    #[derive(Clone)]
    struct TestWriter(Arc<StdMutex<Vec<u8>>>);

    impl TestWriter {
        fn new() -> Self {
            Self(Arc::new(StdMutex::new(Vec::new())))
        }

        fn contents(&self) -> String {
            let buf = self.0.lock().unwrap();
            String::from_utf8_lossy(&buf).into_owned()
        }
    }

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct FailingSink;

    impl LogSink for FailingSink {
        fn send(&self, _record: &LogRecord) -> Result<(), SinkError> {
            Err(SinkError::Rejected("offline".to_owned()))
        }
    }

    fn state() -> SessionState {
        SessionState::new("session_1_abcdefghi".to_owned())
    }

    fn epoch() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-02-04T10:15:30Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn record_flattens_context_fields() {
        let clock = ManualClock::new(epoch());
        let logger = SessionEventLogger::new(Arc::new(clock), Box::new(NoopSink))
            .with_client(Some("kiosk".to_owned()));
        let record = logger.build(
            EventKind::AnswerSubmitted,
            fields([("question", json!(1)), ("correct", json!(true))]),
            &state(),
        );

        let parsed = serde_json::to_value(&record).unwrap();
        assert_eq!(parsed["event_type"], "answer_submitted");
        assert_eq!(parsed["session_id"], "session_1_abcdefghi");
        assert_eq!(parsed["client"], "kiosk");
        assert_eq!(parsed["question"], 1);
        assert_eq!(parsed["correct"], true);
        assert_eq!(parsed["timestamp"], "2025-02-04T10:15:30Z");
        assert!(parsed.get("fields").is_none(), "fields should be flattened");
    }

    #[test]
    fn client_omitted_when_unset() {
        let logger =
            SessionEventLogger::new(Arc::new(ManualClock::default()), Box::new(NoopSink));
        let record = logger.build(EventKind::GameStarted, Map::new(), &state());
        let parsed = serde_json::to_value(&record).unwrap();
        assert!(parsed.get("client").is_none());
    }

    #[test]
    fn logger_increments_sequence_and_forwards() {
        let sink = MemorySink::new();
        let mut logger =
            SessionEventLogger::new(Arc::new(ManualClock::default()), Box::new(sink.clone()));
        logger.record(EventKind::GameStarted, Map::new(), &state());
        logger.record(EventKind::SelfieTaken, Map::new(), &state());

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sequence, 0);
        assert_eq!(records[1].sequence, 1);
        assert_eq!(
            sink.kinds(),
            vec![EventKind::GameStarted, EventKind::SelfieTaken]
        );
        assert_eq!(logger.emitted(), 2);
    }

    #[test]
    fn sink_failure_is_swallowed_and_reported_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut logger =
            SessionEventLogger::new(Arc::new(ManualClock::default()), Box::new(FailingSink))
                .with_error_channel(tx);

        let record = logger.record(EventKind::GameStarted, Map::new(), &state());
        logger.record(EventKind::GameCompleted, Map::new(), &state());

        assert_eq!(record.event_type, EventKind::GameStarted);
        assert_eq!(logger.failures(), 2);
        assert!(matches!(rx.try_recv(), Ok(SinkError::Rejected(_))));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn jsonl_sink_writes_one_line_per_record() {
        let tw = TestWriter::new();
        let sink = JsonlSink::new(Box::new(tw.clone()));
        let mut logger =
            SessionEventLogger::new(Arc::new(ManualClock::new(epoch())), Box::new(sink));
        logger.record(
            EventKind::GameCompleted,
            fields([("final_score", json!(2)), ("total_questions", json!(3))]),
            &state(),
        );
        logger.record(EventKind::SelfieTaken, Map::new(), &state());

        let lines: Vec<Value> = tw
            .contents()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event_type"], "game_completed");
        assert_eq!(lines[0]["final_score"], 2);
        assert_eq!(lines[1]["sequence"], 1);
    }

    #[test]
    fn event_kind_display_matches_wire_name() {
        for kind in [
            EventKind::GameStarted,
            EventKind::AnswerSubmitted,
            EventKind::GameCompleted,
            EventKind::SelfieTaken,
        ] {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, Value::String(kind.to_string()));
        }
    }
}
