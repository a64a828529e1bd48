//! Observability module
//!
//! Logging, metrics and analytics records for monitoring game sessions.

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{
    EventKind, JsonlSink, LogRecord, LogSink, MemorySink, NoopSink, SessionEventLogger,
    TracingSink,
};
pub use logging::{LogFormat, init_logging};
pub use metrics::init_metrics;
