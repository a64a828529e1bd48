//! Injectable time sources
//!
//! All scheduling is expressed as offsets from a session origin so the same
//! code runs under virtual time in tests and under tokio's clock live.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Source of monotonic session time and wall-clock stamps.
pub trait Clock: Send + Sync {
    /// Time elapsed since the session origin.
    fn now(&self) -> Duration;

    /// Wall-clock time used to stamp analytics records.
    fn wall(&self) -> DateTime<Utc>;
}

/// Manually advanced clock.
///
/// Clones share the same underlying time, so a test can keep one handle
/// while the session owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    elapsed_ms: Arc<AtomicU64>,
    epoch: DateTime<Utc>,
}

impl ManualClock {
    /// Creates a clock at offset zero whose wall time starts at `epoch`.
    #[must_use]
    pub fn new(epoch: DateTime<Utc>) -> Self {
        Self {
            elapsed_ms: Arc::new(AtomicU64::new(0)),
            epoch,
        }
    }

    /// Moves time forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.elapsed_ms
            .fetch_add(duration_ms(by), Ordering::SeqCst);
    }

    /// Sets the offset to `at`. Moving backwards is ignored.
    pub fn set(&self, at: Duration) {
        self.elapsed_ms.fetch_max(duration_ms(at), Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DateTime::UNIX_EPOCH)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms.load(Ordering::SeqCst))
    }

    fn wall(&self) -> DateTime<Utc> {
        let offset = chrono::Duration::milliseconds(
            i64::try_from(self.elapsed_ms.load(Ordering::SeqCst)).unwrap_or(i64::MAX),
        );
        self.epoch + offset
    }
}

/// Clock backed by `tokio::time`, so paused-time tests stay deterministic.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: Instant,
}

impl TokioClock {
    /// Creates a clock whose origin is the current tokio instant.
    #[must_use]
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Converts a session offset back to a tokio instant.
    #[must_use]
    pub fn instant_at(&self, offset: Duration) -> Instant {
        self.origin + offset
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::default();
        let other = clock.clone();
        clock.advance(Duration::from_millis(250));
        assert_eq!(other.now(), Duration::from_millis(250));
    }

    #[test]
    fn test_manual_clock_never_goes_backwards() {
        let clock = ManualClock::default();
        clock.set(Duration::from_secs(2));
        clock.set(Duration::from_secs(1));
        assert_eq!(clock.now(), Duration::from_secs(2));
    }

    #[test]
    fn test_manual_clock_wall_tracks_offset() {
        let epoch = DateTime::parse_from_rfc3339("2025-03-08T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let clock = ManualClock::new(epoch);
        clock.advance(Duration::from_millis(1500));
        assert_eq!(
            clock.wall().to_rfc3339(),
            "2025-03-08T12:00:01.500+00:00"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_clock_follows_paused_time() {
        let clock = TokioClock::start();
        tokio::time::advance(Duration::from_millis(700)).await;
        assert_eq!(clock.now(), Duration::from_millis(700));
    }
}
