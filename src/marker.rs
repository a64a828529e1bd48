//! Marker lifecycle
//!
//! Turns the tracker's raw visibility signals into the found/lost events
//! the game consumes. Tracking jitter produces short `lost`→`found`
//! bursts; a `lost` is only reported once it has held for the debounce
//! window.

use std::time::Duration;

use tracing::debug;

/// Lifecycle signal consumed by the game state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerSignal {
    /// The marker became visible
    Found,
    /// The marker has been out of view for the whole debounce window
    Lost,
}

/// Debouncing wrapper around raw marker visibility.
#[derive(Debug, Clone)]
pub struct MarkerLifecycleController {
    debounce: Duration,
    visible: bool,
    lost_since: Option<Duration>,
}

impl MarkerLifecycleController {
    /// Creates a controller; the marker starts out of view.
    ///
    /// A zero `debounce` reports `lost` immediately.
    #[must_use]
    pub const fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            visible: false,
            lost_since: None,
        }
    }

    /// Whether the game currently considers the marker visible.
    ///
    /// A marker inside an unexpired debounce window still counts as visible.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Handles a raw `markerFound` at session time `now`.
    pub fn raw_found(&mut self, now: Duration) -> Option<MarkerSignal> {
        if let Some(since) = self.lost_since.take() {
            debug!(gap = ?now.saturating_sub(since), "marker flicker absorbed");
            return None;
        }
        if self.visible {
            return None;
        }
        self.visible = true;
        Some(MarkerSignal::Found)
    }

    /// Handles a raw `markerLost` at session time `now`.
    pub fn raw_lost(&mut self, now: Duration) -> Option<MarkerSignal> {
        if !self.visible || self.lost_since.is_some() {
            return None;
        }
        if self.debounce.is_zero() {
            self.visible = false;
            return Some(MarkerSignal::Lost);
        }
        self.lost_since = Some(now);
        None
    }

    /// Deadline at which a held `lost` will be reported.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.lost_since.map(|since| since + self.debounce)
    }

    /// Reports a held `lost` once its window has elapsed at `now`.
    pub fn poll(&mut self, now: Duration) -> Option<MarkerSignal> {
        let deadline = self.next_deadline()?;
        if now < deadline {
            return None;
        }
        self.lost_since = None;
        self.visible = false;
        Some(MarkerSignal::Lost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(300);

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_first_found_is_reported() {
        let mut marker = MarkerLifecycleController::new(WINDOW);
        assert_eq!(marker.raw_found(ms(0)), Some(MarkerSignal::Found));
        assert!(marker.is_visible());
    }

    #[test]
    fn test_duplicate_found_is_ignored() {
        let mut marker = MarkerLifecycleController::new(WINDOW);
        marker.raw_found(ms(0));
        assert_eq!(marker.raw_found(ms(10)), None);
    }

    #[test]
    fn test_flicker_inside_window_is_absorbed() {
        let mut marker = MarkerLifecycleController::new(WINDOW);
        marker.raw_found(ms(0));
        assert_eq!(marker.raw_lost(ms(100)), None);
        assert_eq!(marker.next_deadline(), Some(ms(400)));
        assert_eq!(marker.raw_found(ms(250)), None);
        assert_eq!(marker.next_deadline(), None);
        assert_eq!(marker.poll(ms(1000)), None);
        assert!(marker.is_visible());
    }

    #[test]
    fn test_lost_reported_after_window() {
        let mut marker = MarkerLifecycleController::new(WINDOW);
        marker.raw_found(ms(0));
        marker.raw_lost(ms(100));
        assert_eq!(marker.poll(ms(399)), None);
        assert_eq!(marker.poll(ms(400)), Some(MarkerSignal::Lost));
        assert!(!marker.is_visible());
        assert_eq!(marker.poll(ms(500)), None);
        assert_eq!(marker.raw_found(ms(600)), Some(MarkerSignal::Found));
    }

    #[test]
    fn test_zero_window_reports_immediately() {
        let mut marker = MarkerLifecycleController::new(Duration::ZERO);
        marker.raw_found(ms(0));
        assert_eq!(marker.raw_lost(ms(1)), Some(MarkerSignal::Lost));
        assert_eq!(marker.raw_lost(ms(2)), None);
    }

    #[test]
    fn test_lost_before_any_found_is_ignored() {
        let mut marker = MarkerLifecycleController::new(WINDOW);
        assert_eq!(marker.raw_lost(ms(0)), None);
        assert_eq!(marker.next_deadline(), None);
    }
}
