//! Timed choreography
//!
//! Named, cancellable, single-fire actions scheduled against an injected
//! [`Clock`]. Nothing here blocks or sleeps; a driver asks for due intents
//! and runs them as ordinary events.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};

use crate::clock::Clock;

/// Handle identifying one scheduled intent.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct IntentId(u64);

impl std::fmt::Display for IntentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A pending timed action.
#[derive(Debug, Clone)]
pub struct ScheduledIntent<A> {
    /// Handle returned by [`Choreographer::schedule`]
    pub id: IntentId,
    /// Short label used in logs
    pub name: &'static str,
    /// Session offset at which the action becomes due
    pub fire_at: Duration,
    /// The action to run
    pub action: A,
    /// Set once cancelled; cancelled intents never fire
    pub cancelled: bool,
}

/// Scheduler of delayed, cancellable actions.
///
/// Due intents are released in `(fire_at, id)` order, so two intents due at
/// the same instant fire in the order they were scheduled. While a released
/// intent is being handled, new intents are anchored at its `fire_at`
/// rather than at the clock's current time; a large jump of virtual time
/// therefore replays a whole chain of delays exactly.
pub struct Choreographer<A> {
    clock: Arc<dyn Clock>,
    pending: BTreeMap<IntentId, ScheduledIntent<A>>,
    next_id: u64,
    anchor: Option<Duration>,
}

impl<A> std::fmt::Debug for Choreographer<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Choreographer")
            .field("pending", &self.pending_count())
            .field("next_id", &self.next_id)
            .field("anchor", &self.anchor)
            .finish_non_exhaustive()
    }
}

impl<A> Choreographer<A> {
    /// Creates an empty choreographer reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            pending: BTreeMap::new(),
            next_id: 0,
            anchor: None,
        }
    }

    /// Current session time as seen by scheduling.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.anchor.unwrap_or_else(|| self.clock.now())
    }

    /// Schedules `action` to fire `delay` from now.
    pub fn schedule(&mut self, name: &'static str, delay: Duration, action: A) -> IntentId {
        let id = IntentId(self.next_id);
        self.next_id += 1;
        let fire_at = self.now() + delay;
        trace!(%id, name, ?fire_at, "intent scheduled");
        self.pending.insert(
            id,
            ScheduledIntent {
                id,
                name,
                fire_at,
                action,
                cancelled: false,
            },
        );
        id
    }

    /// Cancels an intent.
    ///
    /// Returns `true` if a pending intent was suppressed. Cancelling an
    /// intent that already fired, or cancelling twice, returns `false`.
    pub fn cancel(&mut self, id: IntentId) -> bool {
        match self.pending.get_mut(&id) {
            Some(intent) if !intent.cancelled => {
                intent.cancelled = true;
                debug!(%id, name = intent.name, "intent cancelled");
                true
            }
            _ => false,
        }
    }

    /// Cancels every outstanding intent, returning how many were suppressed.
    pub fn cancel_all(&mut self) -> usize {
        let mut count = 0;
        for intent in self.pending.values_mut().filter(|i| !i.cancelled) {
            intent.cancelled = true;
            count += 1;
        }
        self.pending.clear();
        if count > 0 {
            debug!(count, "all pending intents cancelled");
        }
        count
    }

    /// Whether `id` is still waiting to fire.
    #[must_use]
    pub fn is_pending(&self, id: IntentId) -> bool {
        self.pending.get(&id).is_some_and(|i| !i.cancelled)
    }

    /// Number of intents still waiting to fire.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.values().filter(|i| !i.cancelled).count()
    }

    /// Earliest fire time among live intents.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending
            .values()
            .filter(|i| !i.cancelled)
            .map(|i| i.fire_at)
            .min()
    }

    /// Removes and returns the earliest intent that is due at the clock's
    /// current time, anchoring subsequent scheduling at its fire time.
    ///
    /// Returns `None` (and clears the anchor) when nothing is due.
    pub fn pop_due(&mut self) -> Option<ScheduledIntent<A>> {
        self.pending.retain(|_, i| !i.cancelled);
        let now = self.clock.now();
        let id = self
            .pending
            .values()
            .filter(|i| i.fire_at <= now)
            .min_by_key(|i| (i.fire_at, i.id))
            .map(|i| i.id);

        let Some(id) = id else {
            self.anchor = None;
            return None;
        };
        let intent = self.pending.remove(&id)?;
        self.anchor = Some(intent.fire_at);
        trace!(id = %intent.id, name = intent.name, "intent due");
        Some(intent)
    }

    /// Clears the firing anchor so scheduling uses the clock again.
    pub fn settle(&mut self) {
        self.anchor = None;
    }
}
