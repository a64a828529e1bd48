//! Session driver
//!
//! Wires one [`GameStateMachine`] to its marker debouncer and a UI adapter,
//! and turns external inputs and elapsed time into machine events. Timer
//! firings are always processed before the input that follows them.
//!
//! Two drivers are provided: a virtual-time one stepping a
//! [`ManualClock`] (scripts and tests) and an async one on the tokio
//! runtime ([`GameSession::run`]).

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::bank::ServiceId;
use crate::clock::{Clock, ManualClock, TokioClock};
use crate::config::schema::GameConfig;
use crate::game::{GameStateMachine, SessionState};
use crate::marker::{MarkerLifecycleController, MarkerSignal};
use crate::observability::events::SessionEventLogger;
use crate::session_id::{SessionStore, obtain_session_id};
use crate::ui::UiAdapter;

/// External input to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// The AR scene finished loading
    SceneLoaded,
    /// Raw tracker signal: marker visible
    MarkerFound,
    /// Raw tracker signal: marker out of view
    MarkerLost,
    /// The player tapped a service icon
    Select(ServiceId),
    /// The player pressed "play again"
    Restart,
    /// The player pressed the selfie button
    TakeSelfie,
    /// The capture collaborator stored the selfie
    SelfieSaved,
}

impl FromStr for InputEvent {
    type Err = String;

    /// Parses a console command such as `found` or `select s3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let command = words.next().ok_or_else(|| "empty command".to_owned())?;
        let event = match command {
            "loaded" => Self::SceneLoaded,
            "found" => Self::MarkerFound,
            "lost" => Self::MarkerLost,
            "select" => {
                let service = words
                    .next()
                    .ok_or_else(|| "usage: select <service>".to_owned())?;
                Self::Select(ServiceId::new(service))
            }
            "restart" => Self::Restart,
            "selfie" => Self::TakeSelfie,
            "saved" => Self::SelfieSaved,
            other => return Err(format!("unknown command '{other}'")),
        };
        if let Some(extra) = words.next() {
            return Err(format!("unexpected argument '{extra}'"));
        }
        Ok(event)
    }
}

/// One running game session.
pub struct GameSession<U> {
    machine: GameStateMachine,
    marker: MarkerLifecycleController,
    ui: U,
    clock: Arc<dyn Clock>,
}

impl<U> std::fmt::Debug for GameSession<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("machine", &self.machine)
            .field("marker", &self.marker)
            .finish_non_exhaustive()
    }
}

impl<U: UiAdapter> GameSession<U> {
    /// Creates a session, reading or creating its id in `store`.
    ///
    /// The configured client label is attached to `logger`.
    pub fn new(
        config: &GameConfig,
        clock: Arc<dyn Clock>,
        store: &dyn SessionStore,
        logger: SessionEventLogger,
        ui: U,
    ) -> Self {
        let session_id = obtain_session_id(store, &config.analytics.session_key, clock.as_ref());
        let logger = logger.with_client(config.analytics.client.clone());
        info!(%session_id, questions = config.questions.len(), "session created");
        Self {
            machine: GameStateMachine::new(config, session_id, Arc::clone(&clock), logger),
            marker: MarkerLifecycleController::new(config.marker.debounce),
            ui,
            clock,
        }
    }

    /// The state machine.
    #[must_use]
    pub const fn machine(&self) -> &GameStateMachine {
        &self.machine
    }

    /// Mutable access to the state machine, for direct calls.
    pub const fn machine_mut(&mut self) -> &mut GameStateMachine {
        &mut self.machine
    }

    /// Current session state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        self.machine.state()
    }

    /// The UI adapter.
    #[must_use]
    pub const fn ui(&self) -> &U {
        &self.ui
    }

    /// Consumes the session, returning its UI adapter.
    pub fn into_ui(self) -> U {
        self.ui
    }

    /// Handles one external input after processing everything already due.
    pub fn handle(&mut self, event: InputEvent) {
        self.pump();
        let now = self.clock.now();
        debug!(?event, ?now, "input");

        match event {
            InputEvent::SceneLoaded => self.machine.scene_loaded(),
            InputEvent::MarkerFound => {
                if let Some(signal) = self.marker.raw_found(now) {
                    self.dispatch(signal);
                }
            }
            InputEvent::MarkerLost => {
                if let Some(signal) = self.marker.raw_lost(now) {
                    self.dispatch(signal);
                }
            }
            InputEvent::Select(service) => {
                self.machine.submit_answer(&service);
            }
            InputEvent::Restart => self.machine.restart(),
            InputEvent::TakeSelfie => self.machine.take_selfie(),
            InputEvent::SelfieSaved => self.machine.selfie_saved(),
        }
        self.flush();
    }

    /// Processes every marker deadline and timer that is due, earliest
    /// first, then forwards queued intents to the UI. Returns the number
    /// of events processed.
    pub fn pump(&mut self) -> usize {
        let mut processed = 0;
        loop {
            let now = self.clock.now();
            let marker_due = self.marker.next_deadline().filter(|d| *d <= now);
            let timer_due = self.machine.next_deadline().filter(|d| *d <= now);

            match (marker_due, timer_due) {
                (Some(m), Some(t)) if m < t => self.poll_marker(now),
                (Some(_), None) => self.poll_marker(now),
                (_, Some(_)) => {
                    self.machine.fire_next();
                }
                (None, None) => break,
            }
            processed += 1;
        }
        self.machine.settle();
        self.flush();
        processed
    }

    /// Earliest pending deadline of either the debouncer or the timers.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        match (self.marker.next_deadline(), self.machine.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Moves `clock` forward to `target`, stopping at every deadline on
    /// the way so chained choreography fires at its exact offsets.
    pub fn advance_to(&mut self, clock: &ManualClock, target: Duration) {
        while let Some(deadline) = self.next_deadline().filter(|d| *d <= target) {
            clock.set(deadline);
            if self.pump() == 0 {
                break;
            }
        }
        clock.set(target);
        self.pump();
    }

    /// Runs the session on the tokio runtime until `cancel` fires or the
    /// input channel closes. `clock` must be the clock the session was
    /// built with.
    pub async fn run(
        mut self,
        clock: TokioClock,
        mut rx: mpsc::UnboundedReceiver<InputEvent>,
        cancel: CancellationToken,
    ) -> Self {
        loop {
            self.pump();
            let deadline = self.next_deadline().map(|d| clock.instant_at(d));

            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    info!("session cancelled");
                    break;
                }
                () = sleep_until(deadline) => {}
                event = rx.recv() => match event {
                    Some(event) => self.handle(event),
                    None => {
                        debug!("input channel closed");
                        break;
                    }
                },
            }
        }
        self
    }

    fn poll_marker(&mut self, now: Duration) {
        if let Some(signal) = self.marker.poll(now) {
            self.machine.settle();
            self.dispatch(signal);
        }
    }

    fn dispatch(&mut self, signal: MarkerSignal) {
        match signal {
            MarkerSignal::Found => self.machine.on_marker_found(),
            MarkerSignal::Lost => self.machine.on_marker_lost(),
        }
    }

    fn flush(&mut self) {
        for intent in self.machine.drain_intents() {
            self.ui.apply(&intent);
        }
    }
}

async fn sleep_until(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
