#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::Arc;
use std::time::Duration;

use posterquiz::bank::ServiceId;
use posterquiz::clock::{Clock, ManualClock};
use posterquiz::config::GameConfig;
use posterquiz::game::{Phase, SessionState};
use posterquiz::observability::{EventKind, MemorySink, SessionEventLogger};
use posterquiz::session::{GameSession, InputEvent};
use posterquiz::session_id::MemoryStore;
use posterquiz::ui::{RecordingUi, UiIntent};

/// In-process session on a manual clock with recording collaborators.
pub struct QuizHarness {
    pub clock: ManualClock,
    pub sink: MemorySink,
    pub ui: RecordingUi,
    pub session: GameSession<RecordingUi>,
}

impl QuizHarness {
    /// Session over the built-in three-question game.
    pub fn new() -> Self {
        Self::with_config(&GameConfig::default())
    }

    pub fn with_config(config: &GameConfig) -> Self {
        let clock = ManualClock::default();
        let shared: Arc<dyn Clock> = Arc::new(clock.clone());
        let sink = MemorySink::new();
        let ui = RecordingUi::new();
        let logger = SessionEventLogger::new(Arc::clone(&shared), Box::new(sink.clone()));
        let session = GameSession::new(config, shared, &MemoryStore::new(), logger, ui.clone());
        Self {
            clock,
            sink,
            ui,
            session,
        }
    }

    /// Advances virtual time to `ms` after session start.
    pub fn at(&mut self, ms: u64) -> &mut Self {
        self.session
            .advance_to(&self.clock, Duration::from_millis(ms));
        self
    }

    /// Advances virtual time by `ms`.
    pub fn wait(&mut self, ms: u64) -> &mut Self {
        let target = self.clock.now() + Duration::from_millis(ms);
        self.session.advance_to(&self.clock, target);
        self
    }

    pub fn send(&mut self, event: InputEvent) -> &mut Self {
        self.session.handle(event);
        self
    }

    pub fn select(&mut self, service: &str) -> &mut Self {
        self.send(InputEvent::Select(ServiceId::new(service)))
    }

    /// Marker found, then wait until the first question is on screen.
    pub fn start(&mut self) -> &mut Self {
        self.send(InputEvent::MarkerFound);
        self.wait(4500);
        assert_eq!(self.phase(), Phase::QuestionShown);
        self
    }

    /// Answers and waits until the next question (or completion) is shown.
    pub fn answer(&mut self, service: &str) -> &mut Self {
        self.select(service);
        self.wait(2500)
    }

    pub fn state(&self) -> &SessionState {
        self.session.state()
    }

    pub fn phase(&self) -> Phase {
        self.session.state().phase
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.sink.kinds()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }

    pub fn intents(&self) -> Vec<UiIntent> {
        self.ui.intents()
    }

    /// Question texts shown so far, in order.
    pub fn questions_shown(&self) -> Vec<String> {
        self.intents()
            .into_iter()
            .filter_map(|i| match i {
                UiIntent::ShowQuestion { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }
}

/// Runs the `posterquiz` binary.
pub struct PosterQuizProcess;

impl PosterQuizProcess {
    /// Path to a file under `tests/fixtures`.
    pub fn fixture_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    /// Runs the binary to completion with `args`.
    pub fn spawn_command(args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_posterquiz"))
            .args(args)
            .env_remove("POSTERQUIZ_CONFIG")
            .env_remove("POSTERQUIZ_LOG_LEVEL")
            .output()
            .expect("failed to run posterquiz")
    }
}
