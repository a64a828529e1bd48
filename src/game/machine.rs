//! Game state machine
//!
//! The `GameStateMachine` owns the [`SessionState`] and is the only thing
//! that mutates it. Inputs are lifecycle signals, answer submissions and
//! timer firings; outputs are queued [`UiIntent`]s and analytics records.
//!
//! While the marker is lost the visible phase is [`Phase::MarkerLost`] and
//! the interrupted phase is kept aside. Timers keep running against that
//! paused phase, so losing the marker never discards progress.

use std::sync::Arc;

use serde_json::{Map, json};
use tracing::{debug, info};

use crate::bank::{Question, QuestionBank, ServiceId};
use crate::choreo::{Choreographer, IntentId};
use crate::clock::Clock;
use crate::config::schema::{GameConfig, Messages, Timings};
use crate::observability::events::{EventKind, SessionEventLogger, fields};
use crate::observability::metrics;
use crate::ui::{ColorTag, Element, Panel, UiIntent};

use super::state::{Phase, SessionState};

/// Deferred steps of the game's choreography.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GameAction {
    HideLoadingScreen,
    ShowWelcome,
    BeginQuestions,
    HideConfetti,
    AdvanceQuestion,
    AskNext,
    ShowCompletionPanel,
}

impl GameAction {
    const fn name(self) -> &'static str {
        match self {
            Self::HideLoadingScreen => "hide_loading_screen",
            Self::ShowWelcome => "show_welcome",
            Self::BeginQuestions => "begin_questions",
            Self::HideConfetti => "hide_confetti",
            Self::AdvanceQuestion => "advance_question",
            Self::AskNext => "ask_next",
            Self::ShowCompletionPanel => "show_completion_panel",
        }
    }
}

/// State machine for one trivia session.
pub struct GameStateMachine {
    bank: QuestionBank,
    timings: Timings,
    messages: Messages,
    state: SessionState,
    /// Phase interrupted by a marker loss
    paused: Option<Phase>,
    /// A correct answer whose point is committed with the index advance
    pending_point: bool,
    scene_ready: bool,
    completion_panel_shown: bool,
    loading_intent: Option<IntentId>,
    choreo: Choreographer<GameAction>,
    logger: SessionEventLogger,
    outbox: Vec<UiIntent>,
}

impl std::fmt::Debug for GameStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameStateMachine")
            .field("state", &self.state)
            .field("paused", &self.paused)
            .field("pending_point", &self.pending_point)
            .field("choreo", &self.choreo)
            .finish_non_exhaustive()
    }
}

impl GameStateMachine {
    /// Creates a machine in [`Phase::NotStarted`].
    #[must_use]
    pub fn new(
        config: &GameConfig,
        session_id: String,
        clock: Arc<dyn Clock>,
        logger: SessionEventLogger,
    ) -> Self {
        Self {
            bank: config.bank(),
            timings: config.timings,
            messages: config.messages.clone(),
            state: SessionState::new(session_id),
            paused: None,
            pending_point: false,
            scene_ready: false,
            completion_panel_shown: false,
            loading_intent: None,
            choreo: Choreographer::new(clock),
            logger,
            outbox: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Current session state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Visible phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Phase the game is really in; differs from [`phase`](Self::phase)
    /// only while the marker is lost.
    #[must_use]
    pub fn underlying_phase(&self) -> Phase {
        self.paused.unwrap_or(self.state.phase)
    }

    /// The question at the cursor, if the bank is not exhausted.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.bank.get(self.state.current_question_index)
    }

    /// The question bank.
    #[must_use]
    pub const fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Number of scheduled intents still waiting to fire.
    #[must_use]
    pub fn pending_intents(&self) -> usize {
        self.choreo.pending_count()
    }

    /// Earliest scheduled fire time.
    #[must_use]
    pub fn next_deadline(&self) -> Option<std::time::Duration> {
        self.choreo.next_deadline()
    }

    /// The analytics logger.
    #[must_use]
    pub const fn logger(&self) -> &SessionEventLogger {
        &self.logger
    }

    /// Takes every UI intent queued since the last call.
    pub fn drain_intents(&mut self) -> Vec<UiIntent> {
        std::mem::take(&mut self.outbox)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// The AR scene finished loading.
    ///
    /// Hides the loading screen once, whatever the phase; only a game that
    /// has not started moves on to `AwaitingMarker`.
    pub fn scene_loaded(&mut self) {
        if self.scene_ready {
            debug!(phase = %self.state.phase, "scene already loaded");
            return;
        }
        self.scene_ready = true;
        if self.state.phase == Phase::NotStarted {
            self.transition(Phase::AwaitingMarker);
        }
        self.loading_intent = Some(self.choreo.schedule(
            GameAction::HideLoadingScreen.name(),
            self.timings.loading_screen,
            GameAction::HideLoadingScreen,
        ));
    }

    /// The marker came into view.
    ///
    /// Starts the game on first detection; resumes a paused game without
    /// touching its progress otherwise.
    pub fn on_marker_found(&mut self) {
        match self.state.phase {
            Phase::NotStarted | Phase::AwaitingMarker => self.start(),
            Phase::MarkerLost => self.resume(),
            phase => debug!(%phase, "marker found while already visible"),
        }
    }

    /// The marker left the view.
    ///
    /// Hides the game overlay and pauses; scheduled choreography keeps
    /// running against the paused phase.
    pub fn on_marker_lost(&mut self) {
        let phase = self.state.phase;
        if !phase.is_pausable() {
            debug!(%phase, "marker lost outside a running game");
            return;
        }
        self.paused = Some(phase);
        self.state.phase = Phase::MarkerLost;
        info!(paused = %phase, "marker lost, game paused");
        self.emit(UiIntent::SetVisible {
            element: Element::GameUi,
            visible: false,
        });
    }

    fn start(&mut self) {
        self.transition(Phase::Active);
        metrics::record_game_started();
        self.logger
            .record(EventKind::GameStarted, Map::new(), &self.state);
        info!(session_id = %self.state.session_id, "game started");

        self.show_overlay();
        self.schedule(GameAction::ShowWelcome, self.timings.welcome_delay);
    }

    fn resume(&mut self) {
        let phase = self.paused.take().unwrap_or(Phase::Active);
        self.state.phase = phase;
        info!(%phase, "marker found, game resumed");

        self.show_overlay();
        match phase {
            Phase::QuestionShown => self.render_question(),
            Phase::Completed if self.completion_panel_shown => self.emit(UiIntent::ShowPanel {
                panel: Panel::Completion,
            }),
            _ => {}
        }
    }

    fn show_overlay(&mut self) {
        self.emit(UiIntent::SetVisible {
            element: Element::GameUi,
            visible: true,
        });
        self.emit(UiIntent::SetVisible {
            element: Element::Avatar,
            visible: true,
        });
    }

    // ------------------------------------------------------------------
    // Questions and answers
    // ------------------------------------------------------------------

    /// Shows the question at the cursor, or completes the game when the
    /// bank is exhausted.
    ///
    /// Idempotent: asking again re-renders the same question and score.
    /// Ignored outside `Active`/`QuestionShown`.
    pub fn ask_current_question(&mut self) {
        let phase = self.underlying_phase();
        if !matches!(phase, Phase::Active | Phase::QuestionShown) {
            debug!(%phase, "not asking a question in this phase");
            return;
        }
        if self.state.current_question_index >= self.bank.len() {
            self.complete();
            return;
        }

        self.transition(Phase::QuestionShown);
        debug!(
            number = self.state.current_question_index + 1,
            total = self.bank.len(),
            "question shown"
        );
        // Rendered on resume while the marker is lost.
        if self.state.phase != Phase::MarkerLost {
            self.render_question();
        }
    }

    fn render_question(&mut self) {
        let Some(question) = self.current_question() else {
            return;
        };
        let text = question.prompt.clone();
        self.emit(UiIntent::ShowQuestion {
            text,
            score: self.state.score,
        });
        self.emit(UiIntent::ShowPanel {
            panel: Panel::Question,
        });
    }

    /// Scores a selection for the question on screen.
    ///
    /// Accepted only in [`Phase::QuestionShown`]; anything else (a second
    /// tap, a late event, a hidden overlay) is dropped. Returns whether the
    /// selection was accepted.
    pub fn submit_answer(&mut self, selected: &ServiceId) -> bool {
        if self.state.phase != Phase::QuestionShown {
            debug!(phase = %self.state.phase, %selected, "selection dropped");
            metrics::record_dropped_event("submit_answer", self.state.phase);
            return false;
        }
        let Some(question) = self.current_question() else {
            return false;
        };
        let expected = question.correct_answer.clone();
        let correct = *selected == expected;
        let number = self.state.current_question_index + 1;

        self.transition(Phase::Feedback);
        if correct {
            self.pending_point = true;
            self.emit(UiIntent::HighlightService {
                service: expected,
                correct: true,
            });
            self.show_message(self.messages.correct.clone(), ColorTag::Success);
            self.emit(UiIntent::SetVisible {
                element: Element::Confetti,
                visible: true,
            });
            self.schedule(GameAction::HideConfetti, self.timings.confetti_duration);
        } else {
            self.show_message(self.messages.incorrect.clone(), ColorTag::Failure);
        }

        let label = if self.bank.knows(selected) {
            selected.as_str()
        } else {
            metrics::UNKNOWN_LABEL
        };
        metrics::record_answer(label, correct);
        self.logger.record(
            EventKind::AnswerSubmitted,
            fields([
                ("question", json!(number)),
                ("selected", json!(selected)),
                ("correct", json!(correct)),
            ]),
            &self.state,
        );
        info!(question = number, %selected, correct, "answer submitted");

        self.schedule(GameAction::AdvanceQuestion, self.timings.advance_delay);
        true
    }

    /// Ends the game: hides the icons, reveals the badge, schedules the
    /// completion panel and logs the final score.
    ///
    /// Only reachable from `Active`/`QuestionShown`; repeated calls are
    /// ignored.
    pub fn complete(&mut self) {
        let phase = self.underlying_phase();
        if !matches!(phase, Phase::Active | Phase::QuestionShown) {
            debug!(%phase, "not completing in this phase");
            return;
        }
        self.transition(Phase::Completed);

        for element in [Element::GameIcons, Element::Instructions] {
            self.emit(UiIntent::SetVisible {
                element,
                visible: false,
            });
        }
        if phase == Phase::QuestionShown {
            self.emit(UiIntent::HidePanel {
                panel: Panel::Question,
            });
        }
        self.emit(UiIntent::SetVisible {
            element: Element::Badge,
            visible: true,
        });
        self.schedule(
            GameAction::ShowCompletionPanel,
            self.timings.completion_panel_delay,
        );

        let total = self.bank.len();
        metrics::record_game_completed();
        self.logger.record(
            EventKind::GameCompleted,
            fields([
                ("final_score", json!(self.state.score)),
                ("total_questions", json!(total)),
            ]),
            &self.state,
        );
        info!(score = self.state.score, total, "game completed");
    }

    /// Starts the game over from question 0.
    ///
    /// Cancels all pending choreography first, so nothing from the previous
    /// round fires into the reset UI. Ignored before the game has started.
    pub fn restart(&mut self) {
        let phase = self.underlying_phase();
        if !phase.has_started() {
            debug!(%phase, "nothing to restart");
            return;
        }

        let loading_pending = self
            .loading_intent
            .take()
            .is_some_and(|id| self.choreo.is_pending(id));
        let cancelled = self.choreo.cancel_all();
        self.pending_point = false;
        self.completion_panel_shown = false;
        if loading_pending {
            self.emit(UiIntent::SetVisible {
                element: Element::LoadingScreen,
                visible: false,
            });
        }

        self.emit(UiIntent::HidePanel {
            panel: Panel::Completion,
        });
        self.emit(UiIntent::HidePanel {
            panel: Panel::Question,
        });
        self.emit(UiIntent::SetVisible {
            element: Element::Badge,
            visible: false,
        });
        self.emit(UiIntent::SetVisible {
            element: Element::Confetti,
            visible: false,
        });
        self.emit(UiIntent::ClearHighlights);

        self.state.reset_progress();
        metrics::set_score(0);
        self.transition(Phase::Active);
        metrics::record_restart();
        info!(cancelled, "game restarted");

        self.schedule(GameAction::BeginQuestions, self.timings.restart_delay);
    }

    // ------------------------------------------------------------------
    // Selfie
    // ------------------------------------------------------------------

    /// Asks the capture collaborator for a selfie and logs it.
    pub fn take_selfie(&mut self) {
        self.emit(UiIntent::CaptureSelfie);
        self.logger
            .record(EventKind::SelfieTaken, Map::new(), &self.state);
        info!("selfie requested");
    }

    /// The capture collaborator saved the selfie.
    pub fn selfie_saved(&mut self) {
        self.show_message(self.messages.selfie_saved.clone(), ColorTag::Success);
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    /// Fires every due intent in fire-time order. Returns how many fired.
    pub fn advance(&mut self) -> usize {
        let mut fired = 0;
        while self.fire_next() {
            fired += 1;
        }
        self.settle();
        fired
    }

    /// Fires the earliest due intent, if any.
    ///
    /// Call [`settle`](Self::settle) once done firing.
    pub fn fire_next(&mut self) -> bool {
        let Some(intent) = self.choreo.pop_due() else {
            return false;
        };
        debug!(id = %intent.id, name = intent.name, "timer fired");
        self.run(intent.action);
        true
    }

    /// Ends a firing batch; later scheduling is relative to the clock again.
    pub fn settle(&mut self) {
        self.choreo.settle();
    }

    fn run(&mut self, action: GameAction) {
        match action {
            GameAction::HideLoadingScreen => {
                self.loading_intent = None;
                self.emit(UiIntent::SetVisible {
                    element: Element::LoadingScreen,
                    visible: false,
                });
            }
            GameAction::ShowWelcome => {
                self.emit(UiIntent::ShowMessage {
                    text: self.messages.welcome.clone(),
                    color: ColorTag::Welcome,
                    duration: self.timings.welcome_duration,
                });
                self.schedule(GameAction::BeginQuestions, self.timings.welcome_duration);
            }
            GameAction::BeginQuestions => {
                for element in [Element::GameIcons, Element::Instructions] {
                    self.emit(UiIntent::SetVisible {
                        element,
                        visible: true,
                    });
                }
                self.ask_current_question();
            }
            GameAction::HideConfetti => self.emit(UiIntent::SetVisible {
                element: Element::Confetti,
                visible: false,
            }),
            GameAction::AdvanceQuestion => self.advance_question(),
            GameAction::AskNext => self.ask_current_question(),
            GameAction::ShowCompletionPanel => {
                self.completion_panel_shown = true;
                self.emit(UiIntent::ShowPanel {
                    panel: Panel::Completion,
                });
            }
        }
    }

    fn advance_question(&mut self) {
        if self.underlying_phase() != Phase::Feedback {
            return;
        }
        if std::mem::take(&mut self.pending_point) {
            self.state.score += 1;
            metrics::set_score(self.state.score);
        }
        self.state.current_question_index =
            (self.state.current_question_index + 1).min(self.bank.len());
        debug_assert!(self.state.is_consistent(self.bank.len()));

        self.transition(Phase::Active);
        self.emit(UiIntent::HidePanel {
            panel: Panel::Question,
        });
        self.schedule(GameAction::AskNext, self.timings.next_question_delay);
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Moves to `next`; while the marker is lost the paused phase moves
    /// instead.
    fn transition(&mut self, next: Phase) {
        let slot = match self.paused.as_mut() {
            Some(paused) if self.state.phase == Phase::MarkerLost => paused,
            _ => &mut self.state.phase,
        };
        let from = *slot;
        if from != next {
            *slot = next;
            debug!(%from, to = %next, "phase transition");
        }
    }

    fn schedule(&mut self, action: GameAction, delay: std::time::Duration) -> IntentId {
        self.choreo.schedule(action.name(), delay, action)
    }

    fn show_message(&mut self, text: String, color: ColorTag) {
        self.emit(UiIntent::ShowMessage {
            text,
            color,
            duration: self.timings.message_duration,
        });
    }

    fn emit(&mut self, intent: UiIntent) {
        self.outbox.push(intent);
    }
}
