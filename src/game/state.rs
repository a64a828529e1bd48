//! Session state representation
//!
//! The mutable part of a game: phase, question cursor, committed score and
//! the session correlation id.

use serde::Serialize;

/// Discrete state of a game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing has happened yet
    NotStarted,
    /// The scene is loaded and the marker has not been seen
    AwaitingMarker,
    /// Game running between questions (welcome, transitions, restart delay)
    Active,
    /// Marker out of view; the paused phase is remembered separately
    MarkerLost,
    /// A question is on screen and accepts one answer
    QuestionShown,
    /// Answer feedback is playing
    Feedback,
    /// Question bank exhausted
    Completed,
}

impl Phase {
    /// Stable lowercase name, used in logs and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::AwaitingMarker => "awaiting_marker",
            Self::Active => "active",
            Self::MarkerLost => "marker_lost",
            Self::QuestionShown => "question_shown",
            Self::Feedback => "feedback",
            Self::Completed => "completed",
        }
    }

    /// Whether a game has begun (first marker detection happened).
    #[must_use]
    pub const fn has_started(self) -> bool {
        !matches!(self, Self::NotStarted | Self::AwaitingMarker)
    }

    /// Whether losing the marker pauses this phase.
    #[must_use]
    pub const fn is_pausable(self) -> bool {
        matches!(
            self,
            Self::Active | Self::QuestionShown | Self::Feedback | Self::Completed
        )
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable state of one game session.
///
/// Invariant: `score <= current_question_index <= questions.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    /// Current phase
    pub phase: Phase,
    /// Index of the question being asked (equals the bank length once done)
    pub current_question_index: usize,
    /// Correct answers committed so far
    pub score: u32,
    /// Correlation id of the session
    pub session_id: String,
}

impl SessionState {
    /// Fresh state for a session that has not started.
    #[must_use]
    pub const fn new(session_id: String) -> Self {
        Self {
            phase: Phase::NotStarted,
            current_question_index: 0,
            score: 0,
            session_id,
        }
    }

    /// Rewinds the question cursor and score; the session id is kept.
    pub const fn reset_progress(&mut self) {
        self.current_question_index = 0;
        self.score = 0;
    }

    /// Checks `score <= current_question_index <= total`.
    #[must_use]
    pub fn is_consistent(&self, total: usize) -> bool {
        let score = usize::try_from(self.score).unwrap_or(usize::MAX);
        score <= self.current_question_index && self.current_question_index <= total
    }
}
