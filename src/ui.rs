//! UI intents and adapters
//!
//! The state machine never touches a widget tree. It emits [`UiIntent`]
//! values and an adapter applies them to whatever environment hosts the
//! game. Adapters swallow their own failures (a missing element is simply
//! skipped).

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;

use crate::bank::ServiceId;

/// Toggleable scene or overlay element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Element {
    /// Loading overlay shown while the AR scene boots
    LoadingScreen,
    /// Overlay holding score, question panel and instructions
    GameUi,
    /// Avatar anchored on the marker
    Avatar,
    /// Selectable service icons
    GameIcons,
    /// "Tap a service" hint
    Instructions,
    /// Confetti particle system
    Confetti,
    /// Completion badge
    Badge,
}

impl Element {
    /// Identifier of the element in the host page.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::LoadingScreen => "loading-screen",
            Self::GameUi => "game-ui",
            Self::Avatar => "avatar",
            Self::GameIcons => "game-icons",
            Self::Instructions => "instructions",
            Self::Confetti => "confetti-system",
            Self::Badge => "badge",
        }
    }
}

/// Fading panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Panel {
    /// Current question and running score
    Question,
    /// Final score and restart/selfie buttons
    Completion,
}

impl Panel {
    /// Identifier of the panel in the host page.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Question => "question-panel",
            Self::Completion => "completion-panel",
        }
    }
}

/// Semantic color of a temporary message; adapters pick the actual color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorTag {
    /// Welcome banner
    Welcome,
    /// Correct answer, saved selfie
    Success,
    /// Wrong answer
    Failure,
}

impl ColorTag {
    /// Default hex color for the tag.
    #[must_use]
    pub const fn hex(self) -> &'static str {
        match self {
            Self::Welcome => "#FF6B9D",
            Self::Success => "#4CAF50",
            Self::Failure => "#FF5722",
        }
    }
}

/// A single presentation change requested by the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum UiIntent {
    /// Render question text and the running score
    ShowQuestion {
        /// Prompt text
        text: String,
        /// Committed score
        score: u32,
    },
    /// Emphasize a service icon
    HighlightService {
        /// Icon to emphasize
        service: ServiceId,
        /// Whether it marks a correct answer
        correct: bool,
    },
    /// Remove every correctness highlight
    ClearHighlights,
    /// Show a message that removes itself after `duration`
    ShowMessage {
        /// Message text
        text: String,
        /// Semantic color
        color: ColorTag,
        /// Display time
        #[serde(with = "millis")]
        duration: Duration,
    },
    /// Show or hide an element
    SetVisible {
        /// Target element
        element: Element,
        /// New visibility
        visible: bool,
    },
    /// Fade a panel in
    ShowPanel {
        /// Target panel
        panel: Panel,
    },
    /// Fade a panel out
    HidePanel {
        /// Target panel
        panel: Panel,
    },
    /// Ask the capture collaborator for a screenshot
    CaptureSelfie,
}

impl std::fmt::Display for UiIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ShowQuestion { text, score } => write!(f, "question [score {score}] {text}"),
            Self::HighlightService { service, correct } => {
                write!(f, "highlight {service} (correct: {correct})")
            }
            Self::ClearHighlights => write!(f, "clear highlights"),
            Self::ShowMessage {
                text,
                color,
                duration,
            } => write!(
                f,
                "message {} for {}ms: {text}",
                color.hex(),
                duration.as_millis()
            ),
            Self::SetVisible { element, visible } => {
                let verb = if *visible { "show" } else { "hide" };
                write!(f, "{verb} {}", element.id())
            }
            Self::ShowPanel { panel } => write!(f, "show {}", panel.id()),
            Self::HidePanel { panel } => write!(f, "hide {}", panel.id()),
            Self::CaptureSelfie => write!(f, "capture selfie"),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::Serializer;

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

/// Applies intents to the host environment.
pub trait UiAdapter {
    /// Applies one intent. Must not fail; missing targets are skipped.
    fn apply(&mut self, intent: &UiIntent);
}

impl<T: UiAdapter + ?Sized> UiAdapter for Box<T> {
    fn apply(&mut self, intent: &UiIntent) {
        (**self).apply(intent);
    }
}

/// Adapter that records every intent; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingUi {
    applied: Arc<Mutex<Vec<UiIntent>>>,
}

impl RecordingUi {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything applied so far.
    #[must_use]
    pub fn intents(&self) -> Vec<UiIntent> {
        self.applied
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default()
    }

    /// Forgets everything applied so far.
    pub fn clear(&self) {
        if let Ok(mut g) = self.applied.lock() {
            g.clear();
        }
    }
}

impl UiAdapter for RecordingUi {
    fn apply(&mut self, intent: &UiIntent) {
        if let Ok(mut g) = self.applied.lock() {
            g.push(intent.clone());
        }
    }
}

/// Adapter that prints one line per intent, prefixed with session time.
pub struct ConsoleUi {
    out: Box<dyn Write + Send>,
    clock: Arc<dyn crate::clock::Clock>,
}

impl std::fmt::Debug for ConsoleUi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleUi").finish_non_exhaustive()
    }
}

impl ConsoleUi {
    /// Creates an adapter writing to `out`.
    #[must_use]
    pub fn new(out: Box<dyn Write + Send>, clock: Arc<dyn crate::clock::Clock>) -> Self {
        Self { out, clock }
    }

    /// Creates an adapter writing to stdout.
    #[must_use]
    pub fn stdout(clock: Arc<dyn crate::clock::Clock>) -> Self {
        Self::new(Box::new(std::io::stdout()), clock)
    }
}

impl UiAdapter for ConsoleUi {
    fn apply(&mut self, intent: &UiIntent) {
        let at = self.clock.now().as_millis();
        let _ = writeln!(self.out, "[{at:>7}ms] {intent}");
        let _ = self.out.flush();
    }
}

/// Adapter that only traces intents.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingUi;

impl UiAdapter for TracingUi {
    fn apply(&mut self, intent: &UiIntent) {
        tracing::debug!(%intent, "ui intent");
    }
}
