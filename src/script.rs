//! Timestamped event scripts
//!
//! A script is a YAML list of inputs, each at an offset from session start.
//! Replaying one drives a session under a [`ManualClock`], so a whole game
//! with its choreography runs instantly and deterministically.
//!
//! ```yaml
//! settle: 10s
//! steps:
//!   - at: 0s
//!     event: scene_loaded
//!   - at: 2500ms
//!     event: marker_found
//!   - at: 8s
//!     event: select
//!     service: s3
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::bank::{QuestionBank, ServiceId};
use crate::clock::ManualClock;
use crate::config::schema::humantime_serde_str;
use crate::error::ScriptError;
use crate::session::{GameSession, InputEvent};
use crate::ui::UiAdapter;

/// A replayable list of timestamped inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Time to keep running after the last step, so trailing choreography
    /// (feedback, completion panel) plays out.
    #[serde(default = "default_settle", with = "humantime_serde_str")]
    pub settle: Duration,
    /// Steps in non-decreasing `at` order.
    pub steps: Vec<ScriptStep>,
}

const fn default_settle() -> Duration {
    Duration::from_secs(10)
}

/// One scripted input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Offset from session start.
    #[serde(with = "humantime_serde_str")]
    pub at: Duration,
    /// The input delivered at that offset.
    #[serde(flatten)]
    pub event: ScriptEvent,
}

/// Scripted input, tagged by `event`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScriptEvent {
    /// Scene finished loading
    SceneLoaded,
    /// Raw marker found
    MarkerFound,
    /// Raw marker lost
    MarkerLost,
    /// Service icon tapped
    Select {
        /// Selected service
        service: ServiceId,
    },
    /// Play again
    Restart,
    /// Selfie button
    Selfie,
    /// Selfie stored
    SelfieSaved,
}

impl From<ScriptEvent> for InputEvent {
    fn from(event: ScriptEvent) -> Self {
        match event {
            ScriptEvent::SceneLoaded => Self::SceneLoaded,
            ScriptEvent::MarkerFound => Self::MarkerFound,
            ScriptEvent::MarkerLost => Self::MarkerLost,
            ScriptEvent::Select { service } => Self::Select(service),
            ScriptEvent::Restart => Self::Restart,
            ScriptEvent::Selfie => Self::TakeSelfie,
            ScriptEvent::SelfieSaved => Self::SelfieSaved,
        }
    }
}

impl Script {
    /// Reads and parses a script file.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Parse`] if the file cannot be read or is not a
    /// valid script.
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ScriptError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&raw, path)
    }

    /// Parses a script from YAML; `source` is used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Parse`] on malformed YAML or unknown events.
    pub fn parse(raw: &str, source: &Path) -> Result<Self, ScriptError> {
        serde_yaml::from_str(raw).map_err(|e| ScriptError::Parse {
            path: source.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Checks step ordering and that every selection names a known service.
    ///
    /// # Errors
    ///
    /// Returns the first [`ScriptError::OutOfOrder`] or
    /// [`ScriptError::UnknownService`] found.
    pub fn validate(&self, bank: &QuestionBank) -> Result<(), ScriptError> {
        let mut previous = Duration::ZERO;
        for (index, step) in self.steps.iter().enumerate() {
            if step.at < previous {
                return Err(ScriptError::OutOfOrder { index, at: step.at });
            }
            previous = step.at;
            if let ScriptEvent::Select { service } = &step.event {
                if !bank.knows(service) {
                    return Err(ScriptError::UnknownService {
                        index,
                        service: service.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Offset at which replay stops.
    #[must_use]
    pub fn end(&self) -> Duration {
        self.steps.last().map_or(Duration::ZERO, |s| s.at) + self.settle
    }
}

/// Replays `script` into `session`, whose clock must be `clock`.
pub fn replay<U: UiAdapter>(script: &Script, session: &mut GameSession<U>, clock: &ManualClock) {
    for step in &script.steps {
        session.advance_to(clock, step.at);
        session.handle(step.event.clone().into());
    }
    session.advance_to(clock, script.end());

    let state = session.state();
    info!(
        steps = script.steps.len(),
        phase = %state.phase,
        score = state.score,
        "replay finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::GameConfig;

    fn parse(raw: &str) -> Result<Script, ScriptError> {
        Script::parse(raw, Path::new("test.yaml"))
    }

    #[test]
    fn test_parse_steps() {
        let script = parse(
            r"
steps:
  - at: 0s
    event: scene_loaded
  - at: 2500ms
    event: marker_found
  - at: 8s
    event: select
    service: s3
",
        )
        .unwrap();
        assert_eq!(script.settle, Duration::from_secs(10));
        assert_eq!(script.steps.len(), 3);
        assert_eq!(script.steps[1].at, Duration::from_millis(2500));
        assert_eq!(
            script.steps[2].event,
            ScriptEvent::Select {
                service: ServiceId::new("s3")
            }
        );
        assert_eq!(script.end(), Duration::from_secs(18));
    }

    #[test]
    fn test_unknown_event_is_parse_error() {
        let err = parse("steps:\n  - at: 1s\n    event: dance\n").unwrap_err();
        assert!(matches!(err, ScriptError::Parse { .. }));
    }

    #[test]
    fn test_validate_rejects_backwards_steps() {
        let script = parse(
            "steps:\n  - at: 2s\n    event: marker_found\n  - at: 1s\n    event: restart\n",
        )
        .unwrap();
        let err = script.validate(&GameConfig::default().bank()).unwrap_err();
        assert!(matches!(err, ScriptError::OutOfOrder { index: 1, .. }));
    }

    #[test]
    fn test_validate_rejects_unknown_service() {
        let script =
            parse("steps:\n  - at: 1s\n    event: select\n    service: dynamodb\n").unwrap();
        let err = script.validate(&GameConfig::default().bank()).unwrap_err();
        assert!(
            matches!(err, ScriptError::UnknownService { index: 0, ref service } if service == "dynamodb")
        );
    }

    #[test]
    fn test_empty_script_ends_after_settle() {
        let script = parse("settle: 3s\nsteps: []\n").unwrap();
        assert_eq!(script.end(), Duration::from_secs(3));
        assert!(script.validate(&GameConfig::default().bank()).is_ok());
    }
}
