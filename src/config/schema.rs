//! Configuration schema
//!
//! YAML shape of a poster game: the selectable services, the question bank,
//! choreography timings, the marker debounce window, message texts and
//! analytics settings. Durations are written as humantime strings
//! (`1500ms`, `2s`).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bank::{Question, QuestionBank, ServiceId};

/// Complete game configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GameConfig {
    /// Closed set of selectable services
    pub services: Vec<ServiceId>,
    /// Ordered question bank
    pub questions: Vec<Question>,
    /// Choreography timings
    #[serde(default)]
    pub timings: Timings,
    /// Marker tracking settings
    #[serde(default)]
    pub marker: MarkerConfig,
    /// Player-facing texts
    #[serde(default)]
    pub messages: Messages,
    /// Analytics settings
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

impl GameConfig {
    /// Builds the question bank described by this configuration.
    #[must_use]
    pub fn bank(&self) -> QuestionBank {
        QuestionBank::new(self.services.clone(), self.questions.clone())
    }
}

impl Default for GameConfig {
    /// The three-question cloud services poster game.
    fn default() -> Self {
        let q = |prompt: &str, answer: &str, explanation: &str| Question {
            prompt: prompt.to_owned(),
            correct_answer: ServiceId::new(answer),
            explanation: explanation.to_owned(),
        };
        Self {
            services: vec![
                ServiceId::new("s3"),
                ServiceId::new("lambda"),
                ServiceId::new("ec2"),
            ],
            questions: vec![
                q(
                    "Which AWS service is used for object storage?",
                    "s3",
                    "Amazon S3 (Simple Storage Service) provides object storage!",
                ),
                q(
                    "Which service runs code without managing servers?",
                    "lambda",
                    "AWS Lambda lets you run code serverlessly!",
                ),
                q(
                    "Which service provides virtual servers in the cloud?",
                    "ec2",
                    "Amazon EC2 provides scalable virtual servers!",
                ),
            ],
            timings: Timings::default(),
            marker: MarkerConfig::default(),
            messages: Messages::default(),
            analytics: AnalyticsConfig::default(),
        }
    }
}

/// Delays and display times of the game's choreography.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Timings {
    /// Loading screen stays up this long after the scene loads
    #[serde(with = "humantime_serde_str")]
    pub loading_screen: Duration,
    /// First marker detection to welcome message
    #[serde(with = "humantime_serde_str")]
    pub welcome_delay: Duration,
    /// Welcome message display time; the first question follows it
    #[serde(with = "humantime_serde_str")]
    pub welcome_duration: Duration,
    /// Display time of answer feedback messages
    #[serde(with = "humantime_serde_str")]
    pub message_duration: Duration,
    /// Answer to question-panel fade out and index advance
    #[serde(with = "humantime_serde_str")]
    pub advance_delay: Duration,
    /// Panel fade out to the next question
    #[serde(with = "humantime_serde_str")]
    pub next_question_delay: Duration,
    /// Confetti visibility after a correct answer
    #[serde(with = "humantime_serde_str")]
    pub confetti_duration: Duration,
    /// Badge reveal to completion panel
    #[serde(with = "humantime_serde_str")]
    pub completion_panel_delay: Duration,
    /// Restart to the first question
    #[serde(with = "humantime_serde_str")]
    pub restart_delay: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            loading_screen: Duration::from_millis(2000),
            welcome_delay: Duration::from_millis(1500),
            welcome_duration: Duration::from_millis(3000),
            message_duration: Duration::from_millis(2000),
            advance_delay: Duration::from_millis(2000),
            next_question_delay: Duration::from_millis(500),
            confetti_duration: Duration::from_millis(3000),
            completion_panel_delay: Duration::from_millis(2000),
            restart_delay: Duration::from_millis(500),
        }
    }
}

/// Marker tracking settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkerConfig {
    /// How long a `lost` must hold before the game pauses; `0s` disables
    #[serde(with = "humantime_serde_str")]
    pub debounce: Duration,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
        }
    }
}

/// Player-facing texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Messages {
    /// Welcome banner
    pub welcome: String,
    /// Correct answer feedback
    pub correct: String,
    /// Wrong answer feedback
    pub incorrect: String,
    /// Selfie confirmation
    pub selfie_saved: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            welcome: "Welcome to #SheBuildsOnAWS!\nLet's play a quick game!".to_owned(),
            correct: "✅ Correct! Great job!".to_owned(),
            incorrect: "❌ Not quite right, but keep learning!".to_owned(),
            selfie_saved: "📸 Selfie saved!".to_owned(),
        }
    }
}

/// Analytics settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyticsConfig {
    /// Client label stamped on every record
    pub client: Option<String>,
    /// Store key under which the session id is kept
    pub session_key: String,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            client: None,
            session_key: crate::session_id::SESSION_ID_KEY.to_owned(),
        }
    }
}

/// Serde adapter reading and writing durations as humantime strings.
pub(crate) mod humantime_serde_str {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&humantime::format_duration(*d).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
    }
}
