//! Question bank
//!
//! An ordered, immutable list of quiz items plus the closed set of
//! selectable services every answer must come from.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a selectable answer option (e.g. `"s3"`).
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(pub String);

impl ServiceId {
    /// Creates a new `ServiceId` from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single quiz item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Text shown to the player
    pub prompt: String,
    /// The one service that answers the prompt
    pub correct_answer: ServiceId,
    /// Short explanation of the answer
    #[serde(default)]
    pub explanation: String,
}

/// Ordered, immutable question list.
///
/// Cloning is cheap; questions are shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    services: Arc<[ServiceId]>,
    questions: Arc<[Question]>,
}

impl QuestionBank {
    /// Builds a bank from a validated service set and question list.
    ///
    /// Callers are expected to have validated that every answer belongs to
    /// `services`; see [`crate::config::Validator`].
    #[must_use]
    pub fn new(services: Vec<ServiceId>, questions: Vec<Question>) -> Self {
        Self {
            services: services.into(),
            questions: questions.into(),
        }
    }

    /// Number of questions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the bank holds no questions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Question at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// All questions in order.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// The closed set of selectable services.
    #[must_use]
    pub fn services(&self) -> &[ServiceId] {
        &self.services
    }

    /// Whether `service` belongs to the configured set.
    #[must_use]
    pub fn knows(&self, service: &ServiceId) -> bool {
        self.services.contains(service)
    }
}
