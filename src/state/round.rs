//! The single authoritative "current question" of a coordinator.

use tokio::sync::RwLock;

use crate::dao::models::{QuestionEntity, QuestionId};

/// Question open for answers while it is current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub prompt: String,
    pub answer: String,
}

impl Question {
    /// Whether `submitted` matches the stored answer, ignoring case and surrounding whitespace.
    pub fn accepts(&self, submitted: &str) -> bool {
        normalize_answer(submitted) == normalize_answer(&self.answer)
    }
}

impl From<QuestionEntity> for Question {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id,
            prompt: value.question,
            answer: value.answer,
        }
    }
}

/// Canonical form used to compare answers.
pub fn normalize_answer(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Point-in-time view of the round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundSnapshot {
    /// Incremented by every publish.
    pub generation: u64,
    pub current: Option<Question>,
}

/// Holder of the current question. `None` means the round is exhausted (or never started).
///
/// Readers never wait on the lock store. Writers must be serialized by the caller; the
/// coordinator does so through its transition gate.
#[derive(Debug, Default)]
pub struct RoundState {
    inner: RwLock<RoundSnapshot>,
}

impl RoundState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current question, if any.
    pub async fn current(&self) -> Option<Question> {
        self.inner.read().await.current.clone()
    }

    /// Identifier of the current question, if any.
    pub async fn current_id(&self) -> Option<QuestionId> {
        self.inner.read().await.current.as_ref().map(|question| question.id)
    }

    pub async fn snapshot(&self) -> RoundSnapshot {
        self.inner.read().await.clone()
    }

    /// Replace the current question and return the value that is now authoritative.
    pub async fn publish(&self, next: Option<Question>) -> Option<Question> {
        let mut guard = self.inner.write().await;
        guard.generation += 1;
        guard.current = next;
        guard.current.clone()
    }
}
