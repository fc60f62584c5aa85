use serde::{Deserialize, Serialize};

/// Numeric identifier of a stored question.
pub type QuestionId = i64;

/// Question as persisted by a [`QuestionStore`](crate::dao::question_store::QuestionStore).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Identifier assigned by the store on insertion.
    pub id: QuestionId,
    /// Prompt shown to the players.
    pub question: String,
    /// Expected answer, compared case- and whitespace-insensitively.
    pub answer: String,
}

/// Question payload before the store assigns it an identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewQuestionEntity {
    pub question: String,
    pub answer: String,
}

impl NewQuestionEntity {
    /// Attach the identifier chosen by the store.
    pub fn with_id(self, id: QuestionId) -> QuestionEntity {
        QuestionEntity {
            id,
            question: self.question,
            answer: self.answer,
        }
    }
}
