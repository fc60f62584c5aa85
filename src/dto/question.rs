//! DTO definitions used by the question admin REST API and documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dao::models::{NewQuestionEntity, QuestionEntity, QuestionId},
    state::Question,
};

/// Payload describing a question to add to the bank.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateQuestionRequest {
    pub question: String,
    pub answer: String,
}

impl From<CreateQuestionRequest> for NewQuestionEntity {
    fn from(value: CreateQuestionRequest) -> Self {
        Self {
            question: value.question,
            answer: value.answer,
        }
    }
}

/// Stored question as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QuestionResponse {
    pub id: QuestionId,
    pub question: String,
    pub answer: String,
}

impl QuestionResponse {
    /// Placeholder returned by `/current_question` while no round is open.
    pub fn no_active_question() -> Self {
        Self {
            id: 0,
            question: "No active question".into(),
            answer: String::new(),
        }
    }
}

impl From<QuestionEntity> for QuestionResponse {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id,
            question: value.question,
            answer: value.answer,
        }
    }
}

impl From<Question> for QuestionResponse {
    fn from(value: Question) -> Self {
        Self {
            id: value.id,
            question: value.prompt,
            answer: value.answer,
        }
    }
}
