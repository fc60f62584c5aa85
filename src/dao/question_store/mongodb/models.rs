use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::dao::models::{QuestionEntity, QuestionId};

/// Shape of a document in the `questions` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoQuestionDocument {
    #[serde(rename = "_id")]
    pub id: QuestionId,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime,
}

impl From<QuestionEntity> for MongoQuestionDocument {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id,
            question: value.question,
            answer: value.answer,
            created_at: DateTime::now(),
        }
    }
}

impl From<MongoQuestionDocument> for QuestionEntity {
    fn from(value: MongoQuestionDocument) -> Self {
        Self {
            id: value.id,
            question: value.question,
            answer: value.answer,
        }
    }
}
