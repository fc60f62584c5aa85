pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{NewQuestionEntity, QuestionEntity, QuestionId};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

pub use self::memory::InMemoryQuestionStore;

/// Abstraction over the question bank feeding the rounds.
pub trait QuestionStore: Send + Sync {
    /// Pick one stored question at random, never returning `exclude`.
    ///
    /// Returns `None` once nothing eligible is left.
    fn fetch_random(
        &self,
        exclude: Option<QuestionId>,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>>;
    fn insert_question(
        &self,
        question: NewQuestionEntity,
    ) -> BoxFuture<'static, StorageResult<QuestionEntity>>;
    fn insert_questions(
        &self,
        questions: Vec<NewQuestionEntity>,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
