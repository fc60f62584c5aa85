//! Process-local question bank used when no database is configured.

use std::sync::Arc;

use futures::future::BoxFuture;
use rand::seq::IndexedRandom;
use tokio::sync::RwLock;

use super::QuestionStore;
use crate::dao::{
    models::{NewQuestionEntity, QuestionEntity, QuestionId},
    storage::StorageResult,
};

/// Question bank kept in memory; identifiers are assigned sequentially from 1.
#[derive(Clone, Default)]
pub struct InMemoryQuestionStore {
    inner: Arc<RwLock<Bank>>,
}

#[derive(Default)]
struct Bank {
    questions: Vec<QuestionEntity>,
    last_id: QuestionId,
}

impl Bank {
    fn push(&mut self, question: NewQuestionEntity) -> QuestionEntity {
        self.last_id += 1;
        let stored = question.with_id(self.last_id);
        self.questions.push(stored.clone());
        stored
    }
}

impl InMemoryQuestionStore {
    /// Create an empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bank pre-filled with `questions`.
    pub fn seeded(questions: impl IntoIterator<Item = NewQuestionEntity>) -> Self {
        let mut bank = Bank::default();
        for question in questions {
            bank.push(question);
        }
        Self {
            inner: Arc::new(RwLock::new(bank)),
        }
    }

    /// Number of stored questions.
    pub async fn len(&self) -> usize {
        self.inner.read().await.questions.len()
    }
}

impl QuestionStore for InMemoryQuestionStore {
    fn fetch_random(
        &self,
        exclude: Option<QuestionId>,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let bank = inner.read().await;
            let eligible: Vec<&QuestionEntity> = bank
                .questions
                .iter()
                .filter(|question| Some(question.id) != exclude)
                .collect();
            let picked = eligible.choose(&mut rand::rng()).map(|q| (*q).clone());
            Ok(picked)
        })
    }

    fn insert_question(
        &self,
        question: NewQuestionEntity,
    ) -> BoxFuture<'static, StorageResult<QuestionEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.write().await.push(question)) })
    }

    fn insert_questions(
        &self,
        questions: Vec<NewQuestionEntity>,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut bank = inner.write().await;
            Ok(questions
                .into_iter()
                .map(|question| bank.push(question))
                .collect())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_question(question: &str, answer: &str) -> NewQuestionEntity {
        NewQuestionEntity {
            question: question.into(),
            answer: answer.into(),
        }
    }

    #[tokio::test]
    async fn empty_bank_has_nothing_to_fetch() {
        let store = InMemoryQuestionStore::new();
        assert!(store.fetch_random(None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn inserts_assign_sequential_ids() {
        let store = InMemoryQuestionStore::new();
        let first = store
            .insert_question(new_question("2+2?", "4"))
            .await
            .unwrap();
        let batch = store
            .insert_questions(vec![
                new_question("Capital of France?", "Paris"),
                new_question("Color of the sky?", "Blue"),
            ])
            .await
            .unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(batch.iter().map(|q| q.id).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn fetch_random_skips_the_excluded_question() {
        let store = InMemoryQuestionStore::seeded(vec![
            new_question("2+2?", "4"),
            new_question("3+3?", "6"),
        ]);

        for _ in 0..20 {
            let picked = store.fetch_random(Some(1)).await.unwrap().unwrap();
            assert_eq!(picked.id, 2);
        }
    }

    #[tokio::test]
    async fn excluding_the_only_question_exhausts_the_bank() {
        let store = InMemoryQuestionStore::seeded(vec![new_question("2+2?", "4")]);
        assert!(store.fetch_random(Some(1)).await.unwrap().is_none());
        assert!(store.fetch_random(None).await.unwrap().is_some());
    }
}
