use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Collection, Database,
    bson::{Document, doc},
    options::ReturnDocument,
};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::open_database,
    error::{MongoDaoError, MongoResult},
    models::MongoQuestionDocument,
};
use crate::dao::{
    models::{NewQuestionEntity, QuestionEntity, QuestionId},
    question_store::QuestionStore,
    storage::{StorageError, StorageResult},
};

const QUESTION_COLLECTION_NAME: &str = "questions";
const COUNTER_COLLECTION_NAME: &str = "counters";
/// `_id` of the counter document handing out question ids.
const QUESTION_COUNTER_ID: &str = "questions";

/// Question bank stored in MongoDB with integer ids drawn from a counter document.
#[derive(Clone)]
pub struct MongoQuestionStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    database: RwLock<Database>,
    config: MongoConfig,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = self.database.read().await.clone();

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let database = open_database(&self.config).await?;
        *self.database.write().await = database;
        Ok(())
    }
}

impl MongoQuestionStore {
    /// Connect to MongoDB, pinging up to `config.connect_attempts` times.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let database = open_database(&config).await?;

        Ok(Self {
            inner: Arc::new(MongoInner {
                database: RwLock::new(database),
                config,
            }),
        })
    }

    async fn collection(&self) -> Collection<MongoQuestionDocument> {
        let guard = self.inner.database.read().await;
        guard.collection::<MongoQuestionDocument>(QUESTION_COLLECTION_NAME)
    }

    async fn counters(&self) -> Collection<Document> {
        let guard = self.inner.database.read().await;
        guard.collection::<Document>(COUNTER_COLLECTION_NAME)
    }

    /// Atomically reserve `count` consecutive ids and return the first one.
    async fn reserve_ids(&self, count: usize) -> MongoResult<QuestionId> {
        let step = count as i64;
        let updated = self
            .counters()
            .await
            .find_one_and_update(
                doc! { "_id": QUESTION_COUNTER_ID },
                doc! { "$inc": { "seq": step } },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::ReserveIds { count, source })?;

        let last = updated
            .and_then(|counter| counter.get_i64("seq").ok())
            .ok_or(MongoDaoError::CounterMissing)?;
        Ok(last - step + 1)
    }

    async fn insert_questions(
        &self,
        questions: Vec<NewQuestionEntity>,
    ) -> MongoResult<Vec<QuestionEntity>> {
        if questions.is_empty() {
            return Ok(Vec::new());
        }

        let count = questions.len();
        let first_id = self.reserve_ids(count).await?;
        let entities: Vec<QuestionEntity> = questions
            .into_iter()
            .zip(first_id..)
            .map(|(question, id)| question.with_id(id))
            .collect();
        let documents: Vec<MongoQuestionDocument> =
            entities.iter().cloned().map(Into::into).collect();

        self.collection()
            .await
            .insert_many(&documents)
            .await
            .map_err(|source| MongoDaoError::InsertQuestions { count, source })?;

        Ok(entities)
    }

    async fn fetch_random(
        &self,
        exclude: Option<QuestionId>,
    ) -> MongoResult<Option<QuestionEntity>> {
        let filter = match exclude {
            Some(id) => doc! { "_id": { "$ne": id } },
            None => doc! {},
        };
        let pipeline = vec![doc! { "$match": filter }, doc! { "$sample": { "size": 1 } }];

        let mut cursor = self
            .collection()
            .await
            .aggregate(pipeline)
            .await
            .map_err(|source| MongoDaoError::SampleQuestion { source })?
            .with_type::<MongoQuestionDocument>();

        let picked = cursor
            .try_next()
            .await
            .map_err(|source| MongoDaoError::SampleQuestion { source })?;
        Ok(picked.map(Into::into))
    }
}

impl QuestionStore for MongoQuestionStore {
    fn fetch_random(
        &self,
        exclude: Option<QuestionId>,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.fetch_random(exclude).await.map_err(Into::into) })
    }

    fn insert_question(
        &self,
        question: NewQuestionEntity,
    ) -> BoxFuture<'static, StorageResult<QuestionEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let mut stored = store.insert_questions(vec![question]).await?;
            stored
                .pop()
                .ok_or_else(|| StorageError::Malformed("insert returned no question".to_owned()))
        })
    }

    fn insert_questions(
        &self,
        questions: Vec<NewQuestionEntity>,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.insert_questions(questions).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
