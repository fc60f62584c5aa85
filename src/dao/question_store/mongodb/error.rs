use mongodb::error::Error as MongoError;
use thiserror::Error;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to reserve {count} question id(s)")]
    ReserveIds {
        count: usize,
        #[source]
        source: MongoError,
    },
    #[error("question id counter document is missing its sequence")]
    CounterMissing,
    #[error("failed to insert {count} question(s)")]
    InsertQuestions {
        count: usize,
        #[source]
        source: MongoError,
    },
    #[error("failed to sample a random question")]
    SampleQuestion {
        #[source]
        source: MongoError,
    },
}
