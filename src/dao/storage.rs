use std::error::Error;
use thiserror::Error;

/// Result alias shared by question stores and lock stores.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by any external backend (question bank or lock service).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    #[error("storage returned malformed data: {0}")]
    Malformed(String),
}

impl StorageError {
    /// Wrap a backend failure that left the store unreachable.
    pub fn unavailable(
        message: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        StorageError::Unavailable {
            message: message.into(),
            source: Box::new(source),
        }
    }
}
