use std::time::Duration;

use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};
use crate::config::AppConfig;

/// Database used when `MONGO_DB` is unset or blank.
const DEFAULT_DATABASE: &str = "trivia";

/// Where the question bank lives and how long to wait for it on connect.
#[derive(Clone)]
pub struct MongoConfig {
    pub options: ClientOptions,
    pub database_name: String,
    /// Pings sent before a connect attempt counts as failed.
    pub connect_attempts: u32,
    /// Pause after the first failed ping; later pauses double.
    pub retry_delay: Duration,
}

impl MongoConfig {
    /// Parse `uri`, pick `database` (or `trivia`) and take the ping retry timing from `app`.
    pub async fn resolve(uri: &str, database: Option<&str>, app: &AppConfig) -> MongoResult<Self> {
        let options = ClientOptions::parse(uri)
            .await
            .map_err(|source| MongoDaoError::InvalidUri {
                uri: uri.to_owned(),
                source,
            })?;
        let database_name = database
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_DATABASE)
            .to_owned();

        Ok(Self {
            options,
            database_name,
            connect_attempts: app.question_store_connect_attempts(),
            retry_delay: app.question_store_retry_delay(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn retry_timing_follows_the_app_config() {
        let app = AppConfig::from_json_str(
            r#"{"question_store_connect_attempts": 2, "question_store_retry_delay_ms": 100}"#,
        )
        .unwrap();
        let config = MongoConfig::resolve("mongodb://localhost:27017", Some(" "), &app)
            .await
            .unwrap();

        assert_eq!(config.database_name, "trivia");
        assert_eq!(config.connect_attempts, 2);
        assert_eq!(config.retry_delay, Duration::from_millis(100));
    }

    #[tokio::test]
    async fn unparsable_uri_is_rejected() {
        let result = MongoConfig::resolve("not a uri", None, &AppConfig::default()).await;
        assert!(matches!(result, Err(MongoDaoError::InvalidUri { .. })));
    }
}
