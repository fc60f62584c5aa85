//! Opening the question bank database once the server answers.

use std::time::Duration;

use mongodb::{Client, Database, bson::doc};
use tokio::time::sleep;
use tracing::{info, warn};

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
};

/// Longest pause between two pings while the bank is still coming up.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Pauses taken after each failed ping: doubling from `first`, capped at [`MAX_RETRY_DELAY`].
fn backoff(first: Duration) -> impl Iterator<Item = Duration> {
    std::iter::successors(Some(first.min(MAX_RETRY_DELAY)), |delay| {
        Some((*delay * 2).min(MAX_RETRY_DELAY))
    })
}

/// Build a client for `config` and hand back its database after a successful ping.
///
/// At most `config.connect_attempts` pings are sent (always at least one).
pub async fn open_database(config: &MongoConfig) -> MongoResult<Database> {
    let client = Client::with_options(config.options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(&config.database_name);
    let attempts = config.connect_attempts.max(1);
    let mut delays = backoff(config.retry_delay);
    let mut attempt = 1;

    loop {
        match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => {
                info!(database = %config.database_name, attempt, "question bank reachable");
                return Ok(database);
            }
            Err(source) if attempt >= attempts => {
                return Err(MongoDaoError::InitialPing { attempts, source });
            }
            Err(err) => {
                let delay = delays.next().unwrap_or(MAX_RETRY_DELAY);
                warn!(attempt, error = %err, retry_in = ?delay, "question bank ping failed");
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
