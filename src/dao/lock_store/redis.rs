use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use redis::{Client, Script, aio::ConnectionManager};

use super::LockStore;
use crate::dao::storage::{StorageError, StorageResult};

/// Deletes the key only while it still holds the caller's value.
const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
end
return 0
"#;

/// Lock store backed by Redis, shared by every replica pointing at the same server.
#[derive(Clone)]
pub struct RedisLockStore {
    connection: ConnectionManager,
    release_script: Arc<Script>,
}

impl RedisLockStore {
    /// Open a managed (auto-reconnecting) connection to `redis_url`.
    pub async fn connect(redis_url: &str) -> StorageResult<Self> {
        let client = Client::open(redis_url)
            .map_err(|err| StorageError::unavailable(format!("invalid REDIS_URL: {err}"), err))?;
        let connection = ConnectionManager::new(client).await.map_err(|err| {
            StorageError::unavailable("unable to initialize Redis connection manager", err)
        })?;

        Ok(Self {
            connection,
            release_script: Arc::new(Script::new(RELEASE_SCRIPT)),
        })
    }
}

impl LockStore for RedisLockStore {
    fn set_if_absent(
        &self,
        key: String,
        value: String,
        ttl: Duration,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let mut connection = self.connection.clone();
        // PX takes whole milliseconds; never send 0, which Redis rejects.
        let ttl_ms = (ttl.as_millis() as u64).max(1);
        Box::pin(async move {
            // SET NX PX creates the key and its expiry in one command.
            let reply: Option<String> = redis::cmd("SET")
                .arg(&key)
                .arg(&value)
                .arg("NX")
                .arg("PX")
                .arg(ttl_ms)
                .query_async(&mut connection)
                .await
                .map_err(|err| {
                    StorageError::unavailable(format!("SET NX on `{key}` failed"), err)
                })?;
            Ok(reply.is_some())
        })
    }

    fn release(&self, key: String, owner: String) -> BoxFuture<'static, StorageResult<bool>> {
        let mut connection = self.connection.clone();
        let script = self.release_script.clone();
        Box::pin(async move {
            let deleted: i64 = script
                .key(&key)
                .arg(&owner)
                .invoke_async(&mut connection)
                .await
                .map_err(|err| {
                    StorageError::unavailable(format!("release of `{key}` failed"), err)
                })?;
            Ok(deleted > 0)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let mut connection = self.connection.clone();
        Box::pin(async move {
            let _: String = redis::cmd("PING")
                .query_async(&mut connection)
                .await
                .map_err(|err| StorageError::unavailable("Redis ping failed", err))?;
            Ok(())
        })
    }
}
