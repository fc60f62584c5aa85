use std::{sync::Arc, time::Duration};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::debug;

use super::LockStore;
use crate::dao::storage::StorageResult;

const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Lock store living in process memory, suitable for single-replica deployments.
///
/// Atomicity comes from the shard lock taken by [`DashMap::entry`]: the check for an
/// existing live key and the insertion happen under the same guard.
#[derive(Clone, Default)]
pub struct InMemoryLockStore {
    entries: Arc<DashMap<String, LockEntry>>,
}

#[derive(Debug, Clone)]
struct LockEntry {
    owner: String,
    expires_at: Instant,
}

impl LockEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

impl InMemoryLockStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Owner of `key` if it is held and not yet expired.
    pub fn holder(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.owner.clone())
    }

    /// Number of keys currently stored, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired key.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.entries.len())
    }

    /// Periodically sweep expired keys until the store is dropped.
    pub fn spawn_sweeper(&self) {
        let weak = Arc::downgrade(&self.entries);
        tokio::spawn(async move {
            let mut ticker = interval(SWEEP_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let Some(entries) = weak.upgrade() else {
                    break;
                };

                let swept = InMemoryLockStore { entries }.sweep_expired();
                if swept > 0 {
                    debug!(swept, "swept expired claims");
                }
            }
        });
    }

    fn try_claim(&self, key: String, owner: String, ttl: Duration) -> bool {
        let now = Instant::now();
        let fresh = LockEntry {
            owner,
            expires_at: now + ttl,
        };

        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_live(now) {
                    false
                } else {
                    occupied.insert(fresh);
                    true
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(fresh);
                true
            }
        }
    }

    fn release_owned(&self, key: &str, owner: &str) -> bool {
        let now = Instant::now();
        self.entries
            .remove_if(key, |_, entry| entry.owner == owner && entry.is_live(now))
            .is_some()
    }
}

impl LockStore for InMemoryLockStore {
    fn set_if_absent(
        &self,
        key: String,
        value: String,
        ttl: Duration,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let granted = self.try_claim(key, value, ttl);
        Box::pin(async move { Ok(granted) })
    }

    fn release(&self, key: String, owner: String) -> BoxFuture<'static, StorageResult<bool>> {
        let released = self.release_owned(&key, &owner);
        Box::pin(async move { Ok(released) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn first_claim_wins_and_later_ones_are_denied() {
        let store = InMemoryLockStore::new();
        let key = "lock:question:1".to_string();

        assert!(store.set_if_absent(key.clone(), "10.0.0.1".into(), TTL).await.unwrap());
        assert!(!store.set_if_absent(key.clone(), "10.0.0.2".into(), TTL).await.unwrap());
        assert_eq!(store.holder(&key).as_deref(), Some("10.0.0.1"));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_claim_can_be_taken_over() {
        let store = InMemoryLockStore::new();
        let key = "lock:question:7".to_string();

        assert!(store.set_if_absent(key.clone(), "a".into(), TTL).await.unwrap());
        tokio::time::advance(Duration::from_millis(4_900)).await;
        assert!(!store.set_if_absent(key.clone(), "b".into(), TTL).await.unwrap());

        tokio::time::advance(Duration::from_millis(200)).await;
        assert!(store.holder(&key).is_none());
        assert!(store.set_if_absent(key.clone(), "b".into(), TTL).await.unwrap());
        assert_eq!(store.holder(&key).as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn release_only_succeeds_for_the_owner() {
        let store = InMemoryLockStore::new();
        let key = "lock:question:3".to_string();
        store.set_if_absent(key.clone(), "a".into(), TTL).await.unwrap();

        assert!(!store.release(key.clone(), "b".into()).await.unwrap());
        assert!(store.holder(&key).is_some());
        assert!(store.release(key.clone(), "a".into()).await.unwrap());
        assert!(store.holder(&key).is_none());
        assert!(!store.release(key, "a".into()).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_drops_only_expired_keys() {
        let store = InMemoryLockStore::new();
        store.set_if_absent("old".into(), "a".into(), Duration::from_secs(1)).await.unwrap();
        store.set_if_absent("new".into(), "a".into(), Duration::from_secs(60)).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.sweep_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.holder("new").is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_claims_produce_exactly_one_winner() {
        let store = InMemoryLockStore::new();
        let mut handles = Vec::new();
        for claimant in 0..64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .set_if_absent("lock:question:42".into(), format!("p{claimant}"), TTL)
                    .await
                    .unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
