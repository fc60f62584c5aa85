//! Shared coordination store providing atomic create-if-absent with expiry.
//!
//! The presence of a key *is* the claim: whoever creates it first owns the right to have
//! their answer evaluated until the key expires. Replicas that share one lock store agree
//! on a single winner per key regardless of message arrival order.

pub mod memory;
#[cfg(feature = "redis-lock")]
pub mod redis;

use std::time::Duration;

use futures::future::BoxFuture;

use crate::dao::storage::StorageResult;

pub use self::memory::InMemoryLockStore;

/// Atomic set-if-absent primitive used to arbitrate concurrent claims.
pub trait LockStore: Send + Sync {
    /// Create `key` holding `value` with an expiry of `ttl`, applied in the same atomic step.
    ///
    /// Resolves to `true` only for the call that created the key.
    fn set_if_absent(
        &self,
        key: String,
        value: String,
        ttl: Duration,
    ) -> BoxFuture<'static, StorageResult<bool>>;

    /// Delete `key` if it is still held by `owner`; resolves to whether a key was deleted.
    fn release(&self, key: String, owner: String) -> BoxFuture<'static, StorageResult<bool>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
