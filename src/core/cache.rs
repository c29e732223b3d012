use async_trait::async_trait;
use std::hash::Hash;
use std::time::Duration;

/// Key-value cache whose entries go stale after a per-entry TTL.
#[async_trait]
pub trait Cache<K, V>: Send + Sync
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    /// Returns the value for `key` unless it is missing or expired.
    async fn get(&self, key: &K) -> Option<V>;

    /// Stores `value`, replacing any previous entry for `key`.
    async fn put(&self, key: K, value: V, ttl: Duration);
}
