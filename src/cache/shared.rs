//! Shared Cache Handle
//!
//! Cloneable handle over a `CacheStore` behind a single `tokio::sync::RwLock`.
//! Every mutating call, the sweeper included, takes the write lock; pure
//! probes take the read lock and may run alongside each other.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::cache::events::{CacheEvent, EventKind, SubscriptionId};
use crate::cache::{CacheStats, CacheStore, EntryInfo, EvictionPolicy, SweepReport};
use crate::config::{CacheConfig, ConfigUpdate};
use crate::error::Result;

// == Cache ==
/// Thread-safe handle to one cache instance. Clones share the same store.
#[derive(Debug)]
pub struct Cache<V> {
    inner: Arc<RwLock<CacheStore<V>>>,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Cache<V>
where
    V: Serialize + Clone,
{
    /// Creates a cache, rejecting an invalid configuration.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Ok(Self::from_store(CacheStore::new(config)?))
    }

    pub fn from_store(store: CacheStore<V>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) -> bool {
        self.inner.write().await.set(key, value, ttl)
    }

    /// Takes the write lock: a hit updates recency and counters.
    pub async fn get(&self, key: &str) -> Option<V> {
        self.inner.write().await.get(key)
    }

    pub async fn has(&self, key: &str) -> bool {
        self.inner.read().await.has(key)
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.inner.write().await.delete(key)
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.inner.read().await.keys()
    }

    pub async fn values(&self) -> Vec<V> {
        self.inner.read().await.values()
    }

    pub async fn entries(&self) -> Vec<(String, V)> {
        self.inner.read().await.entries()
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.read().await.stats()
    }

    pub async fn entry_info(&self, key: &str) -> Option<EntryInfo> {
        self.inner.read().await.entry_info(key)
    }

    pub async fn config(&self) -> CacheConfig {
        self.inner.read().await.config().clone()
    }

    pub async fn set_policy(&self, policy: EvictionPolicy) {
        self.inner.write().await.set_policy(policy)
    }

    pub async fn set_policy_by_name(&self, name: &str) -> Result<()> {
        self.inner.write().await.set_policy_by_name(name)
    }

    pub async fn update_config(&self, update: ConfigUpdate) -> Result<()> {
        self.inner.write().await.update_config(update)
    }

    pub async fn sweep(&self) -> SweepReport {
        self.inner.write().await.sweep()
    }

    pub async fn on_event<F>(&self, kind: EventKind, callback: F) -> SubscriptionId
    where
        F: Fn(&CacheEvent) + Send + Sync + 'static,
    {
        self.inner.write().await.on_event(kind, callback)
    }

    pub async fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.write().await.unsubscribe(id)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn cache(max_size: usize) -> Cache<String> {
        Cache::new(CacheConfig {
            max_size,
            ..CacheConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_clones_share_store() {
        let cache = cache(10);
        let other = cache.clone();

        assert!(cache.set("key", "value".to_string(), None).await);
        assert_eq!(other.get("key").await, Some("value".to_string()));
        assert_eq!(other.stats().await.hits, 1);
    }

    #[tokio::test]
    async fn test_concurrent_sets_respect_capacity() {
        let cache = cache(16);

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let cache = cache.clone();
                tokio::spawn(async move {
                    for n in 0..50 {
                        cache.set(format!("w{worker}-{n}"), "v".to_string(), None).await;
                        let _ = cache.get(&format!("w{worker}-{}", n / 2)).await;
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let stats = cache.stats().await;
        assert_eq!(stats.size, 16);
        assert_eq!(stats.memory_usage, 16 * 3);
        assert_eq!(stats.sets, 400);
        assert_eq!(stats.hits + stats.misses, 400);
    }

    #[tokio::test]
    async fn test_policy_and_config_updates() {
        let cache = cache(10);

        assert_ok!(cache.set_policy_by_name("LFU").await);
        assert_err!(cache.set_policy_by_name("ARC").await);
        assert_eq!(cache.config().await.policy, EvictionPolicy::Lfu);

        assert_ok!(
            cache
                .update_config(ConfigUpdate {
                    max_memory: Some(4096),
                    ..ConfigUpdate::default()
                })
                .await
        );
        assert_err!(
            cache
                .update_config(ConfigUpdate {
                    max_size: Some(0),
                    ..ConfigUpdate::default()
                })
                .await
        );

        let config = cache.config().await;
        assert_eq!(config.max_memory, 4096);
        assert_eq!(config.max_size, 10);
    }

    #[tokio::test]
    async fn test_snapshots_and_clear() {
        let cache = cache(10);
        cache.set("b", "2".to_string(), None).await;
        cache.set("a", "1".to_string(), None).await;

        assert_eq!(cache.keys().await, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(cache.values().await.len(), 2);
        assert_eq!(cache.entries().await[0].1, "1");
        assert!(cache.has("a").await);

        cache.clear().await;
        assert!(cache.is_empty().await);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_subscribe_through_handle() {
        let cache = cache(10);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let id = cache
            .on_event(EventKind::Delete, move |event| {
                let _ = tx.send(event.clone());
            })
            .await;

        cache.set("k", "v".to_string(), None).await;
        assert!(cache.delete("k").await);
        assert_eq!(
            rx.recv().await,
            Some(CacheEvent::Delete {
                key: "k".to_string()
            })
        );

        assert!(cache.unsubscribe(id).await);
        // Dropping the only callback closes the channel
        assert_eq!(rx.recv().await, None);
    }
}
