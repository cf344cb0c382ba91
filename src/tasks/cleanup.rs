//! Expiry Sweeper Task
//!
//! Background task that periodically removes expired cache entries and
//! re-establishes the size and memory limits.

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::Cache;

/// Spawns a background task that periodically sweeps the cache.
///
/// The task sleeps for the configured `cleanup_interval_ms` between passes
/// and reads it again before every sleep, so interval changes apply from the
/// next tick. Each pass takes the cache's write lock like any caller.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Cache::new(CacheConfig::default())?;
/// let cleanup_handle = spawn_cleanup_task(cache.clone());
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<V>(cache: Cache<V>) -> JoinHandle<()>
where
    V: Serialize + Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(
            "Starting expiry sweeper with interval of {} ms",
            cache.config().await.cleanup_interval_ms
        );

        loop {
            let interval = cache.config().await.cleanup_interval();
            tokio::time::sleep(interval).await;

            // The store logs and publishes the outcome of each pass
            cache.sweep().await;
        }
    })
}
