//! Configuration Module
//!
//! Cache limits and policy, partial runtime updates, and the server
//! configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::EvictionPolicy;
use crate::error::{CacheError, Result};

// == Defaults ==
pub const DEFAULT_MAX_SIZE: usize = 1000;
pub const DEFAULT_MAX_MEMORY: usize = 50 * 1024 * 1024; // 50 MiB
pub const DEFAULT_TTL_MS: u64 = 300_000;
pub const DEFAULT_CLEANUP_INTERVAL_MS: u64 = 60_000;
pub const DEFAULT_SERVER_PORT: u16 = 3000;

// == Cache Config ==
/// Limits and policy of a single cache instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries
    pub max_size: usize,
    /// Maximum summed entry size in bytes
    pub max_memory: usize,
    /// Default entry lifetime in milliseconds; 0 means entries never expire
    pub default_ttl_ms: u64,
    /// Expiry sweep period in milliseconds
    pub cleanup_interval_ms: u64,
    /// Active eviction policy
    pub policy: EvictionPolicy,
}

impl CacheConfig {
    // == Validate ==
    /// Rejects limits the cache cannot honor. Nothing is clamped.
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(CacheError::InvalidConfig(
                "max_size must be greater than 0".to_string(),
            ));
        }
        if self.max_memory == 0 {
            return Err(CacheError::InvalidConfig(
                "max_memory must be greater than 0".to_string(),
            ));
        }
        if self.cleanup_interval_ms == 0 {
            return Err(CacheError::InvalidConfig(
                "cleanup_interval_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Default lifetime, or `None` when entries never expire by default.
    pub fn default_ttl(&self) -> Option<Duration> {
        (self.default_ttl_ms > 0).then(|| Duration::from_millis(self.default_ttl_ms))
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }

    // == Merge ==
    /// Returns a validated copy with `update` applied on top.
    pub fn merged(&self, update: &ConfigUpdate) -> Result<Self> {
        let merged = Self {
            max_size: update.max_size.unwrap_or(self.max_size),
            max_memory: update.max_memory.unwrap_or(self.max_memory),
            default_ttl_ms: update.default_ttl_ms.unwrap_or(self.default_ttl_ms),
            cleanup_interval_ms: update
                .cleanup_interval_ms
                .unwrap_or(self.cleanup_interval_ms),
            policy: update.policy.unwrap_or(self.policy),
        };
        merged.validate()?;
        Ok(merged)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            max_memory: DEFAULT_MAX_MEMORY,
            default_ttl_ms: DEFAULT_TTL_MS,
            cleanup_interval_ms: DEFAULT_CLEANUP_INTERVAL_MS,
            policy: EvictionPolicy::default(),
        }
    }
}

// == Config Update ==
/// Partial configuration; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub max_size: Option<usize>,
    #[serde(default)]
    pub max_memory: Option<usize>,
    #[serde(default)]
    pub default_ttl_ms: Option<u64>,
    #[serde(default)]
    pub cleanup_interval_ms: Option<u64>,
    #[serde(default)]
    pub policy: Option<EvictionPolicy>,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

// == Server Config ==
/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Cache limits and policy
    pub cache: CacheConfig,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_SIZE` - Maximum cache entries (default: 1000)
    /// - `MAX_MEMORY` - Maximum cache memory in bytes (default: 50 MiB)
    /// - `DEFAULT_TTL_MS` - Default TTL in milliseconds, 0 disables expiry (default: 300000)
    /// - `CLEANUP_INTERVAL_MS` - Sweep frequency in milliseconds (default: 60000)
    /// - `EVICTION_POLICY` - One of LRU, LFU, FIFO (default: LRU)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    ///
    /// Values that are set but cannot be parsed are reported, not replaced by defaults.
    pub fn from_env() -> Result<Self> {
        let cache = CacheConfig {
            max_size: env_or("MAX_SIZE", DEFAULT_MAX_SIZE)?,
            max_memory: env_or("MAX_MEMORY", DEFAULT_MAX_MEMORY)?,
            default_ttl_ms: env_or("DEFAULT_TTL_MS", DEFAULT_TTL_MS)?,
            cleanup_interval_ms: env_or("CLEANUP_INTERVAL_MS", DEFAULT_CLEANUP_INTERVAL_MS)?,
            policy: env_or("EVICTION_POLICY", EvictionPolicy::default())?,
        };
        cache.validate()?;

        Ok(Self {
            server_port: env_or("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            cache,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: DEFAULT_SERVER_PORT,
            cache: CacheConfig::default(),
        }
    }
}

fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| CacheError::InvalidConfig(format!("{name}={raw:?}: {e}"))),
        Err(_) => Ok(default),
    }
}
