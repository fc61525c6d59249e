//! Content cache
//!
//! Section documents change rarely, so reads are served from an in-process
//! cache (moka). Entries expire after the configured TTL and every copy of a
//! section is dropped whenever an update succeeds.

pub mod memory;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

pub use memory::MemoryCache;

/// Cache layer trait
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a document from cache
    async fn get(&self, key: &str) -> Option<Value>;

    /// Store a document, replacing any previous entry
    async fn set(&self, key: &str, value: Value);

    /// Delete a document; missing keys are a no-op
    async fn delete(&self, key: &str);

    /// Delete every document whose key starts with `prefix`
    async fn delete_prefix(&self, prefix: &str);
}

/// Shared cache handle
pub type DynCache = Arc<dyn CacheLayer>;

/// Create the cache described by the configuration
pub fn create_cache(config: &CacheConfig) -> DynCache {
    Arc::new(MemoryCache::with_capacity_and_ttl(
        config.max_capacity,
        Duration::from_secs(config.ttl_seconds),
    ))
}
