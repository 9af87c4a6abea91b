//! ABOUTME: Optional cache trait keyed by SHA-256 digest of inputs; downgrades silently when unavailable

use async_trait::async_trait;
use ragcore_core::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>>;

    async fn mset(&self, entries: Vec<(String, Vec<u8>)>, ttl: Duration) -> Result<()>;

    /// Drops every entry. Used by the monitoring `cache/flush` admin action;
    /// not on the request hot path.
    async fn flush(&self) -> Result<()>;
}

/// Point-in-time hit-rate snapshot, surfaced by the monitoring endpoints and
/// fed into `ragcore-trace::AlertInputs::cache_hit_rate`.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Wraps any [`Cache`] to count hits and misses on single-key reads, without
/// changing its behavior. The pipeline's actual cache lookups live in
/// `ragcore-retrieval`; this decorator is what lets the monitoring surface
/// report a hit rate without that crate depending on `ragcore-trace`.
pub struct InstrumentedCache {
    inner: Arc<dyn Cache>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl InstrumentedCache {
    #[must_use]
    pub fn new(inner: Arc<dyn Cache>) -> Self {
        Self { inner, hits: AtomicU64::new(0), misses: AtomicU64::new(0) }
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats { hits: self.hits.load(Ordering::Relaxed), misses: self.misses.load(Ordering::Relaxed) }
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

#[async_trait]
impl Cache for InstrumentedCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self.inner.get(key).await?;
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
        let values = self.inner.mget(keys).await?;
        for value in &values {
            if value.is_some() {
                self.hits.fetch_add(1, Ordering::Relaxed);
            } else {
                self.misses.fetch_add(1, Ordering::Relaxed);
            }
        }
        Ok(values)
    }

    async fn mset(&self, entries: Vec<(String, Vec<u8>)>, ttl: Duration) -> Result<()> {
        self.inner.mset(entries, ttl).await
    }

    async fn flush(&self) -> Result<()> {
        self.reset();
        self.inner.flush().await
    }
}

/// SHA-256 hex digest used as the cache key for a set of inputs (e.g. an
/// embedding request's model+text, or a rerank request's query+documents).
#[must_use]
pub fn cache_key(parts: &[&str]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update(b"\0");
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_stable_and_order_sensitive() {
        let a = cache_key(&["model-x", "hello world"]);
        let b = cache_key(&["model-x", "hello world"]);
        let c = cache_key(&["hello world", "model-x"]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
