use crate::cache::Cache;
use async_trait::async_trait;
use dashmap::DashMap;
use ragcore_core::Result;
use std::time::{Duration, Instant};

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// In-process TTL cache double; entries past their expiry are treated as
/// absent on read but are not proactively swept.
#[derive(Default)]
pub struct InMemoryCache {
    entries: DashMap<String, Entry>,
}

impl InMemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self, key: &str) -> Option<Vec<u8>> {
        let entry = self.entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            None
        } else {
            Some(entry.value.clone())
        }
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.read(key))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        self.entries.insert(key.to_string(), Entry { value, expires_at: Instant::now() + ttl });
        Ok(())
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
        Ok(keys.iter().map(|k| self.read(k)).collect())
    }

    async fn mset(&self, entries: Vec<(String, Vec<u8>)>, ttl: Duration) -> Result<()> {
        for (key, value) in entries {
            self.set(&key, value, ttl).await?;
        }
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn expired_entries_read_as_absent() {
        let cache = InMemoryCache::new();
        cache.set("k", b"v".to_vec(), Duration::from_millis(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn mget_preserves_key_order() {
        let cache = InMemoryCache::new();
        cache.set("a", b"1".to_vec(), Duration::from_secs(60)).await.unwrap();
        cache.set("b", b"2".to_vec(), Duration::from_secs(60)).await.unwrap();
        let result = cache.mget(&["a".to_string(), "missing".to_string(), "b".to_string()]).await.unwrap();
        assert_eq!(result, vec![Some(b"1".to_vec()), None, Some(b"2".to_vec())]);
    }
}
