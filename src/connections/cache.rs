//! Per-connection schema cache with a fixed time-to-live.
//!
//! Read-through only: an expired entry is simply a miss and is replaced the
//! next time the caller stores fresh text. Every eviction bumps the
//! connection's generation so a fetch started before it cannot store its
//! result afterwards.

use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CachedSchema {
    pub schema_text: String,
    pub captured_at: Instant,
}

pub struct SchemaCache {
    ttl: Duration,
    entries: DashMap<String, CachedSchema>,
    generations: DashMap<String, u64>,
}

impl SchemaCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
            generations: DashMap::new(),
        }
    }

    pub fn get(&self, connection_id: &str) -> Option<String> {
        let entry = self.entries.get(connection_id)?;
        if entry.captured_at.elapsed() < self.ttl {
            debug!("Using cached schema for {}", connection_id);
            Some(entry.schema_text.clone())
        } else {
            None
        }
    }

    pub fn set(&self, connection_id: &str, schema_text: String) {
        self.entries.insert(
            connection_id.to_string(),
            CachedSchema {
                schema_text,
                captured_at: Instant::now(),
            },
        );
    }

    pub fn generation(&self, connection_id: &str) -> u64 {
        self.generations.get(connection_id).map_or(0, |g| *g)
    }

    /// Store `schema_text` only if no eviction happened since `generation`
    /// was read.
    pub fn set_if_current(&self, connection_id: &str, schema_text: String, generation: u64) -> bool {
        // Generation shard stays locked until the entry is written
        let current = self.generations.entry(connection_id.to_string()).or_insert(0);
        if *current != generation {
            debug!("Discarding stale schema for {}", connection_id);
            return false;
        }
        self.set(connection_id, schema_text);
        true
    }

    pub fn evict(&self, connection_id: &str) {
        let mut current = self.generations.entry(connection_id.to_string()).or_insert(0);
        *current += 1;
        self.entries.remove(connection_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = SchemaCache::new(Duration::from_secs(60));
        cache.set("default", "Table: t".to_string());

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get("default").as_deref(), Some("Table: t"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("default").is_none());
    }

    #[tokio::test]
    async fn test_evict() {
        let cache = SchemaCache::new(Duration::from_secs(60));
        cache.set("a", "x".to_string());
        cache.evict("a");
        assert!(cache.get("a").is_none());
    }

    #[tokio::test]
    async fn test_set_after_eviction_is_discarded() {
        let cache = SchemaCache::new(Duration::from_secs(60));
        let before = cache.generation("db");
        cache.evict("db");

        assert!(!cache.set_if_current("db", "Table: old".to_string(), before));
        assert!(cache.get("db").is_none());

        let now = cache.generation("db");
        assert_eq!(now, before + 1);
        assert!(cache.set_if_current("db", "Table: new".to_string(), now));
        assert_eq!(cache.get("db").as_deref(), Some("Table: new"));
    }
}
