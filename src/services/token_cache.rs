use crate::constants::cache::TOKEN_TTL_MS;
use crate::services::logger::Logger;
use crate::services::token_cipher::SealedToken;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct CachedToken {
    pub sealed: SealedToken,
    pub inserted_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() < ttl
    }
}

#[derive(Default)]
struct CacheStats {
    hits: u64,
    misses: u64,
    writes: u64,
    evictions: u64,
}

/// Process-wide store of sealed bearer tokens.
///
/// Concurrent writers are not serialized: two requests refreshing at once both
/// write, and the later write wins.
#[derive(Clone)]
pub struct TokenCache {
    logger: Logger,
    entries: Arc<DashMap<String, CachedToken>>,
    ttl: Duration,
    stats: Arc<Mutex<CacheStats>>,
}

impl TokenCache {
    pub fn new(logger: Logger) -> Self {
        Self::with_ttl(logger, Duration::from_millis(TOKEN_TTL_MS))
    }

    pub fn with_ttl(logger: Logger, ttl: Duration) -> Self {
        Self {
            logger: logger.child("cache"),
            entries: Arc::new(DashMap::new()),
            ttl,
            stats: Arc::new(Mutex::new(CacheStats::default())),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &str) -> Option<SealedToken> {
        let entry = self.entries.get(key).map(|entry| entry.value().clone());
        let Some(entry) = entry else {
            self.bump(|stats| stats.misses += 1);
            return None;
        };
        if !entry.is_fresh(self.ttl) {
            if self
                .entries
                .remove_if(key, |_, current| !current.is_fresh(self.ttl))
                .is_some()
            {
                self.bump(|stats| stats.evictions += 1);
                self.logger.debug(
                    "Token cache entry expired",
                    Some(&serde_json::json!({"key": key})),
                );
            }
            self.bump(|stats| stats.misses += 1);
            return None;
        }
        self.bump(|stats| stats.hits += 1);
        Some(entry.sealed)
    }

    pub fn set(&self, key: &str, sealed: SealedToken) {
        self.entries.insert(
            key.to_string(),
            CachedToken {
                sealed,
                inserted_at: Instant::now(),
            },
        );
        self.bump(|stats| stats.writes += 1);
    }

    /// Evicts `key`; returns whether an entry was present.
    pub fn remove(&self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.bump(|stats| stats.evictions += 1);
        }
        removed
    }

    pub fn clear(&self) {
        let count = self.entries.len() as u64;
        self.entries.clear();
        self.bump(|stats| stats.evictions += count);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> Value {
        let stats = self.stats.lock().unwrap_or_else(|err| err.into_inner());
        serde_json::json!({
            "entries": self.entries.len(),
            "ttl_ms": self.ttl.as_millis() as u64,
            "hits": stats.hits,
            "misses": stats.misses,
            "writes": stats.writes,
            "evictions": stats.evictions,
        })
    }

    fn bump(&self, apply: impl FnOnce(&mut CacheStats)) {
        if let Ok(mut stats) = self.stats.lock() {
            apply(&mut stats);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sealed(tag: &str) -> SealedToken {
        SealedToken {
            ciphertext: "00".to_string(),
            iv: "11".to_string(),
            auth_tag: tag.to_string(),
        }
    }

    #[test]
    fn get_after_set_hits() {
        let cache = TokenCache::new(Logger::quiet("test"));
        assert!(cache.get("k").is_none());
        cache.set("k", sealed("a"));
        assert_eq!(cache.get("k"), Some(sealed("a")));
        let stats = cache.stats();
        assert_eq!(stats["hits"], 1);
        assert_eq!(stats["misses"], 1);
        assert_eq!(stats["writes"], 1);
    }

    #[test]
    fn last_write_wins() {
        let cache = TokenCache::new(Logger::quiet("test"));
        cache.set("k", sealed("a"));
        cache.set("k", sealed("b"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k"), Some(sealed("b")));
    }

    #[test]
    fn expired_entries_are_evicted_on_read() {
        let cache = TokenCache::with_ttl(Logger::quiet("test"), Duration::from_millis(10));
        cache.set("k", sealed("a"));
        std::thread::sleep(Duration::from_millis(25));
        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.stats()["evictions"], 1);
    }

    #[test]
    fn remove_and_clear() {
        let cache = TokenCache::new(Logger::quiet("test"));
        cache.set("a", sealed("a"));
        cache.set("b", sealed("b"));
        assert!(cache.remove("a"));
        assert!(!cache.remove("a"));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats()["evictions"], 2);
    }
}
