//! Content-addressed caches with bounded size and a time-to-live.

use std::num::NonZeroUsize;
use std::time::Duration;

use lru::LruCache;
use sha2::{Digest, Sha256};
use tokio::time::Instant;

use crate::config::CachePolicy;
use crate::theme::ThemeName;

/// Hex SHA-256 of the raw, untrimmed text.
pub fn fingerprint(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// Key of the validation cache.
pub fn validation_key(text: &str) -> String {
    fingerprint(text)
}

/// Key of the render cache. A hex digest never contains ':' and neither does
/// a theme id, so distinct (text, theme) pairs never share a key.
pub fn render_key(text: &str, theme: ThemeName) -> String {
    format!("{}:{}", fingerprint(text), theme.id())
}

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    created_at: Instant,
}

/// Bounded cache keyed by content fingerprints.
///
/// Eviction order follows insertion and update, not reads: `get` peeks
/// without promoting the entry. Entries expire `ttl` after their last `set`.
#[derive(Debug)]
pub struct HashCache<T> {
    entries: LruCache<String, CacheEntry<T>>,
    ttl: Duration,
}

impl<T: Clone> HashCache<T> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            ttl,
        }
    }

    pub fn with_policy(policy: CachePolicy) -> Self {
        Self::new(policy.capacity, policy.ttl())
    }

    pub fn get(&mut self, key: &str) -> Option<T> {
        let expired = match self.entries.peek(key) {
            Some(entry) => self.is_expired(entry),
            None => return None,
        };

        if expired {
            self.entries.pop(key);
            return None;
        }

        self.entries.peek(key).map(|entry| entry.value.clone())
    }

    pub fn set(&mut self, key: impl Into<String>, value: T) {
        let entry = CacheEntry {
            value,
            created_at: Instant::now(),
        };
        let key = key.into();
        // `push` hands back the old pair on update as well as on eviction.
        if let Some((displaced, _)) = self.entries.push(key.clone(), entry) {
            if displaced != key {
                tracing::trace!(key = %displaced, "evicted cache entry");
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Drops every expired entry now instead of waiting for a `get` to hit it.
    pub fn cleanup(&mut self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| self.is_expired(entry))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.entries.pop(key);
        }
        expired.len()
    }

    fn is_expired(&self, entry: &CacheEntry<T>) -> bool {
        entry.created_at.elapsed() >= self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[test]
    fn set_then_get_returns_value() {
        let mut cache = HashCache::new(4, TTL);
        cache.set("k", 7);
        assert_eq!(cache.get("k"), Some(7));
        assert_eq!(cache.get("missing"), None);
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn overflow_evicts_exactly_the_oldest_entry() {
        let mut cache = HashCache::new(3, TTL);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);
        cache.set("d", 4);

        assert_eq!(cache.size(), 3);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.get("c"), Some(3));
        assert_eq!(cache.get("d"), Some(4));
    }

    #[test]
    fn reads_do_not_change_eviction_order() {
        let mut cache = HashCache::new(2, TTL);
        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.get("a"), Some(1));
        cache.set("c", 3);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn updating_a_key_keeps_other_entries() {
        let mut cache = HashCache::new(2, TTL);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("a", 10);
        assert_eq!(cache.size(), 2);
        assert_eq!(cache.get("a"), Some(10));
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn zero_capacity_still_holds_one_entry() {
        let mut cache = HashCache::new(0, TTL);
        cache.set("a", 1);
        assert_eq!(cache.capacity(), 1);
        assert_eq!(cache.get("a"), Some(1));
    }

    #[test]
    fn clear_empties_the_cache() {
        let mut cache = HashCache::new(4, TTL);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.clear();
        assert_eq!(cache.size(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let mut cache = HashCache::new(4, TTL);
        cache.set("a", 1);

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get("a"), Some(1));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.size(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_drops_only_expired_entries() {
        let mut cache = HashCache::new(4, TTL);
        cache.set("old", 1);
        tokio::time::advance(Duration::from_secs(45)).await;
        cache.set("new", 2);
        tokio::time::advance(Duration::from_secs(20)).await;

        assert_eq!(cache.cleanup(), 1);
        assert_eq!(cache.size(), 1);
        assert_eq!(cache.get("new"), Some(2));
    }

    #[test]
    fn render_keys_separate_themes() {
        let text = "A->B: hi";
        assert_ne!(
            render_key(text, ThemeName::Nord),
            render_key(text, ThemeName::Dracula)
        );
        assert!(render_key(text, ThemeName::Nord).starts_with(&validation_key(text)));
    }

    #[test]
    fn fingerprints_are_byte_exact() {
        assert_ne!(fingerprint("A->B: hi"), fingerprint("A->B: hi "));
        assert_eq!(fingerprint("x").len(), 64);
    }
}
