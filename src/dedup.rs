//! Content-hash deduplication.
//!
//! The cache is a single `DashMap<String, Instant>` keyed `provider:hash` —
//! the same "map entry carries an `Instant`, a sweep calls `retain`" shape the
//! router's state store and the framework's own idempotency plugin already
//! use. It's a hint, not the source of truth: a cache miss always falls back
//! to a hash-only existence probe against the store, which is what actually
//! prevents duplicate rows when two requests race.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use sha2::{Digest, Sha256};

use crate::{error::ForwarderError, repository::EventRepository};

const DEFAULT_TTL: Duration = Duration::from_secs(300);
const SOFT_CAPACITY: usize = 10_000;

pub struct Deduplicator {
    cache: DashMap<String, Instant>,
    ttl: Duration,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self { cache: DashMap::new(), ttl: DEFAULT_TTL }
    }

    /// Pure, no I/O: `SHA256(body)` as 64 lowercase hex characters.
    pub fn compute_hash(body: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(body);
        hex::encode(hasher.finalize())
    }

    /// Returns `(is_duplicate, hash)`. At most one store read; never writes.
    pub async fn is_duplicate(
        &self,
        repository: &EventRepository,
        provider: &str,
        body: &[u8],
    ) -> Result<(bool, String), ForwarderError> {
        let hash = Self::compute_hash(body);
        let key = format!("{provider}:{hash}");

        if self.cache.len() > SOFT_CAPACITY {
            self.evict_expired();
        }

        if self.cache.contains_key(&key) {
            return Ok((true, hash));
        }

        let exists = repository.hash_exists(&hash).await?;
        self.cache.insert(key, Instant::now());
        Ok((exists, hash))
    }

    fn evict_expired(&self) {
        let ttl = self.ttl;
        self.cache.retain(|_, observed_at| observed_at.elapsed() <= ttl);
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_hash_is_deterministic_and_64_hex() {
        let a = Deduplicator::compute_hash(b"{\"type\":\"ping\"}");
        let b = Deduplicator::compute_hash(b"{\"type\":\"ping\"}");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn different_bodies_hash_differently() {
        let a = Deduplicator::compute_hash(b"one");
        let b = Deduplicator::compute_hash(b"two");
        assert_ne!(a, b);
    }

    #[test]
    fn evict_expired_drops_only_stale_entries() {
        let dedup = Deduplicator { cache: DashMap::new(), ttl: Duration::from_millis(0) };
        dedup.cache.insert("alchemy:abc".into(), Instant::now() - Duration::from_secs(1));
        dedup.evict_expired();
        assert!(dedup.cache.is_empty());
    }
}
