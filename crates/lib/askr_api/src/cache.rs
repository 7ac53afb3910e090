//! Response caches.
//!
//! Two disjoint byte caches in front of serialization: the per-host
//! API descriptor (TTL minutes, cleared on config reload) and the
//! per-profile signed document (short TTL, since every entry embeds
//! a signing timestamp). Strictly an optimization: a cold cache changes
//! nothing observable beyond that timestamp. Reads are lock-free
//! outside the touched shard; concurrent misses may compute twice,
//! which is safe.

use std::time::{Duration, Instant};

use dashmap::DashMap;

/// TTL for cached API descriptors.
pub const METADATA_TTL: Duration = Duration::from_secs(5 * 60);

/// TTL for cached profile documents. Kept short so embedded signature
/// timestamps stay fresh.
pub const PROFILE_TTL: Duration = Duration::from_secs(60);

#[derive(Clone)]
struct CacheEntry {
    bytes: Vec<u8>,
    expires_at: Instant,
}

impl CacheEntry {
    fn live(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Serialized-response cache.
pub struct ResponseCache {
    metadata: DashMap<String, CacheEntry>,
    profiles: DashMap<(String, bool), CacheEntry>,
    metadata_ttl: Duration,
    profile_ttl: Duration,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::with_ttls(METADATA_TTL, PROFILE_TTL)
    }
}

impl ResponseCache {
    pub fn with_ttls(metadata_ttl: Duration, profile_ttl: Duration) -> Self {
        Self {
            metadata: DashMap::new(),
            profiles: DashMap::new(),
            metadata_ttl,
            profile_ttl,
        }
    }

    /// Cached descriptor for a request host.
    pub fn get_metadata(&self, host: &str) -> Option<Vec<u8>> {
        self.metadata
            .get(host)
            .filter(|e| e.live())
            .map(|e| e.bytes.clone())
    }

    pub fn put_metadata(&self, host: &str, bytes: Vec<u8>) {
        self.metadata.insert(
            host.to_string(),
            CacheEntry {
                bytes,
                expires_at: Instant::now() + self.metadata_ttl,
            },
        );
    }

    /// Drop every cached descriptor (configuration reload).
    pub fn clear_metadata(&self) {
        self.metadata.clear();
    }

    /// Cached profile document, keyed by id and signedness.
    pub fn get_profile(&self, uuid: &str, signed: bool) -> Option<Vec<u8>> {
        self.profiles
            .get(&(uuid.to_string(), signed))
            .filter(|e| e.live())
            .map(|e| e.bytes.clone())
    }

    pub fn put_profile(&self, uuid: &str, signed: bool, bytes: Vec<u8>) {
        self.profiles.insert(
            (uuid.to_string(), signed),
            CacheEntry {
                bytes,
                expires_at: Instant::now() + self.profile_ttl,
            },
        );
    }

    /// Drop both variants for a profile. Must run after any profile
    /// mutation, before the next read can observe stale content.
    pub fn invalidate_profile(&self, uuid: &str) {
        self.profiles.remove(&(uuid.to_string(), true));
        self.profiles.remove(&(uuid.to_string(), false));
    }
}
