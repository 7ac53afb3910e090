//! Join/hasJoined rendezvous.
//!
//! A join stores a short-lived record under the client-chosen
//! `serverId`; the game server's hasJoined consumes it at most once.
//! Entries expire 30 seconds after creation; a background sweeper
//! evicts them, and reads re-check age so a sweep race cannot revive a
//! dead session.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

/// Hard cap on session age.
pub const SESSION_TTL: Duration = Duration::from_secs(30);

/// Interval between sweeper runs.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// A pending join, waiting for the server side of the handshake.
#[derive(Debug, Clone)]
pub struct PendingSession {
    pub access_token: String,
    pub profile_id: String,
    pub client_ip: String,
    created_at: Instant,
}

impl PendingSession {
    pub fn new(access_token: String, profile_id: String, client_ip: String) -> Self {
        Self {
            access_token,
            profile_id,
            client_ip,
            created_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() >= ttl
    }
}

/// Sharded rendezvous map keyed by `serverId`.
pub struct SessionStore {
    sessions: DashMap<String, PendingSession>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Store a join, overwriting any prior entry under the same key.
    pub fn insert(&self, server_id: &str, session: PendingSession) {
        self.sessions.insert(server_id.to_string(), session);
    }

    /// Look up a live session. Misses on absence, expiry, and (when
    /// the caller supplies one) a client IP that differs from the one
    /// stored at join time. The entry is left in place; consumption is
    /// a separate step.
    pub fn get_valid(&self, server_id: &str, ip: Option<&str>) -> Option<PendingSession> {
        let entry = self.sessions.get(server_id)?;
        if entry.is_expired(self.ttl) {
            drop(entry);
            self.sessions
                .remove_if(server_id, |_, s| s.is_expired(self.ttl));
            return None;
        }
        if let Some(ip) = ip
            && !ip.is_empty()
            && entry.client_ip != ip
        {
            return None;
        }
        Some(entry.clone())
    }

    /// One-shot consumption. Returns false when another hasJoined got
    /// there first.
    pub fn consume(&self, server_id: &str) -> bool {
        self.sessions.remove(server_id).is_some()
    }

    /// Evict expired entries; returns how many were dropped.
    pub fn sweep(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_expired(self.ttl));
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Periodic eviction loop; spawn once at startup.
pub async fn run_sweeper(store: Arc<SessionStore>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let evicted = store.sweep();
        if evicted > 0 {
            debug!(evicted, "swept expired sessions");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(ip: &str) -> PendingSession {
        PendingSession::new("token".into(), "profile".into(), ip.into())
    }

    #[test]
    fn join_then_lookup_then_consume_once() {
        let store = SessionStore::default();
        store.insert("srv-123", session("1.2.3.4"));

        assert!(store.get_valid("srv-123", None).is_some());
        assert!(store.consume("srv-123"));
        // Replay: the entry is gone.
        assert!(store.get_valid("srv-123", None).is_none());
        assert!(!store.consume("srv-123"));
    }

    #[test]
    fn ip_binding() {
        let store = SessionStore::default();
        store.insert("srv-123", session("1.2.3.4"));

        assert!(store.get_valid("srv-123", Some("5.6.7.8")).is_none());
        // A mismatch does not consume the session.
        assert!(store.get_valid("srv-123", Some("1.2.3.4")).is_some());
        // Empty ip parameter means "no check".
        assert!(store.get_valid("srv-123", Some("")).is_some());
    }

    #[test]
    fn rejoin_overwrites() {
        let store = SessionStore::default();
        store.insert("srv-123", session("1.2.3.4"));
        store.insert("srv-123", session("9.9.9.9"));
        let got = store.get_valid("srv-123", None).unwrap();
        assert_eq!(got.client_ip, "9.9.9.9");
    }

    #[test]
    fn expired_sessions_miss_and_sweep() {
        let store = SessionStore::new(Duration::from_millis(0));
        store.insert("srv-123", session("1.2.3.4"));
        assert!(store.get_valid("srv-123", None).is_none());

        store.insert("srv-456", session("1.2.3.4"));
        assert_eq!(store.sweep(), 1);
        assert!(store.is_empty());
    }
}
