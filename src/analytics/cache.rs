/// Time-bounded cache for generated insights
///
/// Entries are keyed by (user, mode) and are never deleted on read. An entry
/// older than the TTL is simply reported as stale; the orchestrator then
/// recomputes and overwrites it. Once the map grows past a sweep threshold,
/// each write also drops every stale entry. Concurrent misses for the same
/// key may both recompute, and the last write wins.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::analytics::InsightPayload;
use crate::domain::{InsightMode, UserId};

/// How long a cached insight stays fresh
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Entry count above which a write sweeps out stale entries
pub const DEFAULT_SWEEP_THRESHOLD: usize = 1024;

/// Source of "now" for freshness checks
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Identifies one cache slot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub user_id: UserId,
    pub mode: InsightMode,
}

impl CacheKey {
    pub fn new(user_id: UserId, mode: InsightMode) -> Self {
        Self { user_id, mode }
    }
}

/// What a lookup found
#[derive(Debug, Clone, PartialEq)]
pub struct CacheLookup {
    pub payload: InsightPayload,
    pub stored_at: DateTime<Utc>,
    /// True while the entry is younger than the TTL
    pub is_fresh: bool,
}

/// Capability interface for insight caches
pub trait InsightCache: Send + Sync {
    /// Look up a slot without modifying it
    fn get(&self, key: &CacheKey) -> Option<CacheLookup>;

    /// Store a payload, overwriting whatever was there
    fn put(&self, key: CacheKey, payload: InsightPayload);
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: InsightPayload,
    stored_at: DateTime<Utc>,
}

/// Process-local cache backed by a HashMap
pub struct InMemoryInsightCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: chrono::Duration,
    clock: Clock,
    sweep_threshold: usize,
}

impl InMemoryInsightCache {
    /// Cache with the default five minute TTL
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(Utc::now))
    }

    /// Cache reading time from a custom clock (tests drive expiry this way)
    pub fn with_clock(ttl: Duration, clock: Clock) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::weeks(52)),
            clock,
            sweep_threshold: DEFAULT_SWEEP_THRESHOLD,
        }
    }

    /// Sweep stale entries on write once more than `threshold` are stored
    pub fn with_sweep_threshold(mut self, threshold: usize) -> Self {
        self.sweep_threshold = threshold;
        self
    }

    /// Number of stored entries, fresh or stale
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries past their TTL, returning how many were removed
    pub fn purge_stale(&self) -> usize {
        let now = (self.clock)();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        self.retain_fresh(&mut entries, now)
    }

    fn retain_fresh(&self, entries: &mut HashMap<CacheKey, CacheEntry>, now: DateTime<Utc>) -> usize {
        let before = entries.len();
        // An entry written at `now` survives even with a zero TTL
        entries.retain(|_, entry| entry.stored_at == now || now - entry.stored_at < self.ttl);
        before - entries.len()
    }
}

impl Default for InMemoryInsightCache {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightCache for InMemoryInsightCache {
    fn get(&self, key: &CacheKey) -> Option<CacheLookup> {
        let now = (self.clock)();
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());

        entries.get(key).map(|entry| CacheLookup {
            payload: entry.payload.clone(),
            stored_at: entry.stored_at,
            is_fresh: now - entry.stored_at < self.ttl,
        })
    }

    fn put(&self, key: CacheKey, payload: InsightPayload) {
        let stored_at = (self.clock)();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, CacheEntry { payload, stored_at });

        if entries.len() > self.sweep_threshold {
            let removed = self.retain_fresh(&mut entries, stored_at);
            debug!("Swept {} stale insight(s), {} left", removed, entries.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn manual_clock() -> (Arc<Mutex<DateTime<Utc>>>, Clock) {
        let now = Arc::new(Mutex::new(Utc::now()));
        let handle = now.clone();
        let clock: Clock = Arc::new(move || *handle.lock().unwrap());
        (now, clock)
    }

    fn key(mode: InsightMode) -> CacheKey {
        CacheKey::new(UserId::parse("sam").unwrap(), mode)
    }

    fn tips() -> InsightPayload {
        InsightPayload::QuickTips(vec!["a".into(), "b".into(), "c".into()])
    }

    #[test]
    fn test_missing_key() {
        let cache = InMemoryInsightCache::new();
        assert!(cache.get(&key(InsightMode::Quick)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entry_goes_stale_after_ttl() {
        let (now, clock) = manual_clock();
        let cache = InMemoryInsightCache::with_clock(Duration::from_secs(300), clock);

        cache.put(key(InsightMode::Quick), tips());
        let hit = cache.get(&key(InsightMode::Quick)).unwrap();
        assert!(hit.is_fresh);
        assert_eq!(hit.payload, tips());

        *now.lock().unwrap() += chrono::Duration::seconds(299);
        assert!(cache.get(&key(InsightMode::Quick)).unwrap().is_fresh);

        *now.lock().unwrap() += chrono::Duration::seconds(1);
        let stale = cache.get(&key(InsightMode::Quick)).unwrap();
        assert!(!stale.is_fresh);
        // Stale entries are still there until overwritten or purged
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_modes_are_separate_slots() {
        let cache = InMemoryInsightCache::new();
        cache.put(key(InsightMode::Quick), tips());

        assert!(cache.get(&key(InsightMode::Detailed)).is_none());
    }

    #[test]
    fn test_put_overwrites_and_refreshes() {
        let (now, clock) = manual_clock();
        let cache = InMemoryInsightCache::with_clock(Duration::from_secs(60), clock);

        cache.put(key(InsightMode::Detailed), InsightPayload::DetailedNarrative("old".into()));
        *now.lock().unwrap() += chrono::Duration::seconds(120);
        cache.put(key(InsightMode::Detailed), InsightPayload::DetailedNarrative("new".into()));

        let hit = cache.get(&key(InsightMode::Detailed)).unwrap();
        assert!(hit.is_fresh);
        assert_eq!(hit.payload, InsightPayload::DetailedNarrative("new".into()));
    }

    #[test]
    fn test_purge_stale() {
        let (now, clock) = manual_clock();
        let cache = InMemoryInsightCache::with_clock(Duration::from_secs(60), clock);

        cache.put(key(InsightMode::Quick), tips());
        *now.lock().unwrap() += chrono::Duration::seconds(90);
        cache.put(key(InsightMode::Detailed), InsightPayload::DetailedNarrative("x".into()));

        assert_eq!(cache.purge_stale(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key(InsightMode::Detailed)).is_some());
    }

    #[test]
    fn test_put_sweeps_stale_entries_past_threshold() {
        let (now, clock) = manual_clock();
        let cache = InMemoryInsightCache::with_clock(Duration::from_secs(60), clock).with_sweep_threshold(2);
        let other = CacheKey::new(UserId::parse("kim").unwrap(), InsightMode::Quick);

        cache.put(key(InsightMode::Quick), tips());
        *now.lock().unwrap() += chrono::Duration::seconds(90);
        cache.put(key(InsightMode::Detailed), InsightPayload::DetailedNarrative("x".into()));
        // At the threshold nothing is swept yet
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key(InsightMode::Quick)).is_some());

        cache.put(other.clone(), tips());
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key(InsightMode::Quick)).is_none());
        assert!(cache.get(&key(InsightMode::Detailed)).unwrap().is_fresh);
        assert!(cache.get(&other).unwrap().is_fresh);
    }

    #[test]
    fn test_zero_ttl_sweep_keeps_latest_write() {
        let (now, clock) = manual_clock();
        let cache = InMemoryInsightCache::with_clock(Duration::ZERO, clock).with_sweep_threshold(0);

        cache.put(key(InsightMode::Quick), tips());
        *now.lock().unwrap() += chrono::Duration::seconds(1);
        cache.put(key(InsightMode::Detailed), InsightPayload::DetailedNarrative("x".into()));

        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key(InsightMode::Detailed)).is_some());
    }
}
