use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::debug;

use super::{CacheEntry, SlotKey};

/// Key/value store for cache entries.
///
/// `put` is an atomic replace. Expired entries are never purged; they stay
/// readable until the next successful build overwrites them.
pub trait CacheStore: Send + Sync {
    fn get(&self, slot: &SlotKey) -> Option<CacheEntry>;

    fn put(&self, slot: SlotKey, entry: CacheEntry);

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        entry.is_fresh(now)
    }

    /// End of the rate-limit backoff window recorded for `slot`.
    fn backoff_until(&self, slot: &SlotKey) -> Option<DateTime<Utc>>;

    fn set_backoff(&self, slot: SlotKey, until: DateTime<Utc>);

    /// Number of slots holding an entry.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
struct SlotState {
    entry: Option<CacheEntry>,
    backoff_until: Option<DateTime<Utc>>,
}

/// In-process store backed by a concurrent hash map.
#[derive(Default)]
pub struct InMemoryCacheStore {
    slots: DashMap<SlotKey, SlotState>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for InMemoryCacheStore {
    fn get(&self, slot: &SlotKey) -> Option<CacheEntry> {
        self.slots.get(slot).and_then(|state| state.entry.clone())
    }

    fn put(&self, slot: SlotKey, entry: CacheEntry) {
        debug!("Cache put '{}' (ttl {:?})", slot, entry.ttl);
        let mut state = self.slots.entry(slot).or_default();
        state.entry = Some(entry);
        // A successful rebuild ends any backoff.
        state.backoff_until = None;
    }

    fn backoff_until(&self, slot: &SlotKey) -> Option<DateTime<Utc>> {
        self.slots.get(slot).and_then(|state| state.backoff_until)
    }

    fn set_backoff(&self, slot: SlotKey, until: DateTime<Utc>) {
        debug!("Cache backoff '{}' until {}", slot, until);
        let mut state = self.slots.entry(slot).or_default();
        state.backoff_until = Some(state.backoff_until.map_or(until, |current| current.max(until)));
    }

    fn len(&self) -> usize {
        self.slots.iter().filter(|state| state.entry.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CachedValue, EntryKind, TimeBucket};
    use chrono::TimeZone;
    use marketpulse_sources::Endpoint;
    use std::sync::Arc;
    use std::time::Duration;

    fn entry(built_at: DateTime<Utc>) -> CacheEntry {
        CacheEntry::new(
            CachedValue::Sectors(Arc::new(Vec::new())),
            built_at,
            Duration::from_secs(900),
            TimeBucket(0),
        )
    }

    #[test]
    fn test_put_replaces_entry() {
        let store = InMemoryCacheStore::new();
        let slot = SlotKey::source(Endpoint::SectorPerformance, "");
        let first = Utc.with_ymd_and_hms(2026, 1, 5, 9, 30, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2026, 1, 5, 9, 45, 0).unwrap();

        assert!(store.get(&slot).is_none());
        store.put(slot.clone(), entry(first));
        store.put(slot.clone(), entry(second));

        assert_eq!(store.get(&slot).map(|e| e.built_at), Some(second));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_expired_entries_stay_readable() {
        let store = InMemoryCacheStore::new();
        let slot = SlotKey::new(EntryKind::Source(Endpoint::SectorPerformance), "");
        let built = Utc.with_ymd_and_hms(2026, 1, 5, 9, 30, 0).unwrap();
        store.put(slot.clone(), entry(built));

        let later = built + chrono::Duration::hours(2);
        let stale = store.get(&slot).unwrap();
        assert!(!store.is_fresh(&stale, later));
    }

    #[test]
    fn test_backoff_is_cleared_by_put() {
        let store = InMemoryCacheStore::new();
        let slot = SlotKey::source(Endpoint::Fundamentals, "NIFTY");
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 9, 30, 0).unwrap();

        store.set_backoff(slot.clone(), now + chrono::Duration::seconds(60));
        store.set_backoff(slot.clone(), now + chrono::Duration::seconds(30));
        assert_eq!(
            store.backoff_until(&slot),
            Some(now + chrono::Duration::seconds(60))
        );
        assert!(store.is_empty());

        store.put(slot.clone(), entry(now));
        assert_eq!(store.backoff_until(&slot), None);
    }
}
