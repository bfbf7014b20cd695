//! Cache store and cache keys.
//!
//! Entries are stored per slot (entry kind plus scope). The time bucket only
//! takes part in the single-flight key, so an expired entry stays available
//! as a fallback across bucket boundaries.

mod entry;
mod key;
mod store;

pub use entry::{CacheEntry, CacheValue, CachedValue, ProvenanceSummary};
pub use key::{CacheKey, EntryKind, SlotKey, TimeBucket};
pub use store::{CacheStore, InMemoryCacheStore};
