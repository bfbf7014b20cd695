use std::time::Duration;

use chrono::{DateTime, Utc};
use marketpulse_sources::Endpoint;
use serde::Serialize;

use crate::fragments::FragmentKind;
use crate::scope::ContextScope;

/// What a cache slot holds: a composed fragment or a raw upstream dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryKind {
    Fragment(FragmentKind),
    Source(Endpoint),
}

impl EntryKind {
    pub fn all() -> impl Iterator<Item = EntryKind> {
        FragmentKind::ALL
            .into_iter()
            .map(EntryKind::Fragment)
            .chain(Endpoint::ALL.into_iter().map(EntryKind::Source))
    }

    /// Upper-case name used in environment variable overrides.
    pub fn env_name(&self) -> String {
        self.to_string().to_uppercase()
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fragment(kind) => f.write_str(kind.as_str()),
            Self::Source(endpoint) => f.write_str(endpoint.as_str()),
        }
    }
}

/// A cache slot: entry kind plus its scope parameters.
///
/// The store keeps one entry per slot. A rebuild in a later time bucket
/// overwrites the previous entry, and an expired entry stays readable as a
/// fallback until then.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct SlotKey {
    pub kind: EntryKind,
    pub scope: String,
}

impl SlotKey {
    pub fn new(kind: EntryKind, scope: impl Into<String>) -> Self {
        Self {
            kind,
            scope: scope.into(),
        }
    }

    /// Slot for a fragment, scoped by what that fragment depends on.
    pub fn fragment(kind: FragmentKind, scope: &ContextScope) -> Self {
        Self::new(EntryKind::Fragment(kind), kind.scope_key(scope))
    }

    pub fn source(endpoint: Endpoint, scope: impl Into<String>) -> Self {
        Self::new(EntryKind::Source(endpoint), scope)
    }
}

impl std::fmt::Display for SlotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.scope.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}:{}", self.kind, self.scope)
        }
    }
}

/// Wall-clock time quantized to a refresh granularity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize)]
pub struct TimeBucket(pub i64);

impl TimeBucket {
    /// Bucket containing `at` for buckets of `width`.
    ///
    /// A zero width degenerates to one bucket per second.
    pub fn of(at: DateTime<Utc>, width: Duration) -> Self {
        let width = width.as_secs().max(1) as i64;
        Self(at.timestamp().div_euclid(width))
    }
}

/// Single-flight key: a slot within one time bucket.
///
/// Two requests for the same slot issued within the same bucket always
/// produce equal keys, so they collide on one build.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub slot: SlotKey,
    pub bucket: TimeBucket,
}

impl CacheKey {
    pub fn new(slot: SlotKey, at: DateTime<Utc>, width: Duration) -> Self {
        Self {
            slot,
            bucket: TimeBucket::of(at, width),
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.slot, self.bucket.0)
    }
}
