use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use marketpulse_sources::{Candle, FundamentalsSnapshot, IndexSnapshot, QuoteBatch, SectorSnapshot};
use serde::Serialize;

use super::TimeBucket;
use crate::clock::add_duration;
use crate::fragments::Fragment;
use crate::provenance::Provenance;

/// Value held by a cache entry. The store never looks inside.
#[derive(Clone, Debug)]
pub enum CachedValue {
    Fragment(Arc<Fragment>),
    GlobalIndices(Arc<Vec<IndexSnapshot>>),
    DomesticQuotes(Arc<QuoteBatch>),
    Candles(Arc<Vec<Candle>>),
    Sectors(Arc<Vec<SectorSnapshot>>),
    Fundamentals(Arc<FundamentalsSnapshot>),
}

/// Conversion between a concrete payload and [`CachedValue`].
pub trait CacheValue: Send + Sync + Sized + 'static {
    fn into_cached(value: Arc<Self>) -> CachedValue;

    fn from_cached(value: &CachedValue) -> Option<Arc<Self>>;
}

macro_rules! cache_value {
    ($ty:ty, $variant:ident) => {
        impl CacheValue for $ty {
            fn into_cached(value: Arc<Self>) -> CachedValue {
                CachedValue::$variant(value)
            }

            fn from_cached(value: &CachedValue) -> Option<Arc<Self>> {
                match value {
                    CachedValue::$variant(inner) => Some(Arc::clone(inner)),
                    _ => None,
                }
            }
        }
    };
}

cache_value!(Fragment, Fragment);
cache_value!(Vec<IndexSnapshot>, GlobalIndices);
cache_value!(QuoteBatch, DomesticQuotes);
cache_value!(Vec<Candle>, Candles);
cache_value!(Vec<SectorSnapshot>, Sectors);
cache_value!(FundamentalsSnapshot, Fundamentals);

/// Provenance counts over the fields of a cached value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvenanceSummary {
    pub real: usize,
    pub reused: usize,
    pub approximated: usize,
    pub stale_fallback: usize,
}

impl ProvenanceSummary {
    pub fn from_provenances<I: IntoIterator<Item = Provenance>>(provenances: I) -> Self {
        let mut summary = Self::default();
        for provenance in provenances {
            match provenance {
                Provenance::Real => summary.real += 1,
                Provenance::Reused => summary.reused += 1,
                Provenance::Approximated => summary.approximated += 1,
                Provenance::StaleFallback => summary.stale_fallback += 1,
            }
        }
        summary
    }

    /// Summary of a value as stored.
    ///
    /// Raw upstream datasets are stored only after a successful fetch and
    /// count as a single real field.
    pub fn of(value: &CachedValue) -> Self {
        match value {
            CachedValue::Fragment(fragment) => Self::from_provenances(
                fragment.field_provenance().into_iter().map(|f| f.provenance),
            ),
            _ => Self {
                real: 1,
                ..Self::default()
            },
        }
    }

    pub fn total(&self) -> usize {
        self.real + self.reused + self.approximated + self.stale_fallback
    }

    /// Lowest-quality provenance present, `None` for an empty summary.
    pub fn weakest(&self) -> Option<Provenance> {
        if self.stale_fallback > 0 {
            Some(Provenance::StaleFallback)
        } else if self.approximated > 0 {
            Some(Provenance::Approximated)
        } else if self.reused > 0 {
            Some(Provenance::Reused)
        } else if self.real > 0 {
            Some(Provenance::Real)
        } else {
            None
        }
    }
}

/// A stored value with its build time and freshness window.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub value: CachedValue,
    pub built_at: DateTime<Utc>,
    pub ttl: Duration,
    /// Time bucket of the build that produced the entry.
    pub bucket: TimeBucket,
    pub provenance: ProvenanceSummary,
}

impl CacheEntry {
    pub fn new(value: CachedValue, built_at: DateTime<Utc>, ttl: Duration, bucket: TimeBucket) -> Self {
        let provenance = ProvenanceSummary::of(&value);
        Self {
            value,
            built_at,
            ttl,
            bucket,
            provenance,
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        add_duration(self.built_at, self.ttl)
    }

    /// Fresh iff `now < built_at + ttl`.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at()
    }

    /// Typed payload, `None` when the entry holds a different kind of value.
    pub fn payload<T: CacheValue>(&self) -> Option<Arc<T>> {
        T::from_cached(&self.value)
    }

    pub fn fragment(&self) -> Option<Arc<Fragment>> {
        self.payload::<Fragment>()
    }
}
