//! Raw upstream datasets, cached and degraded per slot.
//!
//! Every gateway call a builder makes goes through [`BuildContext`]'s fetch
//! methods:
//! 1. A fresh cached dataset is returned as `Real` without calling upstream.
//! 2. During a rate-limit backoff window the upstream is not called; the
//!    expired dataset (or the neutral default) is served.
//! 3. Otherwise the fetch is resolved through the build coordinator, so
//!    concurrent builders share one upstream call per dataset.
//! 4. A failed fetch is handed to the degradation policy.

use std::future::Future;
use std::sync::Arc;

use marketpulse_sources::{
    Candle, CandleInterval, Endpoint, FailureKind, FundamentalsSnapshot, HistoryRange,
    IndexSnapshot, QuoteBatch, QuoteSnapshot, SectorSnapshot, SourceError,
};

use super::BuildContext;
use crate::cache::{CacheValue, EntryKind, SlotKey};
use crate::clock::add_duration;
use crate::errors::ContextError;
use crate::provenance::{Provenance, Tagged};

/// A dataset as delivered to a builder.
///
/// A raw dataset read fresh from the store, or joined from a concurrent
/// fetch, counts as `Real`: it is still inside its upstream TTL.
#[derive(Clone, Debug)]
pub struct Sourced<T> {
    pub endpoint: Endpoint,
    pub value: Arc<T>,
    pub provenance: Provenance,
    pub note: Option<String>,
    /// Failure that forced a fallback, if any.
    pub failure: Option<FailureKind>,
    /// The dataset that was cached before this fetch, fresh or not.
    pub previous: Option<Arc<T>>,
}

impl<T> Sourced<T> {
    /// True when the dataset is a neutral default: the call failed and
    /// nothing was cached.
    pub fn is_unavailable(&self) -> bool {
        self.failure.is_some() && self.provenance == Provenance::Approximated
    }

    /// Tag a value derived from this dataset.
    pub fn tag<U>(&self, value: U) -> Tagged<U> {
        Tagged::new(value, self.provenance).with_optional_note(self.note.clone())
    }

    /// Reason for the fallback, for error reporting.
    pub fn failure_reason(&self) -> Option<String> {
        self.failure
            .map(|kind| format!("{}: {}", self.endpoint, kind))
    }
}

/// One quote picked out of a batch, with the provenance it inherits.
#[derive(Clone, Debug)]
pub struct PickedQuote {
    pub quote: QuoteSnapshot,
    pub provenance: Provenance,
    pub note: Option<String>,
}

impl Sourced<QuoteBatch> {
    /// Quote for `symbol`, falling back to the previously cached batch when
    /// the symbol is missing from the current one.
    pub fn pick(&self, symbol: &str) -> Option<PickedQuote> {
        if let Some(quote) = self.value.quote(symbol) {
            return Some(PickedQuote {
                quote: quote.clone(),
                provenance: self.provenance,
                note: self.note.clone(),
            });
        }
        self.previous
            .as_ref()
            .filter(|previous| !Arc::ptr_eq(previous, &self.value))
            .and_then(|previous| previous.quote(symbol))
            .map(|quote| PickedQuote {
                quote: quote.clone(),
                provenance: Provenance::StaleFallback,
                note: Some(format!("{} missing from latest batch, served from expired cache entry", symbol)),
            })
    }
}

impl PickedQuote {
    pub fn tag<U>(&self, value: U) -> Tagged<U> {
        Tagged::new(value, self.provenance).with_optional_note(self.note.clone())
    }
}

impl BuildContext<'_> {
    async fn sourced<T, F, Fut>(
        &self,
        endpoint: Endpoint,
        scope: String,
        neutral: impl FnOnce() -> T,
        fetch: F,
    ) -> Sourced<T>
    where
        T: CacheValue,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let slot = SlotKey::source(endpoint, scope);
        let kind = EntryKind::Source(endpoint);
        let now = self.clock.now();
        let cached = self.store.get(&slot);
        let previous = cached.as_ref().and_then(|entry| entry.payload::<T>());

        if let Some(value) = cached
            .as_ref()
            .filter(|entry| self.store.is_fresh(entry, now))
            .and_then(|entry| entry.payload::<T>())
        {
            return Sourced {
                endpoint,
                value,
                provenance: Provenance::Real,
                note: None,
                failure: None,
                previous,
            };
        }

        if self.store.backoff_until(&slot).is_some_and(|until| now < until) {
            return self.degraded(endpoint, FailureKind::RateLimited, previous, neutral);
        }

        let result = self
            .coordinator
            .resolve(slot.clone(), self.config.ttl(kind), self.config.bucket_width(kind), move || async move {
                fetch()
                    .await
                    .map(|value| T::into_cached(Arc::new(value)))
                    .map_err(ContextError::from)
            })
            .await;

        match result.map(|resolution| resolution.entry.payload::<T>()) {
            Ok(Some(value)) => Sourced {
                endpoint,
                value,
                provenance: Provenance::Real,
                note: None,
                failure: None,
                previous,
            },
            Ok(None) => self.degraded(endpoint, FailureKind::UpstreamError, previous, neutral),
            Err(e) => {
                let kind = e.failure_kind().unwrap_or(FailureKind::UpstreamError);
                if let Some(backoff) = self.policy.backoff_for(kind, e.retry_after()) {
                    self.store.set_backoff(slot, add_duration(now, backoff));
                }
                self.degraded(endpoint, kind, previous, neutral)
            }
        }
    }

    fn degraded<T>(
        &self,
        endpoint: Endpoint,
        kind: FailureKind,
        previous: Option<Arc<T>>,
        neutral: impl FnOnce() -> T,
    ) -> Sourced<T> {
        let degraded = self.policy.degrade(endpoint.as_str(), kind, previous.clone(), || {
            Arc::new(neutral())
        });
        Sourced {
            endpoint,
            value: degraded.value,
            provenance: degraded.provenance,
            note: Some(degraded.note),
            failure: Some(kind),
            previous,
        }
    }

    pub async fn global_indices(&self) -> Sourced<Vec<IndexSnapshot>> {
        self.sourced(Endpoint::GlobalIndices, String::new(), Vec::new, move || {
            self.gateway.fetch_global_indices()
        })
        .await
    }

    /// Quotes for `symbols`. A batch where every symbol failed counts as a
    /// failed call.
    pub async fn domestic_quotes(&self, symbols: &[String]) -> Sourced<QuoteBatch> {
        let mut scope: Vec<&str> = symbols.iter().map(String::as_str).collect();
        scope.sort_unstable();
        scope.dedup();
        let scope = scope.join(",");

        self.sourced(Endpoint::DomesticQuotes, scope, QuoteBatch::new, move || async move {
            let batch = self.gateway.fetch_domestic_quotes(symbols).await?;
            if batch.has_any_success() {
                return Ok(batch);
            }
            Err(batch
                .results
                .into_values()
                .find_map(Result::err)
                .unwrap_or_else(|| SourceError::PartialData {
                    endpoint: Endpoint::DomesticQuotes.to_string(),
                    missing: symbols.to_vec(),
                }))
        })
        .await
    }

    pub async fn candles(
        &self,
        symbol: &str,
        interval: CandleInterval,
        range: HistoryRange,
    ) -> Sourced<Vec<Candle>> {
        let scope = format!("{}:{}:{}", symbol, interval, range);
        self.sourced(Endpoint::HistoricalCandles, scope, Vec::new, move || {
            self.gateway.fetch_historical_candles(symbol, interval, range)
        })
        .await
    }

    pub async fn sector_performance(&self) -> Sourced<Vec<SectorSnapshot>> {
        self.sourced(Endpoint::SectorPerformance, String::new(), Vec::new, move || {
            self.gateway.fetch_sector_performance()
        })
        .await
    }

    pub async fn fundamentals(&self, symbol: &str) -> Sourced<FundamentalsSnapshot> {
        let now = self.clock.now();
        self.sourced(
            Endpoint::Fundamentals,
            symbol.to_string(),
            || FundamentalsSnapshot {
                symbol: symbol.to_string(),
                pe_ratio: None,
                pb_ratio: None,
                dividend_yield: None,
                earnings_growth: None,
                as_of: now,
            },
            move || self.gateway.fetch_fundamentals(symbol),
        )
        .await
    }
}
