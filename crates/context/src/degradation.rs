//! Field-level fallback rules for failed upstream calls.
//!
//! | Failure | Stale entry exists | No stale entry | Backoff |
//! |---------|--------------------|----------------|---------|
//! | `Timeout` | `StaleFallback` | neutral default, `Approximated` | no |
//! | `UpstreamError` | `StaleFallback` | neutral default, `Approximated` | no |
//! | `PartialData` | `StaleFallback` | neutral default, `Approximated` | no |
//! | `RateLimited` | `StaleFallback` | neutral default, `Approximated` | yes |

use std::time::Duration;

use log::warn;
use marketpulse_sources::FailureKind;

use crate::provenance::Provenance;

/// A fallback value chosen for a failed upstream call.
#[derive(Clone, Debug, PartialEq)]
pub struct Degraded<T> {
    pub value: T,
    pub provenance: Provenance,
    pub note: String,
}

#[derive(Clone, Debug)]
pub struct DegradationPolicy {
    rate_limit_backoff: Duration,
}

impl DegradationPolicy {
    pub fn new(rate_limit_backoff: Duration) -> Self {
        Self { rate_limit_backoff }
    }

    /// Pick the fallback for a failure of `kind`.
    ///
    /// An expired value for the same slot wins over the neutral default,
    /// which keeps the response shape stable when nothing was ever cached.
    pub fn degrade<T>(
        &self,
        source: &str,
        kind: FailureKind,
        stale: Option<T>,
        neutral: impl FnOnce() -> T,
    ) -> Degraded<T> {
        match stale {
            Some(value) => {
                warn!("{} failed ({}), serving expired value", source, kind);
                Degraded {
                    value,
                    provenance: Provenance::StaleFallback,
                    note: format!("{} {}: served from expired cache entry", source, describe(kind)),
                }
            }
            None => {
                warn!("{} failed ({}), no cached value, using neutral default", source, kind);
                Degraded {
                    value: neutral(),
                    provenance: Provenance::Approximated,
                    note: format!("{} {}: neutral default", source, describe(kind)),
                }
            }
        }
    }

    /// How long the failed slot must wait before calling upstream again.
    ///
    /// Only rate limiting backs off. A provider hint longer than the
    /// configured window wins.
    pub fn backoff_for(&self, kind: FailureKind, retry_after: Option<Duration>) -> Option<Duration> {
        if !kind.requires_backoff() {
            return None;
        }
        Some(
            retry_after
                .map(|hint| hint.max(self.rate_limit_backoff))
                .unwrap_or(self.rate_limit_backoff),
        )
    }
}

fn describe(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::Timeout => "timed out",
        FailureKind::RateLimited => "rate limited",
        FailureKind::UpstreamError => "unavailable",
        FailureKind::PartialData => "returned partial data",
    }
}
