use serde::{Deserialize, Serialize};

/// Shared failure taxonomy for upstream calls.
///
/// Every gateway translates its provider-specific errors into one of these
/// kinds. The context engine decides how to degrade a field purely from the
/// kind, never from the provider's raw message.
///
/// # Behavior Summary
///
/// | Kind | Prefer stale cache? | Delay next upstream call? |
/// |------|---------------------|---------------------------|
/// | `Timeout` | Yes | No |
/// | `RateLimited` | Yes | Yes (backoff window) |
/// | `UpstreamError` | Yes | No |
/// | `PartialData` | Yes, per missing item | No |
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// The call did not complete within its bounded timeout.
    Timeout,

    /// The provider (or the local token bucket) refused the call.
    ///
    /// The slot that triggered it must not be retried until its backoff
    /// window elapses.
    RateLimited,

    /// Any other non-timeout provider failure, including an open circuit.
    UpstreamError,

    /// The call succeeded but some requested items are missing.
    PartialData,
}

impl FailureKind {
    /// Whether a failure of this kind should postpone the next attempt.
    pub fn requires_backoff(self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::RateLimited => write!(f, "rate limited"),
            Self::UpstreamError => write!(f, "upstream error"),
            Self::PartialData => write!(f, "partial data"),
        }
    }
}
