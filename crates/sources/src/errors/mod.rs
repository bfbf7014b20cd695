//! Error types and failure classification for upstream market data calls.
//!
//! This module provides:
//! - [`SourceError`]: The error enum every gateway call returns
//! - [`FailureKind`]: The shared taxonomy the degradation policy keys on

mod kind;

pub use kind::FailureKind;

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while calling an upstream data source.
///
/// Each variant maps onto a [`FailureKind`] via [`kind`](Self::kind). The
/// error is `Clone` because a single failed fetch is broadcast to every
/// caller waiting on the same cache slot.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    /// The call exceeded its timeout.
    #[error("Timeout: {endpoint} after {elapsed:?}")]
    Timeout {
        /// The endpoint that timed out
        endpoint: String,
        /// The timeout that was applied
        elapsed: Duration,
    },

    /// The provider rate limited the request (HTTP 429) or no local token was available.
    #[error("Rate limited: {endpoint}")]
    RateLimited {
        /// The endpoint that was throttled
        endpoint: String,
        /// Provider hint for when the next call may succeed
        retry_after: Option<Duration>,
    },

    /// A provider-specific error occurred.
    #[error("Upstream error: {endpoint} - {message}")]
    Upstream {
        /// The endpoint that failed
        endpoint: String,
        /// The error message from the provider
        message: String,
    },

    /// The provider answered but left out some requested items.
    #[error("Partial data from {endpoint}: missing {missing:?}")]
    PartialData {
        /// The endpoint that returned incomplete data
        endpoint: String,
        /// Identifiers of the missing items
        missing: Vec<String>,
    },

    /// The circuit breaker for this endpoint is open.
    #[error("Circuit open: {endpoint}")]
    CircuitOpen {
        /// The endpoint with an open circuit
        endpoint: String,
    },
}

impl SourceError {
    /// Returns the failure kind for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use marketpulse_sources::errors::{FailureKind, SourceError};
    ///
    /// let error = SourceError::RateLimited { endpoint: "sector_performance".to_string(), retry_after: None };
    /// assert_eq!(error.kind(), FailureKind::RateLimited);
    ///
    /// let error = SourceError::CircuitOpen { endpoint: "fundamentals".to_string() };
    /// assert_eq!(error.kind(), FailureKind::UpstreamError);
    /// ```
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::RateLimited { .. } => FailureKind::RateLimited,
            Self::Upstream { .. } | Self::CircuitOpen { .. } => FailureKind::UpstreamError,
            Self::PartialData { .. } => FailureKind::PartialData,
        }
    }

    /// Provider supplied retry hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Whether the failure should count against the endpoint's circuit.
    ///
    /// Partial answers and local throttling say nothing about provider health.
    pub fn trips_circuit(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Upstream { .. })
    }

    pub fn upstream(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }
}
