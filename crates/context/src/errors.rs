//! Error types for the context engine.
//!
//! Upstream failures (`UpstreamTimeout`, `UpstreamRateLimited`,
//! `UpstreamError`) are recovered inside fragment builders and never reach a
//! caller of `compose`. `AllSourcesUnavailable` is reported per fragment as a
//! warning. Only `NoFragmentsProduced` fails a `compose` call.

use std::time::Duration;

use marketpulse_sources::{FailureKind, SourceError};
use thiserror::Error;

/// Type alias for Result using our error type.
pub type Result<T> = std::result::Result<T, ContextError>;

/// Root error type for the context engine.
///
/// `Clone` because a single build failure is broadcast to every caller
/// waiting on the same cache key.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContextError {
    #[error("Upstream timeout: {endpoint}")]
    UpstreamTimeout { endpoint: String },

    #[error("Upstream rate limited: {endpoint}")]
    UpstreamRateLimited {
        endpoint: String,
        retry_after: Option<Duration>,
    },

    #[error("Upstream error: {endpoint} - {message}")]
    UpstreamError { endpoint: String, message: String },

    #[error("All sources unavailable for {fragment}: {}", .reasons.join("; "))]
    AllSourcesUnavailable {
        fragment: String,
        reasons: Vec<String>,
    },

    #[error("No fragments produced: {}", .warnings.join("; "))]
    NoFragmentsProduced { warnings: Vec<String> },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfig(String),
}

impl ContextError {
    /// Failure kind for upstream errors, `None` for engine-level errors.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::UpstreamTimeout { .. } => Some(FailureKind::Timeout),
            Self::UpstreamRateLimited { .. } => Some(FailureKind::RateLimited),
            Self::UpstreamError { .. } => Some(FailureKind::UpstreamError),
            _ => None,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::UpstreamRateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<SourceError> for ContextError {
    fn from(error: SourceError) -> Self {
        match error {
            SourceError::Timeout { endpoint, .. } => Self::UpstreamTimeout { endpoint },
            SourceError::RateLimited {
                endpoint,
                retry_after,
            } => Self::UpstreamRateLimited {
                endpoint,
                retry_after,
            },
            SourceError::Upstream { endpoint, message } => Self::UpstreamError { endpoint, message },
            SourceError::PartialData { endpoint, missing } => Self::UpstreamError {
                endpoint,
                message: format!("missing {}", missing.join(", ")),
            },
            SourceError::CircuitOpen { endpoint } => Self::UpstreamError {
                endpoint,
                message: "circuit open".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_errors_keep_their_kind() {
        let timeout: ContextError = SourceError::Timeout {
            endpoint: "global_indices".to_string(),
            elapsed: Duration::from_secs(5),
        }
        .into();
        assert_eq!(timeout.failure_kind(), Some(FailureKind::Timeout));

        let limited: ContextError = SourceError::RateLimited {
            endpoint: "sector_performance".to_string(),
            retry_after: Some(Duration::from_secs(90)),
        }
        .into();
        assert_eq!(limited.failure_kind(), Some(FailureKind::RateLimited));
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(90)));

        let open: ContextError = SourceError::CircuitOpen {
            endpoint: "fundamentals".to_string(),
        }
        .into();
        assert_eq!(open.failure_kind(), Some(FailureKind::UpstreamError));
    }

    #[test]
    fn test_engine_errors_have_no_failure_kind() {
        let error = ContextError::NoFragmentsProduced {
            warnings: vec!["primary: upstream down".to_string()],
        };
        assert_eq!(error.failure_kind(), None);
        assert_eq!(
            error.to_string(),
            "No fragments produced: primary: upstream down"
        );
    }
}
