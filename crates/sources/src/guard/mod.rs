//! Resilience primitives applied in front of upstream endpoints.
//!
//! - Token bucket throttling per endpoint
//! - Circuit breaking per endpoint

mod circuit_breaker;
mod rate_limiter;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use rate_limiter::{RateLimitConfig, RateLimiter};
