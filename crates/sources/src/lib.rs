//! MarketPulse Sources
//!
//! The upstream boundary of the MarketPulse context engine. The engine never
//! calls a brokerage or public-finance API itself; it consumes the
//! [`SourceGateway`] contract defined here.
//!
//! # Overview
//!
//! - Raw snapshot models: index levels, quotes, candles, sector performance,
//!   fundamentals
//! - A shared failure taxonomy ([`FailureKind`]) every gateway maps its
//!   provider errors onto
//! - [`GuardedGateway`], which bounds every call with a timeout and protects
//!   endpoints with throttling and circuit breaking
//!
//! ```text
//! +------------------+     +------------------+     +------------------+
//! |  Context engine  | --> |  GuardedGateway  | --> |  SourceGateway   |  (broker / public API adapter)
//! +------------------+     +------------------+     +------------------+
//!                           timeout | throttle | circuit
//! ```

pub mod errors;
pub mod gateway;
pub mod guard;
pub mod models;

pub use errors::{FailureKind, SourceError};
pub use gateway::{Endpoint, GatewayGuardConfig, GuardedGateway, SourceGateway};
pub use guard::{CircuitBreaker, CircuitBreakerConfig, CircuitState, RateLimitConfig, RateLimiter};
pub use models::{
    Candle, CandleInterval, FundamentalsSnapshot, HistoryRange, IndexSnapshot, QuoteBatch,
    QuoteSnapshot, SectorSnapshot,
};
