//! Gateway decorator adding bounded timeouts, throttling, and circuit breaking.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};

use super::{Endpoint, SourceGateway};
use crate::errors::SourceError;
use crate::guard::{CircuitBreaker, CircuitBreakerConfig, RateLimitConfig, RateLimiter};
use crate::models::{
    Candle, CandleInterval, FundamentalsSnapshot, HistoryRange, IndexSnapshot, QuoteBatch,
    SectorSnapshot,
};

/// Default bound on a single upstream call.
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings for [`GuardedGateway`].
#[derive(Clone, Debug)]
pub struct GatewayGuardConfig {
    /// Upper bound on every upstream call.
    pub call_timeout: Duration,
    /// Token bucket applied to each endpoint.
    pub rate_limit: RateLimitConfig,
    /// Circuit breaker thresholds shared by all endpoints.
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for GatewayGuardConfig {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
            rate_limit: RateLimitConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

/// Wraps a [`SourceGateway`] so that no call can hang a build.
///
/// Every call is checked in this order:
/// 1. Circuit breaker (open circuit fails fast as `CircuitOpen`)
/// 2. Token bucket (empty bucket fails fast as `RateLimited` with a retry hint)
/// 3. The inner call, bounded by `call_timeout` (elapsed maps to `Timeout`)
pub struct GuardedGateway<G> {
    inner: G,
    call_timeout: Duration,
    rate_limiter: RateLimiter,
    circuit_breaker: CircuitBreaker,
}

impl<G: SourceGateway> GuardedGateway<G> {
    pub fn new(inner: G, config: GatewayGuardConfig) -> Self {
        Self {
            inner,
            call_timeout: config.call_timeout,
            rate_limiter: RateLimiter::new(config.rate_limit),
            circuit_breaker: CircuitBreaker::with_config(config.circuit_breaker),
        }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    async fn guard<T, F>(&self, endpoint: Endpoint, call: F) -> Result<T, SourceError>
    where
        T: Send,
        F: Future<Output = Result<T, SourceError>> + Send,
    {
        if !self.circuit_breaker.is_allowed(endpoint) {
            debug!("Circuit open for '{}', failing fast", endpoint);
            return Err(SourceError::CircuitOpen {
                endpoint: endpoint.to_string(),
            });
        }

        if let Err(wait) = self.rate_limiter.try_acquire(endpoint) {
            return Err(SourceError::RateLimited {
                endpoint: endpoint.to_string(),
                retry_after: Some(wait),
            });
        }

        let result = match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout {
                endpoint: endpoint.to_string(),
                elapsed: self.call_timeout,
            }),
        };

        match &result {
            Ok(_) => self.circuit_breaker.record_success(endpoint),
            Err(e) if e.trips_circuit() => {
                warn!("Gateway '{}' call '{}' failed: {}", self.inner.id(), endpoint, e);
                self.circuit_breaker.record_failure(endpoint);
            }
            Err(e) => debug!("Gateway '{}' call '{}' refused: {}", self.inner.id(), endpoint, e),
        }

        result
    }
}

#[async_trait]
impl<G: SourceGateway> SourceGateway for GuardedGateway<G> {
    fn id(&self) -> &'static str {
        self.inner.id()
    }

    async fn fetch_global_indices(&self) -> Result<Vec<IndexSnapshot>, SourceError> {
        self.guard(Endpoint::GlobalIndices, self.inner.fetch_global_indices())
            .await
    }

    async fn fetch_domestic_quotes(&self, symbols: &[String]) -> Result<QuoteBatch, SourceError> {
        self.guard(
            Endpoint::DomesticQuotes,
            self.inner.fetch_domestic_quotes(symbols),
        )
        .await
    }

    async fn fetch_historical_candles(
        &self,
        symbol: &str,
        interval: CandleInterval,
        range: HistoryRange,
    ) -> Result<Vec<Candle>, SourceError> {
        self.guard(
            Endpoint::HistoricalCandles,
            self.inner.fetch_historical_candles(symbol, interval, range),
        )
        .await
    }

    async fn fetch_sector_performance(&self) -> Result<Vec<SectorSnapshot>, SourceError> {
        self.guard(
            Endpoint::SectorPerformance,
            self.inner.fetch_sector_performance(),
        )
        .await
    }

    async fn fetch_fundamentals(&self, symbol: &str) -> Result<FundamentalsSnapshot, SourceError> {
        self.guard(Endpoint::Fundamentals, self.inner.fetch_fundamentals(symbol))
            .await
    }
}
