//! Source gateway trait definition.
//!
//! The context engine never talks to a brokerage or public-finance API
//! directly. It consumes this contract, and the gateway implementation is
//! responsible for translating provider errors into [`SourceError`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::SourceError;
use crate::models::{
    Candle, CandleInterval, FundamentalsSnapshot, HistoryRange, IndexSnapshot, QuoteBatch,
    SectorSnapshot,
};

/// Uniform async interface to the upstream market data providers.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use marketpulse_sources::{SourceGateway, SourceError};
///
/// struct BrokerGateway {
///     client: BrokerClient,
/// }
///
/// #[async_trait]
/// impl SourceGateway for BrokerGateway {
///     fn id(&self) -> &'static str {
///         "BROKER"
///     }
///
///     // ... implement the fetch methods
/// }
/// ```
#[async_trait]
pub trait SourceGateway: Send + Sync {
    /// Identifier used in logs.
    fn id(&self) -> &'static str;

    /// Current value and change for the fixed set of global indices.
    async fn fetch_global_indices(&self) -> Result<Vec<IndexSnapshot>, SourceError>;

    /// Current quotes for named domestic instruments.
    ///
    /// Per-symbol failures belong in the returned [`QuoteBatch`]. An `Err`
    /// means the whole batch failed.
    async fn fetch_domestic_quotes(&self, symbols: &[String]) -> Result<QuoteBatch, SourceError>;

    /// Historical candles ordered by timestamp ascending.
    async fn fetch_historical_candles(
        &self,
        symbol: &str,
        interval: CandleInterval,
        range: HistoryRange,
    ) -> Result<Vec<Candle>, SourceError>;

    /// Performance snapshot for every tracked sector.
    async fn fetch_sector_performance(&self) -> Result<Vec<SectorSnapshot>, SourceError>;

    /// Valuation fundamentals for an index or instrument.
    async fn fetch_fundamentals(&self, symbol: &str) -> Result<FundamentalsSnapshot, SourceError>;
}

#[async_trait]
impl<T: SourceGateway + ?Sized> SourceGateway for Arc<T> {
    fn id(&self) -> &'static str {
        (**self).id()
    }

    async fn fetch_global_indices(&self) -> Result<Vec<IndexSnapshot>, SourceError> {
        (**self).fetch_global_indices().await
    }

    async fn fetch_domestic_quotes(&self, symbols: &[String]) -> Result<QuoteBatch, SourceError> {
        (**self).fetch_domestic_quotes(symbols).await
    }

    async fn fetch_historical_candles(
        &self,
        symbol: &str,
        interval: CandleInterval,
        range: HistoryRange,
    ) -> Result<Vec<Candle>, SourceError> {
        (**self).fetch_historical_candles(symbol, interval, range).await
    }

    async fn fetch_sector_performance(&self) -> Result<Vec<SectorSnapshot>, SourceError> {
        (**self).fetch_sector_performance().await
    }

    async fn fetch_fundamentals(&self, symbol: &str) -> Result<FundamentalsSnapshot, SourceError> {
        (**self).fetch_fundamentals(symbol).await
    }
}
