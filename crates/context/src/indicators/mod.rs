//! Pure technical indicator functions.
//!
//! Everything here is a deterministic function of raw OHLC/quote data. The
//! numerical definitions are the textbook ones; fragment builders own the
//! decision of which inputs to feed in and how to tag the results.

mod breadth;
mod levels;
mod moving_average;
mod oscillators;
mod trend;

pub use breadth::{market_breadth, BreadthState, MarketBreadth};
pub use levels::{approximate_vwap, pivot_levels, PivotLevels};
pub use moving_average::{ema_series, sma};
pub use oscillators::{macd, rsi, Macd};
pub use trend::{classify_momentum, classify_trend, percent_return, Momentum, TrendDirection};

use marketpulse_sources::Candle;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;

pub(crate) fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Closing prices in candle order.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| to_f64(c.close)).collect()
}

/// Round to two decimals for presentation.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
