//! Raw upstream snapshot models
//!
//! These are the shapes every gateway returns, independent of the provider
//! that produced them:
//! - `index` - Index level/change snapshots (global and domestic)
//! - `quote` - Per-instrument OHLC quotes and batch results
//! - `candle` - Historical candles, intervals, and lookback ranges
//! - `sector` - Sector performance snapshots
//! - `fundamentals` - Valuation fundamentals

mod candle;
mod fundamentals;
mod index;
mod quote;
mod sector;

pub use candle::{Candle, CandleInterval, HistoryRange};
pub use fundamentals::FundamentalsSnapshot;
pub use index::IndexSnapshot;
pub use quote::{QuoteBatch, QuoteSnapshot};
pub use sector::SectorSnapshot;
