use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Valuation fundamentals for an index or instrument.
///
/// Providers frequently omit individual ratios, so every metric is optional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundamentalsSnapshot {
    pub symbol: String,

    /// Trailing price/earnings ratio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<Decimal>,

    /// Price/book ratio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pb_ratio: Option<Decimal>,

    /// Dividend yield in percent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dividend_yield: Option<Decimal>,

    /// Year-over-year earnings growth in percent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earnings_growth: Option<Decimal>,

    pub as_of: DateTime<Utc>,
}
