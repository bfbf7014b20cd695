use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::SourceError;

/// Current-session quote for a named instrument.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSnapshot {
    /// Instrument symbol as requested
    pub symbol: String,

    /// Timestamp of the quote
    pub timestamp: DateTime<Utc>,

    /// Session open
    pub open: Decimal,

    /// Session high
    pub high: Decimal,

    /// Session low
    pub low: Decimal,

    /// Last traded price
    pub last: Decimal,

    /// Previous session close
    pub previous_close: Decimal,

    /// Session volume (indices usually have none)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<Decimal>,
}

impl QuoteSnapshot {
    /// Absolute change from the previous close.
    pub fn change(&self) -> Decimal {
        self.last - self.previous_close
    }

    /// Percentage change from the previous close, zero when the previous close is unknown.
    pub fn change_percent(&self) -> Decimal {
        if self.previous_close.is_zero() {
            return Decimal::ZERO;
        }
        (self.change() / self.previous_close) * Decimal::ONE_HUNDRED
    }
}

/// Result of a batch quote request.
///
/// Providers answer batch requests symbol by symbol, so a batch can succeed
/// for some instruments and fail for others. Each requested symbol maps to
/// its own result.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuoteBatch {
    pub results: BTreeMap<String, Result<QuoteSnapshot, SourceError>>,
}

impl QuoteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result for a single symbol, replacing any previous one.
    pub fn insert(&mut self, symbol: impl Into<String>, result: Result<QuoteSnapshot, SourceError>) {
        self.results.insert(symbol.into(), result);
    }

    /// Successful quote for `symbol`, if any.
    pub fn quote(&self, symbol: &str) -> Option<&QuoteSnapshot> {
        self.results.get(symbol).and_then(|r| r.as_ref().ok())
    }

    /// Symbols whose individual fetch failed.
    pub fn failed_symbols(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|(_, r)| r.is_err())
            .map(|(s, _)| s.as_str())
            .collect()
    }

    /// True when at least one symbol succeeded.
    pub fn has_any_success(&self) -> bool {
        self.results.values().any(|r| r.is_ok())
    }

    /// True when every requested symbol succeeded.
    pub fn is_complete(&self) -> bool {
        !self.results.is_empty() && self.results.values().all(|r| r.is_ok())
    }
}

impl FromIterator<QuoteSnapshot> for QuoteBatch {
    fn from_iter<I: IntoIterator<Item = QuoteSnapshot>>(iter: I) -> Self {
        let mut batch = Self::new();
        for quote in iter {
            batch.insert(quote.symbol.clone(), Ok(quote));
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn quote(symbol: &str, last: Decimal, previous_close: Decimal) -> QuoteSnapshot {
        QuoteSnapshot {
            symbol: symbol.to_string(),
            timestamp: Utc::now(),
            open: previous_close,
            high: last.max(previous_close),
            low: last.min(previous_close),
            last,
            previous_close,
            volume: None,
        }
    }

    #[test]
    fn test_change_percent() {
        let q = quote("NIFTY", dec!(22220), dec!(22000));
        assert_eq!(q.change(), dec!(220));
        assert_eq!(q.change_percent(), dec!(1));
    }

    #[test]
    fn test_change_percent_without_previous_close() {
        let q = quote("NEW", dec!(10), dec!(0));
        assert_eq!(q.change_percent(), Decimal::ZERO);
    }

    #[test]
    fn test_batch_partial_failure_is_representable() {
        let mut batch = QuoteBatch::new();
        batch.insert("NIFTY", Ok(quote("NIFTY", dec!(22100), dec!(22000))));
        batch.insert(
            "BANKNIFTY",
            Err(SourceError::upstream("domestic_quotes", "symbol suspended")),
        );

        assert!(batch.has_any_success());
        assert!(!batch.is_complete());
        assert_eq!(batch.failed_symbols(), vec!["BANKNIFTY"]);
        assert!(batch.quote("NIFTY").is_some());
        assert!(batch.quote("BANKNIFTY").is_none());
    }

    #[test]
    fn test_batch_from_quotes_is_complete() {
        let batch: QuoteBatch = vec![
            quote("NIFTY", dec!(1), dec!(1)),
            quote("SENSEX", dec!(2), dec!(2)),
        ]
        .into_iter()
        .collect();
        assert!(batch.is_complete());
        assert!(batch.failed_symbols().is_empty());
    }
}
