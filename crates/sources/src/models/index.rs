use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Current level and daily change of a market index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSnapshot {
    /// Provider-agnostic index symbol (e.g., "SPX", "NIFTY")
    pub symbol: String,

    /// Display name
    pub name: String,

    /// Last traded level
    pub value: Decimal,

    /// Absolute change from the previous close
    pub change: Decimal,

    /// Percentage change from the previous close
    pub change_percent: Decimal,

    /// Time the provider stamped the value
    pub timestamp: DateTime<Utc>,
}
