use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Classic floor-trader pivot levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotLevels {
    pub pivot: Decimal,
    pub r1: Decimal,
    pub r2: Decimal,
    pub r3: Decimal,
    pub s1: Decimal,
    pub s2: Decimal,
    pub s3: Decimal,
}

pub fn pivot_levels(high: Decimal, low: Decimal, close: Decimal) -> PivotLevels {
    let two = Decimal::TWO;
    let pivot = ((high + low + close) / Decimal::from(3)).round_dp(2);
    let range = high - low;
    PivotLevels {
        pivot,
        r1: (two * pivot - low).round_dp(2),
        r2: (pivot + range).round_dp(2),
        r3: (high + two * (pivot - low)).round_dp(2),
        s1: (two * pivot - high).round_dp(2),
        s2: (pivot - range).round_dp(2),
        s3: (low - two * (high - pivot)).round_dp(2),
    }
}

/// VWAP estimate from the session's typical price.
///
/// Without tick data the typical price `(H + L + C) / 3` stands in for the
/// volume-weighted average.
pub fn approximate_vwap(high: Decimal, low: Decimal, close: Decimal) -> Decimal {
    ((high + low + close) / Decimal::from(3)).round_dp(2)
}
