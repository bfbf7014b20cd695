use serde::{Deserialize, Serialize};

use super::sma;

/// Short-term momentum bucket derived from the session change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Momentum {
    StrongBullish,
    Bullish,
    Neutral,
    Bearish,
    StrongBearish,
}

/// Classify momentum from a percentage change.
pub fn classify_momentum(change_percent: f64) -> Momentum {
    match change_percent {
        c if c >= 1.0 => Momentum::StrongBullish,
        c if c >= 0.25 => Momentum::Bullish,
        c if c <= -1.0 => Momentum::StrongBearish,
        c if c <= -0.25 => Momentum::Bearish,
        _ => Momentum::Neutral,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendDirection {
    Uptrend,
    Sideways,
    Downtrend,
}

/// Trend from the alignment of price, a short SMA and a long SMA.
///
/// Falls back to `Sideways` when there is not enough history.
pub fn classify_trend(closes: &[f64], short: usize, long: usize) -> TrendDirection {
    let (Some(last), Some(short_ma), Some(long_ma)) =
        (closes.last(), sma(closes, short), sma(closes, long))
    else {
        return TrendDirection::Sideways;
    };

    if *last > short_ma && short_ma > long_ma {
        TrendDirection::Uptrend
    } else if *last < short_ma && short_ma < long_ma {
        TrendDirection::Downtrend
    } else {
        TrendDirection::Sideways
    }
}

/// Percentage return over the last `lookback` periods.
pub fn percent_return(closes: &[f64], lookback: usize) -> Option<f64> {
    if lookback == 0 || closes.len() <= lookback {
        return None;
    }
    let last = closes[closes.len() - 1];
    let base = closes[closes.len() - 1 - lookback];
    if base == 0.0 {
        return None;
    }
    Some((last - base) / base * 100.0)
}
