//! Value types shared between fragments.

use marketpulse_sources::{FundamentalsSnapshot, IndexSnapshot, QuoteSnapshot, SectorSnapshot};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::ValuationBands;
use crate::indicators::{to_f64, Macd, TrendDirection};

/// Level and daily change of an index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexMove {
    pub symbol: String,
    pub name: String,
    pub value: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
}

impl IndexMove {
    /// Neutral placeholder: zero level, no change.
    pub fn flat(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            value: Decimal::ZERO,
            change: Decimal::ZERO,
            change_percent: Decimal::ZERO,
        }
    }

    pub fn from_quote(quote: &QuoteSnapshot) -> Self {
        Self {
            symbol: quote.symbol.clone(),
            name: quote.symbol.clone(),
            value: quote.last,
            change: quote.change(),
            change_percent: quote.change_percent().round_dp(2),
        }
    }
}

impl From<&IndexSnapshot> for IndexMove {
    fn from(snapshot: &IndexSnapshot) -> Self {
        Self {
            symbol: snapshot.symbol.clone(),
            name: snapshot.name.clone(),
            value: snapshot.value,
            change: snapshot.change,
            change_percent: snapshot.change_percent,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketSentiment {
    Bullish,
    Neutral,
    Bearish,
}

impl MarketSentiment {
    /// Sentiment band of a 0-100 market score.
    pub fn from_score(score: f64) -> Self {
        if score >= 60.0 {
            Self::Bullish
        } else if score <= 40.0 {
            Self::Bearish
        } else {
            Self::Neutral
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradingStyle {
    Intraday,
    Swing,
    LongTerm,
    Hedged,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorMove {
    pub sector: String,
    pub change_percent_1d: Decimal,
    pub change_percent_1w: Decimal,
}

impl From<&SectorSnapshot> for SectorMove {
    fn from(snapshot: &SectorSnapshot) -> Self {
        Self {
            sector: snapshot.sector.clone(),
            change_percent_1d: snapshot.change_percent_1d,
            change_percent_1w: snapshot.change_percent_1w,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RotationBias {
    RiskOn,
    Mixed,
    RiskOff,
}

/// Weekly sector leadership.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorRotation {
    pub leading: Vec<SectorMove>,
    pub lagging: Vec<SectorMove>,
    pub bias: RotationBias,
}

impl SectorRotation {
    pub fn neutral() -> Self {
        Self {
            leading: Vec::new(),
            lagging: Vec::new(),
            bias: RotationBias::Mixed,
        }
    }

    /// Rank sectors by weekly change. The bias reads how many of the leaders
    /// are defensive sectors.
    pub fn from_sectors<'a, I>(sectors: I, defensive: &[String], rank_size: usize) -> Self
    where
        I: IntoIterator<Item = &'a SectorSnapshot>,
    {
        let mut ranked: Vec<&SectorSnapshot> = sectors.into_iter().collect();
        if ranked.is_empty() {
            return Self::neutral();
        }
        ranked.sort_by(|a, b| {
            b.change_percent_1w
                .cmp(&a.change_percent_1w)
                .then_with(|| a.sector.cmp(&b.sector))
        });

        let leading: Vec<SectorMove> = ranked.iter().take(rank_size).map(|s| SectorMove::from(*s)).collect();
        let lagging: Vec<SectorMove> = ranked
            .iter()
            .rev()
            .take(rank_size)
            .map(|s| SectorMove::from(*s))
            .collect();

        let defensive_leaders = leading
            .iter()
            .filter(|m| defensive.iter().any(|d| d.eq_ignore_ascii_case(&m.sector)))
            .count();
        let bias = if defensive_leaders == 0 {
            RotationBias::RiskOn
        } else if defensive_leaders * 2 > leading.len() {
            RotationBias::RiskOff
        } else {
            RotationBias::Mixed
        };

        Self {
            leading,
            lagging,
            bias,
        }
    }
}

/// Daily technical indicators for the scope index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalSnapshot {
    pub rsi_14: Option<f64>,
    pub macd: Option<Macd>,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub trend: TrendDirection,
}

impl TechnicalSnapshot {
    pub fn neutral() -> Self {
        Self {
            rsi_14: None,
            macd: None,
            sma_20: None,
            sma_50: None,
            trend: TrendDirection::Sideways,
        }
    }
}

/// Current session OHLC.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRange {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub last: Decimal,
    pub previous_close: Decimal,
    pub change_percent: Decimal,
}

impl From<&QuoteSnapshot> for SessionRange {
    fn from(quote: &QuoteSnapshot) -> Self {
        Self {
            open: quote.open,
            high: quote.high,
            low: quote.low,
            last: quote.last,
            previous_close: quote.previous_close,
            change_percent: quote.change_percent().round_dp(2),
        }
    }
}

/// Recent multi-day range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwingRange {
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    /// Percentage return over the window.
    pub return_percent: Option<f64>,
    pub sessions: usize,
}

impl SwingRange {
    pub fn neutral() -> Self {
        Self {
            high: None,
            low: None,
            return_percent: None,
            sessions: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValuationZone {
    Undervalued,
    FairValue,
    Overvalued,
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Valuation {
    pub pe_ratio: Option<Decimal>,
    pub pb_ratio: Option<Decimal>,
    pub dividend_yield: Option<Decimal>,
    pub earnings_growth: Option<Decimal>,
    pub zone: ValuationZone,
}

impl Valuation {
    pub fn from_fundamentals(snapshot: &FundamentalsSnapshot, bands: &ValuationBands) -> Self {
        let zone = match snapshot.pe_ratio.map(to_f64) {
            None => ValuationZone::Unknown,
            Some(pe) if pe <= 0.0 => ValuationZone::Unknown,
            Some(pe) if pe < bands.undervalued_below_pe => ValuationZone::Undervalued,
            Some(pe) if pe > bands.overvalued_above_pe => ValuationZone::Overvalued,
            Some(_) => ValuationZone::FairValue,
        };
        Self {
            pe_ratio: snapshot.pe_ratio,
            pb_ratio: snapshot.pb_ratio,
            dividend_yield: snapshot.dividend_yield,
            earnings_growth: snapshot.earnings_growth,
            zone,
        }
    }
}
