use marketpulse_sources::SectorSnapshot;
use serde::{Deserialize, Serialize};

use super::round2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreadthState {
    Strong,
    Neutral,
    Weak,
}

/// Advance/decline breadth aggregated over sectors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketBreadth {
    pub advancers: u32,
    pub decliners: u32,
    pub advance_decline_ratio: f64,
    pub state: BreadthState,
}

impl MarketBreadth {
    /// Breadth used when no sector data is available.
    pub fn neutral() -> Self {
        Self {
            advancers: 0,
            decliners: 0,
            advance_decline_ratio: 1.0,
            state: BreadthState::Neutral,
        }
    }
}

pub fn market_breadth(sectors: &[SectorSnapshot]) -> MarketBreadth {
    let advancers: u32 = sectors.iter().map(|s| s.advancers).sum();
    let decliners: u32 = sectors.iter().map(|s| s.decliners).sum();

    if advancers == 0 && decliners == 0 {
        return MarketBreadth::neutral();
    }

    let ratio = advancers as f64 / decliners.max(1) as f64;
    let state = if ratio >= 1.5 {
        BreadthState::Strong
    } else if ratio <= 0.67 {
        BreadthState::Weak
    } else {
        BreadthState::Neutral
    };

    MarketBreadth {
        advancers,
        decliners,
        advance_decline_ratio: round2(ratio),
        state,
    }
}
