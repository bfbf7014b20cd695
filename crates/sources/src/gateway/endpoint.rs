use serde::{Deserialize, Serialize};

/// The five upstream calls a gateway exposes.
///
/// Throttling and circuit breaking are tracked per endpoint, so a failing
/// fundamentals feed does not block index quotes served by the same gateway.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    GlobalIndices,
    DomesticQuotes,
    HistoricalCandles,
    SectorPerformance,
    Fundamentals,
}

impl Endpoint {
    pub const ALL: [Endpoint; 5] = [
        Endpoint::GlobalIndices,
        Endpoint::DomesticQuotes,
        Endpoint::HistoricalCandles,
        Endpoint::SectorPerformance,
        Endpoint::Fundamentals,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GlobalIndices => "global_indices",
            Self::DomesticQuotes => "domestic_quotes",
            Self::HistoricalCandles => "historical_candles",
            Self::SectorPerformance => "sector_performance",
            Self::Fundamentals => "fundamentals",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
