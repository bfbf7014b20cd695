use serde::Serialize;

use super::{IndexMove, SectorMove, TechnicalSnapshot};
use crate::indicators::MarketBreadth;
use crate::provenance::{FieldProvenance, Tagged};

/// Technicals, breadth and sector leadership for the scope index.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedContext {
    pub version: u32,
    pub scope_index: String,
    pub index_level: Tagged<IndexMove>,
    pub technicals: Tagged<TechnicalSnapshot>,
    pub breadth: Tagged<MarketBreadth>,
    pub sector_leaders: Tagged<Vec<SectorMove>>,
    pub sector_laggards: Tagged<Vec<SectorMove>>,
}

impl DetailedContext {
    pub fn field_provenance(&self) -> Vec<FieldProvenance> {
        vec![
            FieldProvenance::new("indexLevel", self.index_level.provenance),
            FieldProvenance::new("technicals", self.technicals.provenance),
            FieldProvenance::new("breadth", self.breadth.provenance),
            FieldProvenance::new("sectorLeaders", self.sector_leaders.provenance),
            FieldProvenance::new("sectorLaggards", self.sector_laggards.provenance),
        ]
    }

    pub(crate) fn demote_to_stale(&mut self) {
        self.index_level.demote_to_stale();
        self.technicals.demote_to_stale();
        self.breadth.demote_to_stale();
        self.sector_leaders.demote_to_stale();
        self.sector_laggards.demote_to_stale();
    }
}
