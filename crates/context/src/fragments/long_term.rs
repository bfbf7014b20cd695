use serde::Serialize;

use super::{SectorRotation, Valuation};
use crate::config::MacroOutlook;
use crate::indicators::TrendDirection;
use crate::provenance::{FieldProvenance, Tagged};

/// Positional view: valuation, long-term trend, rotation and macro cycle.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LongTermContext {
    pub version: u32,
    pub scope_index: String,
    pub sector_rotation: Tagged<SectorRotation>,
    pub valuation: Tagged<Valuation>,
    pub long_term_trend: Tagged<TrendDirection>,
    /// Read from configuration, so always approximated.
    pub macro_cycle: Tagged<MacroOutlook>,
}

impl LongTermContext {
    pub fn field_provenance(&self) -> Vec<FieldProvenance> {
        vec![
            FieldProvenance::new("sectorRotation", self.sector_rotation.provenance),
            FieldProvenance::new("valuation", self.valuation.provenance),
            FieldProvenance::new("longTermTrend", self.long_term_trend.provenance),
            FieldProvenance::new("macroCycle", self.macro_cycle.provenance),
        ]
    }

    pub(crate) fn demote_to_stale(&mut self) {
        self.sector_rotation.demote_to_stale();
        self.valuation.demote_to_stale();
        self.long_term_trend.demote_to_stale();
        self.macro_cycle.demote_to_stale();
    }
}
