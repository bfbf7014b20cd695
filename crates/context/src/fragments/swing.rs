use serde::Serialize;

use super::{SectorRotation, SwingRange};
use crate::indicators::{Momentum, PivotLevels, TrendDirection};
use crate::provenance::{FieldProvenance, Tagged};

/// Multi-day view: pivots and momentum plus trend, range and rotation.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwingContext {
    pub version: u32,
    pub scope_index: String,
    pub pivots: Tagged<PivotLevels>,
    pub momentum: Tagged<Momentum>,
    pub trend: Tagged<TrendDirection>,
    pub swing_range: Tagged<SwingRange>,
    pub sector_rotation: Tagged<SectorRotation>,
}

impl SwingContext {
    pub fn field_provenance(&self) -> Vec<FieldProvenance> {
        vec![
            FieldProvenance::new("pivots", self.pivots.provenance),
            FieldProvenance::new("momentum", self.momentum.provenance),
            FieldProvenance::new("trend", self.trend.provenance),
            FieldProvenance::new("swingRange", self.swing_range.provenance),
            FieldProvenance::new("sectorRotation", self.sector_rotation.provenance),
        ]
    }

    pub(crate) fn demote_to_stale(&mut self) {
        self.pivots.demote_to_stale();
        self.momentum.demote_to_stale();
        self.trend.demote_to_stale();
        self.swing_range.demote_to_stale();
        self.sector_rotation.demote_to_stale();
    }
}
