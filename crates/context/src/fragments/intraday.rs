use rust_decimal::Decimal;
use serde::Serialize;

use super::SessionRange;
use crate::indicators::{Momentum, PivotLevels};
use crate::provenance::{FieldProvenance, Tagged};

/// Current-session levels for the scope index.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntradayContext {
    pub version: u32,
    pub scope_index: String,
    pub session: Tagged<SessionRange>,
    pub pivots: Tagged<PivotLevels>,
    /// Typical price of the session bar; no tick data is available.
    pub vwap: Tagged<Decimal>,
    pub momentum: Tagged<Momentum>,
}

impl IntradayContext {
    pub fn field_provenance(&self) -> Vec<FieldProvenance> {
        vec![
            FieldProvenance::new("session", self.session.provenance),
            FieldProvenance::new("pivots", self.pivots.provenance),
            FieldProvenance::new("vwap", self.vwap.provenance),
            FieldProvenance::new("momentum", self.momentum.provenance),
        ]
    }

    pub(crate) fn promote_to_reused(&mut self) {
        self.session.promote_to_reused();
        self.pivots.promote_to_reused();
        self.vwap.promote_to_reused();
        self.momentum.promote_to_reused();
    }

    pub(crate) fn demote_to_stale(&mut self) {
        self.session.demote_to_stale();
        self.pivots.demote_to_stale();
        self.vwap.demote_to_stale();
        self.momentum.demote_to_stale();
    }
}
