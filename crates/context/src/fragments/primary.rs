use serde::Serialize;

use super::{IndexMove, MarketSentiment, TradingStyle};
use crate::provenance::{FieldProvenance, Tagged};

/// Market overview: global and domestic index moves and an aggregate score.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryContext {
    pub version: u32,
    pub scope_index: String,
    pub global_indices: Tagged<Vec<IndexMove>>,
    /// One entry per domestic symbol; each symbol can degrade on its own.
    pub domestic_indices: Vec<Tagged<IndexMove>>,
    /// 0-100, 50 is flat.
    pub market_score: Tagged<f64>,
    pub sentiment: Tagged<MarketSentiment>,
    pub favorable_styles: Tagged<Vec<TradingStyle>>,
}

impl PrimaryContext {
    /// Domestic move for `symbol`, if reported.
    pub fn domestic(&self, symbol: &str) -> Option<&Tagged<IndexMove>> {
        self.domestic_indices
            .iter()
            .find(|m| m.value.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn field_provenance(&self) -> Vec<FieldProvenance> {
        let mut fields = vec![FieldProvenance::new(
            "globalIndices",
            self.global_indices.provenance,
        )];
        fields.extend(
            self.domestic_indices
                .iter()
                .map(|m| FieldProvenance::new("domesticIndices", m.provenance)),
        );
        fields.push(FieldProvenance::new("marketScore", self.market_score.provenance));
        fields.push(FieldProvenance::new("sentiment", self.sentiment.provenance));
        fields.push(FieldProvenance::new(
            "favorableStyles",
            self.favorable_styles.provenance,
        ));
        fields
    }

    pub(crate) fn demote_to_stale(&mut self) {
        self.global_indices.demote_to_stale();
        for domestic in &mut self.domestic_indices {
            domestic.demote_to_stale();
        }
        self.market_score.demote_to_stale();
        self.sentiment.demote_to_stale();
        self.favorable_styles.demote_to_stale();
    }
}
