//! Response quality scoring.
//!
//! Advisory only: a low score never blocks a response.

use serde::Serialize;

use crate::cache::ProvenanceSummary;
use crate::fragments::Fragment;
use crate::provenance::Provenance;

/// Quality of one assembled response. Percentages are fractions in `[0, 1]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    /// Weighted provenance average.
    pub overall_score: f64,
    /// Real and reused fields.
    pub real_percentage: f64,
    /// Reused fields alone, a subset of `real_percentage`.
    pub reused_percentage: f64,
    pub approximated_percentage: f64,
    pub fallback_percentage: f64,
    pub field_count: usize,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct QualityScorer;

impl QualityScorer {
    pub fn score<'a, I>(&self, fragments: I) -> QualityReport
    where
        I: IntoIterator<Item = &'a Fragment>,
    {
        self.score_provenances(
            fragments
                .into_iter()
                .flat_map(|fragment| fragment.field_provenance())
                .map(|field| field.provenance),
        )
    }

    pub fn score_provenances<I>(&self, provenances: I) -> QualityReport
    where
        I: IntoIterator<Item = Provenance>,
    {
        let summary = ProvenanceSummary::from_provenances(provenances);
        let total = summary.total();
        if total == 0 {
            return QualityReport::default();
        }

        let weighted = summary.real as f64 * Provenance::Real.weight()
            + summary.reused as f64 * Provenance::Reused.weight()
            + summary.approximated as f64 * Provenance::Approximated.weight()
            + summary.stale_fallback as f64 * Provenance::StaleFallback.weight();
        let total_f = total as f64;

        QualityReport {
            overall_score: (weighted / total_f).clamp(0.0, 1.0),
            real_percentage: (summary.real + summary.reused) as f64 / total_f,
            reused_percentage: summary.reused as f64 / total_f,
            approximated_percentage: summary.approximated as f64 / total_f,
            fallback_percentage: summary.stale_fallback as f64 / total_f,
            field_count: total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn provenance() -> impl Strategy<Value = Provenance> {
        prop_oneof![
            Just(Provenance::Real),
            Just(Provenance::Reused),
            Just(Provenance::Approximated),
            Just(Provenance::StaleFallback),
        ]
    }

    #[test]
    fn test_all_real_scores_one() {
        let report = QualityScorer.score_provenances([Provenance::Real; 4]);
        assert_eq!(report.overall_score, 1.0);
        assert_eq!(report.real_percentage, 1.0);
        assert_eq!(report.field_count, 4);
    }

    #[test]
    fn test_weighted_blend() {
        let report = QualityScorer.score_provenances([
            Provenance::Real,
            Provenance::Reused,
            Provenance::Approximated,
            Provenance::StaleFallback,
        ]);
        assert!((report.overall_score - 0.65).abs() < 1e-9);
        assert_eq!(report.real_percentage, 0.5);
        assert_eq!(report.reused_percentage, 0.25);
        assert_eq!(report.approximated_percentage, 0.25);
        assert_eq!(report.fallback_percentage, 0.25);
    }

    #[test]
    fn test_empty_input() {
        let report = QualityScorer.score_provenances(Vec::new());
        assert_eq!(report, QualityReport::default());
    }

    proptest! {
        #[test]
        fn prop_score_bounds_and_breakdown(provenances in prop::collection::vec(provenance(), 1..200)) {
            let report = QualityScorer.score_provenances(provenances.clone());
            prop_assert!((0.0..=1.0).contains(&report.overall_score));
            let sum = report.real_percentage + report.approximated_percentage + report.fallback_percentage;
            prop_assert!((sum - 1.0).abs() < 1e-9);
            prop_assert!(report.reused_percentage <= report.real_percentage);
            prop_assert_eq!(report.field_count, provenances.len());
        }
    }
}
