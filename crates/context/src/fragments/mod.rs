//! Fragment payloads.
//!
//! A fragment is one independently cacheable unit of market context. Every
//! derived field is a [`Tagged`](crate::provenance::Tagged) value, so a
//! single fragment can mix real, reused and approximated fields.

mod common;
mod detailed;
mod intraday;
mod long_term;
mod primary;
mod swing;

pub use common::{
    IndexMove, MarketSentiment, RotationBias, SectorMove, SectorRotation, SessionRange,
    SwingRange, TechnicalSnapshot, TradingStyle, Valuation, ValuationZone,
};
pub use detailed::DetailedContext;
pub use intraday::IntradayContext;
pub use long_term::LongTermContext;
pub use primary::PrimaryContext;
pub use swing::SwingContext;

use serde::{Deserialize, Serialize};

use crate::provenance::FieldProvenance;
use crate::scope::ContextScope;

/// The five fragment kinds, ordered by resolution order.
///
/// Resolving in `Ord` order guarantees a fragment that reuses a sibling
/// sees it already resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FragmentKind {
    Primary,
    Detailed,
    Intraday,
    Swing,
    LongTerm,
}

impl FragmentKind {
    pub const ALL: [FragmentKind; 5] = [
        FragmentKind::Primary,
        FragmentKind::Detailed,
        FragmentKind::Intraday,
        FragmentKind::Swing,
        FragmentKind::LongTerm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Detailed => "detailed",
            Self::Intraday => "intraday",
            Self::Swing => "swing",
            Self::LongTerm => "long_term",
        }
    }

    /// Fragments that must be resolved in the same pass before this one.
    pub fn required_dependencies(&self) -> &'static [FragmentKind] {
        match self {
            Self::Detailed => &[FragmentKind::Primary],
            _ => &[],
        }
    }

    /// Scope string identifying this fragment's cache slot.
    ///
    /// Primary and intraday data only depend on the index; the other
    /// fragments carry sector-filtered fields.
    pub fn scope_key(&self, scope: &ContextScope) -> String {
        match self {
            Self::Primary | Self::Intraday => scope.index_key(),
            Self::Detailed | Self::Swing | Self::LongTerm => scope.full_key(),
        }
    }
}

impl std::fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A built fragment.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Fragment {
    Primary(PrimaryContext),
    Detailed(DetailedContext),
    Intraday(IntradayContext),
    Swing(SwingContext),
    LongTerm(LongTermContext),
}

impl Fragment {
    pub fn kind(&self) -> FragmentKind {
        match self {
            Self::Primary(_) => FragmentKind::Primary,
            Self::Detailed(_) => FragmentKind::Detailed,
            Self::Intraday(_) => FragmentKind::Intraday,
            Self::Swing(_) => FragmentKind::Swing,
            Self::LongTerm(_) => FragmentKind::LongTerm,
        }
    }

    /// Normalized index the fragment was built for.
    pub fn scope_index(&self) -> &str {
        match self {
            Self::Primary(f) => &f.scope_index,
            Self::Detailed(f) => &f.scope_index,
            Self::Intraday(f) => &f.scope_index,
            Self::Swing(f) => &f.scope_index,
            Self::LongTerm(f) => &f.scope_index,
        }
    }

    /// Provenance of every tagged field.
    pub fn field_provenance(&self) -> Vec<FieldProvenance> {
        match self {
            Self::Primary(f) => f.field_provenance(),
            Self::Detailed(f) => f.field_provenance(),
            Self::Intraday(f) => f.field_provenance(),
            Self::Swing(f) => f.field_provenance(),
            Self::LongTerm(f) => f.field_provenance(),
        }
    }

    /// Copy served from a fresh same-bucket cache entry, with real fields
    /// marked reused. `None` for fragments whose cached copy keeps its tags.
    pub fn reused_copy(&self) -> Option<Fragment> {
        match self {
            Self::Intraday(f) => {
                let mut copy = f.clone();
                copy.promote_to_reused();
                Some(Self::Intraday(copy))
            }
            _ => None,
        }
    }

    /// Copy with every field marked as an expired fallback.
    pub fn demoted_to_stale(&self) -> Fragment {
        let mut copy = self.clone();
        match &mut copy {
            Self::Primary(f) => f.demote_to_stale(),
            Self::Detailed(f) => f.demote_to_stale(),
            Self::Intraday(f) => f.demote_to_stale(),
            Self::Swing(f) => f.demote_to_stale(),
            Self::LongTerm(f) => f.demote_to_stale(),
        }
        copy
    }

    pub fn as_primary(&self) -> Option<&PrimaryContext> {
        match self {
            Self::Primary(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_detailed(&self) -> Option<&DetailedContext> {
        match self {
            Self::Detailed(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_intraday(&self) -> Option<&IntradayContext> {
        match self {
            Self::Intraday(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_swing(&self) -> Option<&SwingContext> {
        match self {
            Self::Swing(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_long_term(&self) -> Option<&LongTermContext> {
        match self {
            Self::LongTerm(f) => Some(f),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_order() {
        let mut kinds = vec![
            FragmentKind::LongTerm,
            FragmentKind::Intraday,
            FragmentKind::Primary,
            FragmentKind::Swing,
            FragmentKind::Detailed,
        ];
        kinds.sort();
        assert_eq!(kinds, FragmentKind::ALL.to_vec());
    }

    #[test]
    fn test_scope_keys() {
        let scope = ContextScope::index("nifty").with_sectors(["it"]);
        assert_eq!(FragmentKind::Intraday.scope_key(&scope), "NIFTY");
        assert_eq!(FragmentKind::Swing.scope_key(&scope), "NIFTY[IT]");
    }

    #[test]
    fn test_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&FragmentKind::LongTerm).unwrap(),
            "\"longTerm\""
        );
        assert_eq!(FragmentKind::Detailed.required_dependencies(), &[FragmentKind::Primary]);
        assert!(FragmentKind::Swing.required_dependencies().is_empty());
    }
}
