//! Per-field provenance tags.
//!
//! Every derived field of a fragment records how its value was obtained.
//! Provenance is tracked per field, so one fragment can mix freshly fetched
//! values with approximations.

use serde::{Deserialize, Serialize};

/// How a field value was obtained.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Provenance {
    /// Freshly fetched from upstream.
    Real,
    /// Copied from a sibling fragment that was itself real or reused.
    Reused,
    /// Derived through a fallback calculation or a neutral default.
    Approximated,
    /// An expired cache value served because upstream was unavailable.
    StaleFallback,
}

impl Provenance {
    /// Weight used by the quality scorer.
    pub fn weight(self) -> f64 {
        match self {
            Self::Real => 1.0,
            Self::Reused => 0.9,
            Self::Approximated => 0.5,
            Self::StaleFallback => 0.2,
        }
    }

    /// Provenance of a value copied from a sibling fragment.
    ///
    /// Only real or reused values become `Reused`; copying an approximation
    /// or a stale value does not launder it.
    pub fn as_reused(self) -> Self {
        match self {
            Self::Real | Self::Reused => Self::Reused,
            other => other,
        }
    }

    /// The lower-quality of two provenances.
    pub fn weakest(self, other: Self) -> Self {
        if other.weight() < self.weight() {
            other
        } else {
            self
        }
    }

    /// Weakest provenance across inputs, `Real` for none.
    pub fn weakest_of<I: IntoIterator<Item = Provenance>>(inputs: I) -> Self {
        inputs.into_iter().fold(Self::Real, Self::weakest)
    }

    pub fn is_real_like(self) -> bool {
        matches!(self, Self::Real | Self::Reused)
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Real => write!(f, "REAL"),
            Self::Reused => write!(f, "REUSED"),
            Self::Approximated => write!(f, "APPROXIMATED"),
            Self::StaleFallback => write!(f, "STALE_FALLBACK"),
        }
    }
}

/// A field value with its provenance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tagged<T> {
    pub value: T,
    pub provenance: Provenance,
    /// Why the value is not `Real`, when it is not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl<T> Tagged<T> {
    pub fn new(value: T, provenance: Provenance) -> Self {
        Self {
            value,
            provenance,
            note: None,
        }
    }

    pub fn real(value: T) -> Self {
        Self::new(value, Provenance::Real)
    }

    pub fn approximated(value: T, note: impl Into<String>) -> Self {
        Self::new(value, Provenance::Approximated).with_note(note)
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Attach a note only when one is given.
    pub fn with_optional_note(mut self, note: Option<String>) -> Self {
        if note.is_some() {
            self.note = note;
        }
        self
    }

    /// Mark a value served from a fresh cached copy.
    pub fn promote_to_reused(&mut self) {
        self.provenance = self.provenance.as_reused();
    }

    /// Mark an expired value served as a fallback.
    pub fn demote_to_stale(&mut self) {
        if self.provenance != Provenance::StaleFallback {
            self.provenance = Provenance::StaleFallback;
            self.note = Some("served from expired cache entry".to_string());
        }
    }
}

impl<T: Clone> Tagged<T> {
    /// Copy a sibling fragment's field, keeping the value byte-for-byte.
    pub fn reused_from(source: &Tagged<T>) -> Self {
        Self {
            value: source.value.clone(),
            provenance: source.provenance.as_reused(),
            note: source.note.clone(),
        }
    }
}

/// One provenance observation produced when walking a fragment.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldProvenance {
    pub field: &'static str,
    pub provenance: Provenance,
}

impl FieldProvenance {
    pub fn new(field: &'static str, provenance: Provenance) -> Self {
        Self { field, provenance }
    }
}
