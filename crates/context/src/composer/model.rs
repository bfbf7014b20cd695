//! Request and response models for composition.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coordinator::ResolutionSource;
use crate::errors::{ContextError, Result};
use crate::fragments::{Fragment, FragmentKind};
use crate::quality::QualityReport;
use crate::scope::ContextScope;

/// Named fragment sets callers usually ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContextShape {
    Overview,
    Detailed,
    Intraday,
    Swing,
    LongTerm,
}

impl ContextShape {
    pub fn fragments(&self) -> &'static [FragmentKind] {
        match self {
            Self::Overview => &[FragmentKind::Primary],
            Self::Detailed => &[FragmentKind::Primary, FragmentKind::Detailed],
            Self::Intraday => &[FragmentKind::Primary, FragmentKind::Intraday],
            Self::Swing => &[FragmentKind::Primary, FragmentKind::Intraday, FragmentKind::Swing],
            Self::LongTerm => &[FragmentKind::Primary, FragmentKind::Swing, FragmentKind::LongTerm],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeRequest {
    pub fragments: BTreeSet<FragmentKind>,
    pub scope: ContextScope,
}

impl ComposeRequest {
    pub fn new<I>(fragments: I, scope: ContextScope) -> Self
    where
        I: IntoIterator<Item = FragmentKind>,
    {
        Self {
            fragments: fragments.into_iter().collect(),
            scope,
        }
    }

    pub fn for_shape(shape: ContextShape, scope: ContextScope) -> Self {
        Self::new(shape.fragments().iter().copied(), scope)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fragments.is_empty() {
            return Err(ContextError::InvalidRequest(
                "at least one fragment must be requested".to_string(),
            ));
        }
        if self.scope.index.trim().is_empty() {
            return Err(ContextError::InvalidRequest(
                "scope index must not be blank".to_string(),
            ));
        }
        Ok(())
    }

    /// Requested fragments plus their required dependencies, in resolution order.
    pub fn plan(&self) -> BTreeSet<FragmentKind> {
        let mut plan = self.fragments.clone();
        for kind in &self.fragments {
            plan.extend(kind.required_dependencies().iter().copied());
        }
        plan
    }
}

/// Where a fragment in a response came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServedFrom {
    Cache,
    Built,
    /// Built by a concurrent request this one waited on.
    Joined,
    /// Expired entry served because the rebuild failed.
    StaleFallback,
    Unavailable,
}

impl From<ResolutionSource> for ServedFrom {
    fn from(source: ResolutionSource) -> Self {
        match source {
            ResolutionSource::CacheHit => Self::Cache,
            ResolutionSource::Built => Self::Built,
            ResolutionSource::Joined => Self::Joined,
        }
    }
}

/// One requested fragment: present, or null with a warning.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentSlot {
    pub fragment: Option<Arc<Fragment>>,
    pub built_at: Option<DateTime<Utc>>,
    pub served_from: ServedFrom,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl FragmentSlot {
    pub fn served(fragment: Arc<Fragment>, built_at: DateTime<Utc>, served_from: ServedFrom) -> Self {
        Self {
            fragment: Some(fragment),
            built_at: Some(built_at),
            served_from,
            warning: None,
        }
    }

    pub fn unavailable(warning: String) -> Self {
        Self {
            fragment: None,
            built_at: None,
            served_from: ServedFrom::Unavailable,
            warning: Some(warning),
        }
    }

    pub fn is_present(&self) -> bool {
        self.fragment.is_some()
    }
}

/// Answer to a `compose` call.
///
/// Every requested fragment has a slot. Dependencies resolved only to serve
/// other fragments are not included.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeResponse {
    pub fragments: BTreeMap<FragmentKind, FragmentSlot>,
    pub quality_report: QualityReport,
    pub generated_at: DateTime<Utc>,
    pub warnings: Vec<String>,
}

impl CompositeResponse {
    pub fn slot(&self, kind: FragmentKind) -> Option<&FragmentSlot> {
        self.fragments.get(&kind)
    }

    pub fn fragment(&self, kind: FragmentKind) -> Option<&Fragment> {
        self.slot(kind).and_then(|slot| slot.fragment.as_deref())
    }
}
