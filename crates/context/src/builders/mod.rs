//! Fragment builders.
//!
//! One builder per fragment kind. A builder fetches raw datasets through
//! the [`BuildContext`], may copy fields from a sibling fragment resolved
//! earlier in the same pass, and degrades field by field when a dataset is
//! unavailable. It only fails when every dataset it tried fell back to a
//! neutral default.

mod detailed;
mod intraday;
mod long_term;
mod primary;
mod sources;
mod swing;

#[cfg(test)]
pub(crate) mod test_support;

pub use sources::{PickedQuote, Sourced};

use std::collections::BTreeMap;
use std::sync::Arc;

use marketpulse_sources::SourceGateway;

use crate::cache::{CacheStore, SlotKey};
use crate::clock::Clock;
use crate::config::ContextConfig;
use crate::coordinator::BuildCoordinator;
use crate::degradation::DegradationPolicy;
use crate::errors::{ContextError, Result};
use crate::fragments::{Fragment, FragmentKind};
use crate::scope::ContextScope;

/// Fragments resolved so far in one composition pass.
#[derive(Debug, Default)]
pub struct ResolvedFragments {
    fragments: BTreeMap<FragmentKind, Arc<Fragment>>,
}

impl ResolvedFragments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, fragment: Arc<Fragment>) {
        self.fragments.insert(fragment.kind(), fragment);
    }

    pub fn get(&self, kind: FragmentKind) -> Option<&Arc<Fragment>> {
        self.fragments.get(&kind)
    }

    pub fn contains(&self, kind: FragmentKind) -> bool {
        self.fragments.contains_key(&kind)
    }
}

/// Everything a builder may touch during one build.
pub struct BuildContext<'a> {
    pub scope: &'a ContextScope,
    pub gateway: &'a dyn SourceGateway,
    pub store: &'a dyn CacheStore,
    pub coordinator: &'a BuildCoordinator,
    pub policy: &'a DegradationPolicy,
    pub clock: &'a dyn Clock,
    pub config: &'a ContextConfig,
    pub resolved: &'a ResolvedFragments,
}

impl BuildContext<'_> {
    /// A sibling fragment for the same index, resolved in this pass or
    /// fresh in the store.
    pub fn sibling(&self, kind: FragmentKind) -> Option<Arc<Fragment>> {
        let index = self.scope.index_key();
        if let Some(fragment) = self.resolved.get(kind) {
            if fragment.scope_index() == index {
                return Some(Arc::clone(fragment));
            }
        }

        let now = self.clock.now();
        self.store
            .get(&SlotKey::fragment(kind, self.scope))
            .filter(|entry| self.store.is_fresh(entry, now))
            .and_then(|entry| entry.fragment())
            .filter(|fragment| fragment.kind() == kind && fragment.scope_index() == index)
    }
}

/// Build one fragment.
pub async fn build(kind: FragmentKind, ctx: &BuildContext<'_>) -> Result<Fragment> {
    match kind {
        FragmentKind::Primary => primary::build(ctx).await.map(Fragment::Primary),
        FragmentKind::Detailed => detailed::build(ctx).await.map(Fragment::Detailed),
        FragmentKind::Intraday => intraday::build(ctx).await.map(Fragment::Intraday),
        FragmentKind::Swing => swing::build(ctx).await.map(Fragment::Swing),
        FragmentKind::LongTerm => long_term::build(ctx).await.map(Fragment::LongTerm),
    }
}

/// A dataset a builder depended on.
pub(crate) trait Dependency {
    fn is_unavailable(&self) -> bool;

    fn failure_reason(&self) -> Option<String>;
}

impl<T> Dependency for Sourced<T> {
    fn is_unavailable(&self) -> bool {
        Sourced::is_unavailable(self)
    }

    fn failure_reason(&self) -> Option<String> {
        Sourced::failure_reason(self)
    }
}

/// Fail with `AllSourcesUnavailable` when every dependency fell back to a
/// neutral default.
pub(crate) fn require_any_source(kind: FragmentKind, dependencies: &[&dyn Dependency]) -> Result<()> {
    if dependencies.is_empty() || dependencies.iter().any(|d| !d.is_unavailable()) {
        return Ok(());
    }
    Err(ContextError::AllSourcesUnavailable {
        fragment: kind.to_string(),
        reasons: dependencies
            .iter()
            .filter_map(|d| d.failure_reason())
            .collect(),
    })
}
