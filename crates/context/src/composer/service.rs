use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use marketpulse_sources::{GuardedGateway, SourceGateway};

use super::model::{ComposeRequest, CompositeResponse, FragmentSlot, ServedFrom};
use crate::builders::{self, BuildContext, ResolvedFragments};
use crate::cache::{CacheStore, CachedValue, EntryKind, InMemoryCacheStore, SlotKey};
use crate::clock::{Clock, SystemClock};
use crate::config::ContextConfig;
use crate::coordinator::{BuildCoordinator, CoordinatorStats, ResolutionSource};
use crate::degradation::DegradationPolicy;
use crate::errors::{ContextError, Result};
use crate::fragments::FragmentKind;
use crate::quality::QualityScorer;
use crate::scope::ContextScope;

/// Composition entry point.
#[async_trait]
pub trait ContextComposerTrait: Send + Sync {
    /// Resolve the requested fragments for a scope and assemble them.
    ///
    /// Fails only when no requested fragment could be produced, or when the
    /// request itself is invalid.
    async fn compose(&self, request: &ComposeRequest) -> Result<CompositeResponse>;

    fn stats(&self) -> CoordinatorStats;
}

/// Composes context fragments from cache, rebuilding only what expired.
///
/// Fragments resolve in a fixed order (primary, detailed, intraday, swing,
/// long-term), so a fragment that reuses a sibling always finds it already
/// resolved in the same pass.
pub struct ContextComposer {
    gateway: Arc<dyn SourceGateway>,
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    coordinator: BuildCoordinator,
    policy: DegradationPolicy,
    scorer: QualityScorer,
    config: ContextConfig,
}

impl ContextComposer {
    /// Create a composer over `gateway` with an in-memory store and the
    /// system clock. The gateway is wrapped with timeouts, throttling and
    /// circuit breaking from `config`.
    pub fn new(gateway: Arc<dyn SourceGateway>, config: ContextConfig) -> Result<Self> {
        config.validate()?;
        let gateway: Arc<dyn SourceGateway> =
            Arc::new(GuardedGateway::new(gateway, config.gateway_guard()));
        let store: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        Ok(Self {
            coordinator: BuildCoordinator::new(store.clone(), clock.clone()),
            policy: DegradationPolicy::new(config.rate_limit_backoff()),
            scorer: QualityScorer,
            gateway,
            store,
            clock,
            config,
        })
    }

    pub fn with_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = store;
        self.coordinator = BuildCoordinator::new(self.store.clone(), self.clock.clone());
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self.coordinator = BuildCoordinator::new(self.store.clone(), self.clock.clone());
        self
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    async fn resolve_fragment(
        &self,
        kind: FragmentKind,
        scope: &ContextScope,
        resolved: &ResolvedFragments,
    ) -> FragmentSlot {
        let slot = SlotKey::fragment(kind, scope);
        let entry_kind = EntryKind::Fragment(kind);
        let ctx = BuildContext {
            scope,
            gateway: self.gateway.as_ref(),
            store: self.store.as_ref(),
            coordinator: &self.coordinator,
            policy: &self.policy,
            clock: self.clock.as_ref(),
            config: &self.config,
            resolved,
        };
        let ctx = &ctx;

        let result = self
            .coordinator
            .resolve(
                slot.clone(),
                self.config.ttl(entry_kind),
                self.config.bucket_width(entry_kind),
                move || async move {
                    builders::build(kind, ctx)
                        .await
                        .map(|fragment| CachedValue::Fragment(Arc::new(fragment)))
                },
            )
            .await;

        let error = match result {
            Ok(resolution) => match resolution.entry.fragment() {
                Some(fragment) => {
                    let fragment = match resolution.source {
                        ResolutionSource::CacheHit => fragment
                            .reused_copy()
                            .map(Arc::new)
                            .unwrap_or(fragment),
                        _ => fragment,
                    };
                    return FragmentSlot::served(
                        fragment,
                        resolution.entry.built_at,
                        resolution.source.into(),
                    );
                }
                None => ContextError::UpstreamError {
                    endpoint: slot.to_string(),
                    message: "cache slot holds a non-fragment value".to_string(),
                },
            },
            Err(e) => e,
        };

        // The rebuild failed: an expired entry still beats no fragment.
        match self.store.get(&slot) {
            Some(entry) => match entry.fragment() {
                Some(fragment) => {
                    warn!("Serving expired '{}' after failed rebuild: {}", slot, error);
                    FragmentSlot {
                        fragment: Some(Arc::new(fragment.demoted_to_stale())),
                        built_at: Some(entry.built_at),
                        served_from: ServedFrom::StaleFallback,
                        warning: Some(format!(
                            "{}: {}; serving expired fragment built at {}",
                            kind, error, entry.built_at
                        )),
                    }
                }
                None => FragmentSlot::unavailable(format!("{}: {}", kind, error)),
            },
            None => {
                warn!("Fragment '{}' unavailable: {}", slot, error);
                FragmentSlot::unavailable(format!("{}: {}", kind, error))
            }
        }
    }
}

#[async_trait]
impl ContextComposerTrait for ContextComposer {
    async fn compose(&self, request: &ComposeRequest) -> Result<CompositeResponse> {
        request.validate()?;
        let plan = request.plan();
        debug!(
            "Composing {:?} for '{}' (plan {:?})",
            request.fragments,
            request.scope.full_key(),
            plan
        );

        let mut resolved = ResolvedFragments::new();
        let mut slots = BTreeMap::new();
        let mut warnings = Vec::new();

        for kind in plan {
            let slot = self.resolve_fragment(kind, &request.scope, &resolved).await;
            if let Some(warning) = &slot.warning {
                if request.fragments.contains(&kind) {
                    warnings.push(warning.clone());
                } else {
                    warnings.push(format!("dependency {}", warning));
                }
            }
            if let Some(fragment) = &slot.fragment {
                if slot.served_from != ServedFrom::StaleFallback {
                    resolved.insert(Arc::clone(fragment));
                }
            }
            if request.fragments.contains(&kind) {
                slots.insert(kind, slot);
            }
        }

        if slots.values().all(|slot| !slot.is_present()) {
            warn!(
                "No fragments produced for '{}': {}",
                request.scope.full_key(),
                warnings.join("; ")
            );
            return Err(ContextError::NoFragmentsProduced { warnings });
        }

        let quality_report = self
            .scorer
            .score(slots.values().filter_map(|slot| slot.fragment.as_deref()));

        info!(
            "Composed {} fragment(s) for '{}': quality {:.2}, {} warning(s)",
            slots.values().filter(|slot| slot.is_present()).count(),
            request.scope.full_key(),
            quality_report.overall_score,
            warnings.len()
        );

        Ok(CompositeResponse {
            fragments: slots,
            quality_report,
            generated_at: self.clock.now(),
            warnings,
        })
    }

    fn stats(&self) -> CoordinatorStats {
        self.coordinator.stats()
    }
}
