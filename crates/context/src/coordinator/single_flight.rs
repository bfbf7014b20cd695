use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, warn};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::cache::{CacheEntry, CacheKey, CacheStore, CachedValue, SlotKey};
use crate::clock::Clock;
use crate::errors::Result;

/// Value (or error) delivered to every caller of one build.
pub type BuildResult = Result<CacheEntry>;

/// How a resolved entry was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolutionSource {
    /// A fresh entry was already in the store.
    CacheHit,
    /// This caller ran the build.
    Built,
    /// This caller waited on a build started by another caller.
    Joined,
}

#[derive(Clone, Debug)]
pub struct Resolution {
    pub entry: CacheEntry,
    pub source: ResolutionSource,
}

/// Counters since the coordinator was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatorStats {
    pub cache_hits: u64,
    pub builds: u64,
    pub joins: u64,
    pub failures: u64,
}

#[derive(Default)]
struct Counters {
    cache_hits: AtomicU64,
    builds: AtomicU64,
    joins: AtomicU64,
    failures: AtomicU64,
}

/// An in-flight build: the broadcast point its waiters subscribe to.
struct BuildRequest {
    sender: broadcast::Sender<BuildResult>,
}

enum Role {
    Leader(broadcast::Sender<BuildResult>),
    Waiter(broadcast::Receiver<BuildResult>),
}

pub struct BuildCoordinator {
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    in_flight: Mutex<HashMap<CacheKey, BuildRequest>>,
    counters: Counters,
}

impl BuildCoordinator {
    pub fn new(store: Arc<dyn CacheStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            in_flight: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    /// Lock the in-flight map, recovering from poison if necessary.
    fn lock_in_flight(&self) -> MutexGuard<'_, HashMap<CacheKey, BuildRequest>> {
        self.in_flight.lock().unwrap_or_else(|poisoned| {
            warn!("Build coordinator mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn fresh_entry(&self, slot: &SlotKey) -> Option<CacheEntry> {
        let now = self.clock.now();
        self.store
            .get(slot)
            .filter(|entry| self.store.is_fresh(entry, now))
    }

    fn hit(&self, slot: &SlotKey, entry: CacheEntry) -> Resolution {
        debug!("Cache hit '{}' (built {})", slot, entry.built_at);
        self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
        Resolution {
            entry,
            source: ResolutionSource::CacheHit,
        }
    }

    /// Return the fresh entry for `slot`, or build it at most once per key.
    ///
    /// The key is `slot` within the time bucket of width `bucket_width`
    /// containing now. Only the caller that registers the build runs
    /// `build`; everyone else arriving while it is in flight receives the
    /// same result. A successful build is stored with `ttl` before the
    /// result is broadcast.
    ///
    /// If the building caller is dropped mid-build, its registration is
    /// removed and the waiters race to register a new build.
    pub async fn resolve<F, Fut>(
        &self,
        slot: SlotKey,
        ttl: Duration,
        bucket_width: Duration,
        build: F,
    ) -> Result<Resolution>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CachedValue>>,
    {
        let mut build = Some(build);

        loop {
            if let Some(entry) = self.fresh_entry(&slot) {
                return Ok(self.hit(&slot, entry));
            }

            let key = CacheKey::new(slot.clone(), self.clock.now(), bucket_width);
            let role = {
                let mut in_flight = self.lock_in_flight();
                // A build may have completed between the first check and the lock.
                if let Some(entry) = self.fresh_entry(&slot) {
                    return Ok(self.hit(&slot, entry));
                }
                match in_flight.get(&key) {
                    Some(request) => Role::Waiter(request.sender.subscribe()),
                    None => {
                        let (sender, _) = broadcast::channel(1);
                        in_flight.insert(
                            key.clone(),
                            BuildRequest {
                                sender: sender.clone(),
                            },
                        );
                        Role::Leader(sender)
                    }
                }
            };

            match role {
                Role::Waiter(mut receiver) => {
                    debug!("Joining in-flight build '{}'", key);
                    match receiver.recv().await {
                        Ok(result) => {
                            self.counters.joins.fetch_add(1, Ordering::Relaxed);
                            return result.map(|entry| Resolution {
                                entry,
                                source: ResolutionSource::Joined,
                            });
                        }
                        Err(RecvError::Closed) | Err(RecvError::Lagged(_)) => {
                            debug!("Build '{}' was abandoned, retrying", key);
                            continue;
                        }
                    }
                }
                Role::Leader(sender) => {
                    let Some(build) = build.take() else {
                        // Unreachable: a caller leads at most once.
                        continue;
                    };
                    let registration = Registration {
                        coordinator: self,
                        key: &key,
                    };

                    debug!("Building '{}'", key);
                    self.counters.builds.fetch_add(1, Ordering::Relaxed);
                    let result = match build().await {
                        Ok(value) => {
                            let entry = CacheEntry::new(value, self.clock.now(), ttl, key.bucket);
                            self.store.put(slot.clone(), entry.clone());
                            Ok(entry)
                        }
                        Err(e) => {
                            warn!("Build '{}' failed: {}", key, e);
                            self.counters.failures.fetch_add(1, Ordering::Relaxed);
                            Err(e)
                        }
                    };

                    drop(registration);
                    // No receivers is fine: nobody joined.
                    let _ = sender.send(result.clone());

                    return result.map(|entry| Resolution {
                        entry,
                        source: ResolutionSource::Built,
                    });
                }
            }
        }
    }

    /// Number of builds currently in flight.
    pub fn in_flight(&self) -> usize {
        self.lock_in_flight().len()
    }

    pub fn stats(&self) -> CoordinatorStats {
        CoordinatorStats {
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            builds: self.counters.builds.load(Ordering::Relaxed),
            joins: self.counters.joins.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }
}

/// Removes a build's registration when the build finishes or is dropped.
struct Registration<'a> {
    coordinator: &'a BuildCoordinator,
    key: &'a CacheKey,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.coordinator.lock_in_flight().remove(self.key);
    }
}
