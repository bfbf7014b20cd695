//! Token bucket throttle for upstream endpoints.
//!
//! Each endpoint gets its own bucket. A call that finds its bucket empty is
//! refused immediately with the time until the next token, instead of
//! queueing: a queued call would hold every single-flight waiter hostage.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::gateway::Endpoint;

/// Default rate limit: 60 requests per minute.
const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

/// Default bucket capacity (allows bursting).
const DEFAULT_BUCKET_CAPACITY: f64 = 10.0;

/// Token bucket for a single endpoint.
#[derive(Debug)]
struct TokenBucket {
    /// Current number of available tokens.
    tokens: f64,
    /// Last time the bucket was updated.
    last_update: Instant,
    /// Token refill rate (tokens per second).
    rate: f64,
    /// Maximum bucket capacity.
    capacity: f64,
}

impl TokenBucket {
    fn with_config(config: &RateLimitConfig) -> Self {
        Self {
            tokens: config.burst_capacity,
            last_update: Instant::now(),
            rate: config.requests_per_minute as f64 / 60.0,
            capacity: config.burst_capacity,
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_update = now;
    }

    fn try_acquire(&mut self) -> bool {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn time_until_available(&mut self) -> Duration {
        self.refill();

        if self.tokens >= 1.0 || self.rate <= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.rate)
        }
    }
}

/// Throttle configuration for one endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitConfig {
    /// Maximum requests per minute.
    pub requests_per_minute: u32,
    /// Maximum burst capacity.
    pub burst_capacity: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            burst_capacity: DEFAULT_BUCKET_CAPACITY,
        }
    }
}

/// Per-endpoint token bucket throttle.
pub struct RateLimiter {
    buckets: Mutex<HashMap<Endpoint, TokenBucket>>,
    configs: HashMap<Endpoint, RateLimitConfig>,
    default_config: RateLimitConfig,
}

impl RateLimiter {
    /// Create a throttle applying `default_config` to every endpoint.
    pub fn new(default_config: RateLimitConfig) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            configs: HashMap::new(),
            default_config,
        }
    }

    /// Override the limits for one endpoint.
    pub fn with_endpoint(mut self, endpoint: Endpoint, config: RateLimitConfig) -> Self {
        self.configs.insert(endpoint, config);
        self
    }

    /// Lock the buckets mutex, recovering from poison if necessary.
    ///
    /// The worst case after a poisoned lock is slightly inaccurate
    /// throttling, which is preferable to panicking inside a build.
    fn lock_buckets(&self) -> MutexGuard<'_, HashMap<Endpoint, TokenBucket>> {
        self.buckets.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter buckets mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn config_for(&self, endpoint: Endpoint) -> &RateLimitConfig {
        self.configs.get(&endpoint).unwrap_or(&self.default_config)
    }

    /// Take a token for `endpoint`.
    ///
    /// Returns `Err(wait)` with the time until a token frees up when the
    /// bucket is empty.
    pub fn try_acquire(&self, endpoint: Endpoint) -> Result<(), Duration> {
        let mut buckets = self.lock_buckets();
        let bucket = buckets
            .entry(endpoint)
            .or_insert_with(|| TokenBucket::with_config(self.config_for(endpoint)));

        if bucket.try_acquire() {
            return Ok(());
        }

        let wait = bucket.time_until_available();
        debug!("Rate limiter: '{}' exhausted, next token in {:?}", endpoint, wait);
        Err(wait)
    }

    /// Get the remaining tokens for an endpoint.
    pub fn remaining_tokens(&self, endpoint: Endpoint) -> f64 {
        let mut buckets = self.lock_buckets();

        match buckets.get_mut(&endpoint) {
            Some(bucket) => {
                bucket.refill();
                bucket.tokens
            }
            None => self.config_for(endpoint).burst_capacity,
        }
    }

    /// Reset the bucket for an endpoint.
    pub fn reset(&self, endpoint: Endpoint) {
        self.lock_buckets().remove(&endpoint);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
