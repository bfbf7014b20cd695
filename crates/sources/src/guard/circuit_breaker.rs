//! Per-endpoint circuit breaker.
//!
//! The circuit has three states:
//!
//! - **Closed**: Normal operation, calls go through.
//! - **Open**: The endpoint is failing, calls fail fast.
//! - **HalfOpen**: Probing whether the endpoint has recovered.
//!
//! Failing fast matters here because every waiter on a cache slot is blocked
//! until the build that owns the slot returns.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::gateway::Endpoint;

/// Default number of failures before opening the circuit.
const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Default time to wait before transitioning from Open to HalfOpen.
const DEFAULT_RECOVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Number of successful calls needed to close the circuit from HalfOpen.
const HALF_OPEN_SUCCESS_THRESHOLD: u32 = 2;

/// Circuit breaker state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Open => write!(f, "Open"),
            Self::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}

#[derive(Debug)]
struct Circuit {
    state: CircuitState,
    /// Consecutive failures.
    failure_count: u32,
    /// Consecutive successes while HalfOpen.
    half_open_successes: u32,
    last_failure: Option<Instant>,
}

impl Circuit {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            half_open_successes: 0,
            last_failure: None,
        }
    }

    fn close(&mut self) {
        self.state = CircuitState::Closed;
        self.failure_count = 0;
        self.half_open_successes = 0;
        self.last_failure = None;
    }
}

/// Circuit breaker configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct CircuitBreakerConfig {
    /// Number of failures before opening the circuit.
    pub failure_threshold: u32,
    /// Time to wait before probing recovery.
    pub recovery_timeout: Duration,
    /// Number of successes needed to close from HalfOpen.
    pub half_open_success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            recovery_timeout: DEFAULT_RECOVERY_TIMEOUT,
            half_open_success_threshold: HALF_OPEN_SUCCESS_THRESHOLD,
        }
    }
}

/// In-memory circuit breaker tracking each endpoint independently.
pub struct CircuitBreaker {
    circuits: Mutex<HashMap<Endpoint, Circuit>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            circuits: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Lock the circuits mutex, recovering from poison if necessary.
    fn lock_circuits(&self) -> MutexGuard<'_, HashMap<Endpoint, Circuit>> {
        self.circuits.lock().unwrap_or_else(|poisoned| {
            warn!("Circuit breaker mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Check if calls are allowed for an endpoint.
    ///
    /// Moves an Open circuit to HalfOpen once the recovery timeout elapsed.
    pub fn is_allowed(&self, endpoint: Endpoint) -> bool {
        let mut circuits = self.lock_circuits();
        let circuit = circuits.entry(endpoint).or_insert_with(Circuit::new);

        match circuit.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let recovered = circuit
                    .last_failure
                    .map(|at| at.elapsed() >= self.config.recovery_timeout)
                    .unwrap_or(true);
                if recovered {
                    info!(
                        "Circuit breaker: transitioning '{}' from Open to HalfOpen",
                        endpoint
                    );
                    circuit.state = CircuitState::HalfOpen;
                    circuit.half_open_successes = 0;
                }
                recovered
            }
        }
    }

    /// Record a successful call.
    pub fn record_success(&self, endpoint: Endpoint) {
        let mut circuits = self.lock_circuits();
        let circuit = circuits.entry(endpoint).or_insert_with(Circuit::new);

        match circuit.state {
            CircuitState::Closed => {
                circuit.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                circuit.half_open_successes += 1;
                debug!(
                    "Circuit breaker: success for '{}' in HalfOpen ({}/{})",
                    endpoint, circuit.half_open_successes, self.config.half_open_success_threshold
                );
                if circuit.half_open_successes >= self.config.half_open_success_threshold {
                    info!("Circuit breaker: closing circuit for '{}'", endpoint);
                    circuit.close();
                }
            }
            CircuitState::Open => {
                debug!(
                    "Circuit breaker: unexpected success for '{}' in Open state",
                    endpoint
                );
            }
        }
    }

    /// Record a failed call. Any failure while HalfOpen reopens the circuit.
    pub fn record_failure(&self, endpoint: Endpoint) {
        let mut circuits = self.lock_circuits();
        let circuit = circuits.entry(endpoint).or_insert_with(Circuit::new);

        circuit.failure_count += 1;
        circuit.last_failure = Some(Instant::now());

        match circuit.state {
            CircuitState::Closed => {
                if circuit.failure_count >= self.config.failure_threshold {
                    info!(
                        "Circuit breaker: opening circuit for '{}' after {} failures",
                        endpoint, circuit.failure_count
                    );
                    circuit.state = CircuitState::Open;
                }
            }
            CircuitState::HalfOpen => {
                info!(
                    "Circuit breaker: reopening circuit for '{}' after failure in HalfOpen",
                    endpoint
                );
                circuit.state = CircuitState::Open;
                circuit.half_open_successes = 0;
            }
            CircuitState::Open => {}
        }
    }

    /// Current state for an endpoint.
    pub fn state(&self, endpoint: Endpoint) -> CircuitState {
        self.lock_circuits()
            .get(&endpoint)
            .map(|c| c.state)
            .unwrap_or(CircuitState::Closed)
    }

    pub fn failure_count(&self, endpoint: Endpoint) -> u32 {
        self.lock_circuits()
            .get(&endpoint)
            .map(|c| c.failure_count)
            .unwrap_or(0)
    }

    /// Reset the circuit for an endpoint to Closed.
    pub fn reset(&self, endpoint: Endpoint) {
        if let Some(circuit) = self.lock_circuits().get_mut(&endpoint) {
            info!("Circuit breaker: manually resetting circuit for '{}'", endpoint);
            circuit.close();
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config(failure_threshold: u32, half_open_success_threshold: u32) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold,
            recovery_timeout: Duration::from_millis(10),
            half_open_success_threshold,
        }
    }

    #[test]
    fn test_circuit_starts_closed() {
        let cb = CircuitBreaker::new();
        assert!(cb.is_allowed(Endpoint::GlobalIndices));
        assert_eq!(cb.state(Endpoint::GlobalIndices), CircuitState::Closed);
    }

    #[test]
    fn test_circuit_opens_after_threshold() {
        let cb = CircuitBreaker::with_config(CircuitBreakerConfig {
            failure_threshold: 3,
            ..Default::default()
        });

        cb.record_failure(Endpoint::Fundamentals);
        cb.record_failure(Endpoint::Fundamentals);
        assert!(cb.is_allowed(Endpoint::Fundamentals));

        cb.record_failure(Endpoint::Fundamentals);
        assert!(!cb.is_allowed(Endpoint::Fundamentals));
        assert_eq!(cb.state(Endpoint::Fundamentals), CircuitState::Open);
    }

    #[test]
    fn test_success_resets_failure_count() {
        let cb = CircuitBreaker::with_config(CircuitBreakerConfig {
            failure_threshold: 3,
            ..Default::default()
        });

        cb.record_failure(Endpoint::DomesticQuotes);
        cb.record_failure(Endpoint::DomesticQuotes);
        assert_eq!(cb.failure_count(Endpoint::DomesticQuotes), 2);

        cb.record_success(Endpoint::DomesticQuotes);
        assert_eq!(cb.failure_count(Endpoint::DomesticQuotes), 0);
    }

    #[test]
    fn test_half_open_closes_on_success() {
        let cb = CircuitBreaker::with_config(fast_config(1, 2));

        cb.record_failure(Endpoint::SectorPerformance);
        std::thread::sleep(Duration::from_millis(20));
        assert!(cb.is_allowed(Endpoint::SectorPerformance));
        assert_eq!(cb.state(Endpoint::SectorPerformance), CircuitState::HalfOpen);

        cb.record_success(Endpoint::SectorPerformance);
        assert_eq!(cb.state(Endpoint::SectorPerformance), CircuitState::HalfOpen);

        cb.record_success(Endpoint::SectorPerformance);
        assert_eq!(cb.state(Endpoint::SectorPerformance), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_reopens_on_failure() {
        let cb = CircuitBreaker::with_config(fast_config(1, 2));

        cb.record_failure(Endpoint::HistoricalCandles);
        std::thread::sleep(Duration::from_millis(20));
        cb.is_allowed(Endpoint::HistoricalCandles);

        cb.record_failure(Endpoint::HistoricalCandles);
        assert_eq!(cb.state(Endpoint::HistoricalCandles), CircuitState::Open);
    }

    #[test]
    fn test_endpoint_isolation_and_reset() {
        let cb = CircuitBreaker::with_config(CircuitBreakerConfig {
            failure_threshold: 1,
            ..Default::default()
        });

        cb.record_failure(Endpoint::Fundamentals);
        assert!(!cb.is_allowed(Endpoint::Fundamentals));
        assert!(cb.is_allowed(Endpoint::GlobalIndices));

        cb.reset(Endpoint::Fundamentals);
        assert_eq!(cb.state(Endpoint::Fundamentals), CircuitState::Closed);
        assert_eq!(cb.failure_count(Endpoint::Fundamentals), 0);
    }
}
