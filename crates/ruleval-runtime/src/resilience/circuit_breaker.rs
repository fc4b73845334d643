//! Circuit breaker to prevent cascade failures.
//!
//! When calls to an endpoint fail repeatedly, its circuit opens and
//! subsequent calls fail fast until the recovery timeout passes.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Circuit breaker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Failures before opening circuit
    pub failure_threshold: u32,

    /// Time before attempting recovery
    #[serde(with = "crate::config::human_duration")]
    pub recovery_timeout: Duration,

    /// Successes needed to close circuit
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

/// State of a circuit.
#[derive(Debug, Clone)]
pub enum CircuitState {
    /// Normal operation
    Closed { failures: u32 },

    /// Circuit is open, all calls fail fast
    Open { opened_at: Instant },

    /// Testing if circuit can close
    HalfOpen { successes: u32 },
}

/// Circuit breaker keyed by endpoint name.
///
/// Each endpoint has its own circuit so the target model and the
/// extraction models recover independently.
pub struct CircuitBreaker {
    states: RwLock<HashMap<String, CircuitState>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Returns true if calls to `endpoint` should fail fast.
    pub fn is_open(&self, endpoint: &str) -> bool {
        let states = self.states.read();
        match states.get(endpoint) {
            Some(CircuitState::Open { opened_at }) => {
                if opened_at.elapsed() >= self.config.recovery_timeout {
                    drop(states);
                    self.transition_to_half_open(endpoint);
                    false
                } else {
                    true
                }
            }
            _ => false,
        }
    }

    pub fn record_success(&self, endpoint: &str) {
        let mut states = self.states.write();
        match states.get(endpoint).cloned() {
            Some(CircuitState::HalfOpen { successes }) => {
                if successes + 1 >= self.config.success_threshold {
                    states.insert(endpoint.to_string(), CircuitState::Closed { failures: 0 });
                    tracing::info!(endpoint = %endpoint, "Circuit closed after successful recovery");
                } else {
                    states.insert(
                        endpoint.to_string(),
                        CircuitState::HalfOpen {
                            successes: successes + 1,
                        },
                    );
                }
            }
            Some(CircuitState::Closed { failures }) if failures > 0 => {
                states.insert(endpoint.to_string(), CircuitState::Closed { failures: 0 });
            }
            _ => {}
        }
    }

    pub fn record_failure(&self, endpoint: &str) {
        let mut states = self.states.write();
        let failures = match states.get(endpoint) {
            None => 0,
            Some(CircuitState::Closed { failures }) => *failures,
            Some(CircuitState::HalfOpen { .. }) => {
                states.insert(
                    endpoint.to_string(),
                    CircuitState::Open {
                        opened_at: Instant::now(),
                    },
                );
                tracing::warn!(endpoint = %endpoint, "Circuit reopened after failed recovery attempt");
                return;
            }
            Some(CircuitState::Open { .. }) => return,
        };

        if failures + 1 >= self.config.failure_threshold {
            states.insert(
                endpoint.to_string(),
                CircuitState::Open {
                    opened_at: Instant::now(),
                },
            );
            tracing::warn!(
                endpoint = %endpoint,
                failures = failures + 1,
                "Circuit opened after repeated failures"
            );
        } else {
            states.insert(
                endpoint.to_string(),
                CircuitState::Closed {
                    failures: failures + 1,
                },
            );
        }
    }

    fn transition_to_half_open(&self, endpoint: &str) {
        let mut states = self.states.write();
        if matches!(states.get(endpoint), Some(CircuitState::Open { .. })) {
            states.insert(endpoint.to_string(), CircuitState::HalfOpen { successes: 0 });
            tracing::info!(endpoint = %endpoint, "Circuit half-open, allowing a recovery call");
        }
    }

    pub fn state(&self, endpoint: &str) -> CircuitState {
        self.states
            .read()
            .get(endpoint)
            .cloned()
            .unwrap_or(CircuitState::Closed { failures: 0 })
    }

    /// Reset all circuits to closed.
    pub fn reset(&self) {
        self.states.write().clear();
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circuit_starts_closed() {
        let cb = CircuitBreaker::default();
        assert!(!cb.is_open("target"));
        assert!(matches!(cb.state("target"), CircuitState::Closed { failures: 0 }));
    }

    #[test]
    fn test_circuit_opens_after_failures() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 2,
            ..Default::default()
        });

        cb.record_failure("target");
        assert!(!cb.is_open("target"));

        cb.record_failure("target");
        assert!(cb.is_open("target"));
    }

    #[test]
    fn test_success_resets_failures() {
        let cb = CircuitBreaker::default();

        cb.record_failure("target");
        cb.record_failure("target");
        cb.record_success("target");

        cb.record_failure("target");
        cb.record_failure("target");
        assert!(!cb.is_open("target"));
    }

    #[test]
    fn test_endpoints_are_independent() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 2,
            ..Default::default()
        });

        cb.record_failure("extraction");
        cb.record_failure("extraction");

        assert!(cb.is_open("extraction"));
        assert!(!cb.is_open("target"));
    }

    #[test]
    fn test_recovery_through_half_open() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 1,
            recovery_timeout: Duration::ZERO,
            success_threshold: 2,
        });

        cb.record_failure("target");
        assert!(matches!(cb.state("target"), CircuitState::Open { .. }));

        // Zero timeout: the next check moves straight to half-open.
        assert!(!cb.is_open("target"));
        assert!(matches!(cb.state("target"), CircuitState::HalfOpen { successes: 0 }));

        cb.record_success("target");
        assert!(matches!(cb.state("target"), CircuitState::HalfOpen { successes: 1 }));
        cb.record_success("target");
        assert!(matches!(cb.state("target"), CircuitState::Closed { failures: 0 }));
    }

    #[test]
    fn test_failure_in_half_open_reopens() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 1,
            recovery_timeout: Duration::ZERO,
            success_threshold: 1,
        });

        cb.record_failure("target");
        assert!(!cb.is_open("target"));
        cb.record_failure("target");
        assert!(matches!(cb.state("target"), CircuitState::Open { .. }));
    }
}
