//! Resilience patterns for ruleval-runtime.
//!
//! This module provides:
//! - Circuit breaker per endpoint to stop hammering a dead model
//! - Retry with exponential backoff for transient errors
//! - Guarded and fallback provider wrappers built from the two

mod circuit_breaker;
mod guarded;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use guarded::{FallbackProvider, GuardedProvider};
pub use retry::{with_retry, RetryPolicy};
