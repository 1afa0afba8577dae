//! Circuit breaker for session provider protection.
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= max_failures
//! Open → Closed: success_count >= close_threshold
//! Open → Closed: reset_timeout elapsed since last failure (observed at query time)
//! ```
//!
//! # Design Decisions
//! - Failures and successes are separate, monotonically-reset counters, not a
//!   single score: one stray success cannot mask a true failure streak, and a
//!   stray failure after stabilization must rebuild the whole streak to reopen
//! - The open state is self-healing: `is_open()` applies the time-based reset
//!   itself, so no external caller is required to close the gate

use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::BreakerConfig;
use crate::observability::metrics;

#[derive(Debug, Default)]
struct BreakerState {
    is_open: bool,
    failure_count: u32,
    success_count: u32,
    last_failure: Option<Instant>,
}

/// Point-in-time view of the breaker, for the admin status surface.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub is_open: bool,
    pub failure_count: u32,
    pub success_count: u32,
    /// Milliseconds since the last recorded failure, if any.
    pub last_failure_age_ms: Option<u64>,
}

/// Consecutive-failure gate in front of the session provider.
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
    max_failures: u32,
    close_threshold: u32,
    reset_timeout: Duration,
}

impl CircuitBreaker {
    pub fn new(config: &BreakerConfig) -> Self {
        Self {
            state: Mutex::new(BreakerState::default()),
            max_failures: config.max_failures,
            close_threshold: config.close_threshold,
            reset_timeout: Duration::from_millis(config.reset_timeout_ms),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerState> {
        self.state.lock().expect("circuit breaker mutex poisoned")
    }

    /// Whether calls to the provider should currently be suppressed.
    ///
    /// Applies the time-based auto-close first: an open breaker whose last
    /// failure is older than the reset timeout resets fully and reads closed.
    pub fn is_open(&self) -> bool {
        let mut state = self.lock();

        if state.is_open {
            if let Some(last_failure) = state.last_failure {
                if last_failure.elapsed() > self.reset_timeout {
                    tracing::info!(
                        elapsed_ms = last_failure.elapsed().as_millis() as u64,
                        "Circuit breaker reset timeout elapsed, closing"
                    );
                    *state = BreakerState::default();
                    metrics::record_breaker_closed();
                    return false;
                }
            }
        }

        state.is_open
    }

    /// Record a provider failure, opening the gate at the threshold.
    pub fn record_failure(&self) {
        let mut state = self.lock();
        state.failure_count += 1;
        state.last_failure = Some(Instant::now());

        if state.failure_count >= self.max_failures && !state.is_open {
            state.is_open = true;
            // Success streak counts from the moment the breaker opened.
            state.success_count = 0;
            tracing::warn!(
                failures = state.failure_count,
                threshold = self.max_failures,
                "Circuit breaker opened"
            );
            metrics::record_breaker_opened();
        }
    }

    /// Record a provider success. Zeroes the failure streak; closes the gate
    /// once enough consecutive successes accumulate.
    pub fn record_success(&self) {
        let mut state = self.lock();
        state.success_count += 1;
        state.failure_count = 0;

        if state.is_open && state.success_count >= self.close_threshold {
            state.is_open = false;
            tracing::info!(
                successes = state.success_count,
                "Circuit breaker closed after recovery"
            );
            metrics::record_breaker_closed();
        }
    }

    /// Zero every field and close the gate unconditionally.
    pub fn reset(&self) {
        let mut state = self.lock();
        let was_open = state.is_open;
        *state = BreakerState::default();
        if was_open {
            metrics::record_breaker_closed();
        }
        tracing::info!("Circuit breaker reset");
    }

    /// Force the open state immediately. Operator tooling only.
    pub fn trip(&self) {
        let mut state = self.lock();
        state.is_open = true;
        state.failure_count = self.max_failures;
        state.success_count = 0;
        state.last_failure = Some(Instant::now());
        tracing::warn!("Circuit breaker tripped manually");
        metrics::record_breaker_opened();
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let state = self.lock();
        BreakerSnapshot {
            is_open: state.is_open,
            failure_count: state.failure_count,
            success_count: state.success_count,
            last_failure_age_ms: state
                .last_failure
                .map(|t| t.elapsed().as_millis() as u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(reset_timeout_ms: u64) -> CircuitBreaker {
        CircuitBreaker::new(&BreakerConfig {
            max_failures: 3,
            close_threshold: 2,
            reset_timeout_ms,
        })
    }

    #[test]
    fn test_opens_only_at_failure_threshold() {
        let cb = breaker(60_000);
        cb.record_failure();
        cb.record_failure();
        assert!(!cb.is_open());
        cb.record_failure();
        assert!(cb.is_open());
    }

    #[test]
    fn test_intervening_success_resets_failure_streak() {
        let cb = breaker(60_000);
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        cb.record_failure();
        assert!(!cb.is_open(), "streak must rebuild from zero after a success");
        cb.record_failure();
        assert!(cb.is_open());
    }

    #[test]
    fn test_closes_after_success_threshold() {
        let cb = breaker(60_000);
        for _ in 0..3 {
            cb.record_failure();
        }
        assert!(cb.is_open());

        cb.record_success();
        assert!(cb.is_open(), "one success is not enough to close");
        cb.record_success();
        assert!(!cb.is_open());
        assert_eq!(cb.snapshot().failure_count, 0);
    }

    #[test]
    fn test_auto_close_after_reset_timeout() {
        let cb = breaker(50);
        for _ in 0..3 {
            cb.record_failure();
        }
        assert!(cb.is_open());

        std::thread::sleep(Duration::from_millis(80));
        assert!(!cb.is_open());
        // Idempotent: a second immediate query also reads closed, on fully
        // reset state.
        assert!(!cb.is_open());
        let snap = cb.snapshot();
        assert_eq!(snap.failure_count, 0);
        assert!(snap.last_failure_age_ms.is_none());
    }

    #[test]
    fn test_reset_clears_everything() {
        let cb = breaker(60_000);
        for _ in 0..3 {
            cb.record_failure();
        }
        cb.reset();
        assert!(!cb.is_open());
        let snap = cb.snapshot();
        assert_eq!(snap.failure_count, 0);
        assert_eq!(snap.success_count, 0);
    }

    #[test]
    fn test_trip_forces_open() {
        let cb = breaker(60_000);
        assert!(!cb.is_open());
        cb.trip();
        assert!(cb.is_open());
        assert_eq!(cb.snapshot().failure_count, 3);
    }
}
