//! Global kill-switch for auth activity.
//!
//! # Design Decisions
//! - No time-based recovery, unlike the circuit breaker. The triggering
//!   condition (refresh-token loops) indicates a corrupted persisted session
//!   that time alone will not fix; a human or an explicit `resume()` is
//!   required
//! - Independent of the breaker: either gate can deny on its own

use std::sync::Mutex;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::observability::metrics;

/// Reason recorded when the guard's classifier trips the switch.
pub const REFRESH_LOOP_REASON: &str = "refresh token error loop detected";

#[derive(Debug, Default)]
struct StopState {
    stopped: bool,
    reason: String,
    stop_time: Option<(Instant, DateTime<Utc>)>,
}

/// Point-in-time view of the kill-switch, for the admin status surface.
#[derive(Debug, Clone, Serialize)]
pub struct StopInfo {
    pub stopped: bool,
    pub reason: String,
    /// RFC 3339 timestamp of when the stop was engaged, if it is.
    pub stop_time: Option<String>,
    /// Milliseconds elapsed since the stop was engaged; 0 when not stopped.
    pub duration_ms: u64,
}

/// Manually or automatically engaged flag that halts auth activity until
/// explicitly resumed.
pub struct StopManager {
    state: Mutex<StopState>,
}

impl StopManager {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StopState::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StopState> {
        self.state.lock().expect("stop manager mutex poisoned")
    }

    /// Engage the kill-switch. Idempotent: calling again while stopped
    /// overwrites the reason and timestamp.
    pub fn stop(&self, reason: &str) {
        let mut state = self.lock();
        state.stopped = true;
        state.reason = reason.to_string();
        state.stop_time = Some((Instant::now(), Utc::now()));
        tracing::warn!(reason, "Auth stop engaged");
        metrics::record_stop_state(true);
    }

    /// Clear the stopped flag, reason, and timestamp atomically.
    pub fn resume(&self) {
        let mut state = self.lock();
        *state = StopState::default();
        tracing::info!("Auth stop cleared, operations resumed");
        metrics::record_stop_state(false);
    }

    /// Whether auth activity is currently halted.
    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    pub fn info(&self) -> StopInfo {
        let state = self.lock();
        StopInfo {
            stopped: state.stopped,
            reason: state.reason.clone(),
            stop_time: state.stop_time.map(|(_, ts)| ts.to_rfc3339()),
            duration_ms: state
                .stop_time
                .filter(|_| state.stopped)
                .map(|(at, _)| at.elapsed().as_millis() as u64)
                .unwrap_or(0),
        }
    }

    /// Automatic trigger for the refresh-token-invalid signature. Invoked
    /// only by the guard's error classifier, never by callers directly.
    pub fn auto_stop_on_refresh_error(&self) {
        self.stop(REFRESH_LOOP_REASON);
    }
}

impl Default for StopManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_and_resume() {
        let sm = StopManager::new();
        assert!(!sm.is_stopped());

        sm.stop("manual");
        assert!(sm.is_stopped());
        let info = sm.info();
        assert_eq!(info.reason, "manual");
        assert!(info.stop_time.is_some());

        sm.resume();
        assert!(!sm.is_stopped());
        let info = sm.info();
        assert_eq!(info.reason, "");
        assert!(info.stop_time.is_none());
        assert_eq!(info.duration_ms, 0);
    }

    #[test]
    fn test_stop_is_idempotent_overwrite() {
        let sm = StopManager::new();
        sm.stop("first");
        sm.stop("second");
        assert!(sm.is_stopped());
        assert_eq!(sm.info().reason, "second");
    }

    #[test]
    fn test_auto_stop_records_loop_reason() {
        let sm = StopManager::new();
        sm.auto_stop_on_refresh_error();
        assert!(sm.is_stopped());
        assert_eq!(sm.info().reason, REFRESH_LOOP_REASON);
    }

    #[test]
    fn test_duration_is_zero_when_not_stopped() {
        let sm = StopManager::new();
        assert_eq!(sm.info().duration_ms, 0);
    }
}
