//! Session guard orchestration layer.
//!
//! # Data Flow
//! ```text
//! Caller (route guard, monitor, admin)
//!     → check_auth_status / safe_auth_check
//!     → stop_manager check (first short-circuit)
//!     → circuit_breaker check (second short-circuit)
//!     → session provider
//!     → classifier.rs on error
//!     → outcome recorded back into breaker (and stop manager on escalation)
//! ```
//!
//! # Design Decisions
//! - Stop-flag and open-breaker denials are reported, never retried here;
//!   retry is the caller's or the monitor's next-tick responsibility
//! - Benign absence of a session and rate-limit responses are never recorded
//!   as breaker failures
//! - Opportunistic refresh never downgrades an authenticated status: the
//!   current token is still valid even when the refresh fails
//! - `detect_and_clear_corrupted_session` is the one operation allowed to
//!   reach through both gates, because it repairs the condition that trips
//!   them

pub mod classifier;

use std::sync::Arc;

use serde::Serialize;

use crate::config::GuardConfig;
use crate::guard::classifier::{classify, ProviderErrorKind};
use crate::observability::metrics;
use crate::provider::SessionProvider;
use crate::resilience::{BreakerSnapshot, CircuitBreaker, StopInfo, StopManager};
use crate::storage::SessionStore;

/// Error string reported when the kill-switch denies a check.
pub const STOPPED_ERROR: &str = "stopped";

/// Error string reported when the open breaker denies a check.
pub const CIRCUIT_OPEN_ERROR: &str = "circuit-open";

/// Outcome of an auth status check. Produced fresh on every call, never
/// persisted.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AuthStatus {
    pub is_authenticated: bool,
    pub needs_refresh: bool,
    pub error: Option<String>,
}

impl AuthStatus {
    fn authenticated(needs_refresh: bool) -> Self {
        Self {
            is_authenticated: true,
            needs_refresh,
            error: None,
        }
    }

    /// No session present. A negative result, not an error.
    fn absent() -> Self {
        Self {
            is_authenticated: false,
            needs_refresh: false,
            error: None,
        }
    }

    fn denied(error: impl Into<String>) -> Self {
        Self {
            is_authenticated: false,
            needs_refresh: false,
            error: Some(error.into()),
        }
    }
}

/// Combined view of both protection gates, for the operator surface.
#[derive(Debug, Clone, Serialize)]
pub struct ProtectionStatus {
    pub breaker: BreakerSnapshot,
    pub stop: StopInfo,
}

/// Orchestration layer wrapping every provider interaction with the stop and
/// breaker gates.
///
/// Owns neither gate: both are process-wide shared state, injected at
/// construction so tests can build isolated instances.
pub struct SessionGuard {
    provider: Arc<dyn SessionProvider>,
    store: Arc<SessionStore>,
    breaker: Arc<CircuitBreaker>,
    stop: Arc<StopManager>,
    refresh_margin_secs: i64,
}

impl SessionGuard {
    pub fn new(
        provider: Arc<dyn SessionProvider>,
        store: Arc<SessionStore>,
        breaker: Arc<CircuitBreaker>,
        stop: Arc<StopManager>,
        config: &GuardConfig,
    ) -> Self {
        Self {
            provider,
            store,
            breaker,
            stop,
            refresh_margin_secs: config.refresh_margin_secs,
        }
    }

    /// Read-only auth status check. Gate order is fixed: kill-switch first,
    /// breaker second, provider last.
    pub async fn check_auth_status(&self) -> AuthStatus {
        if self.stop.is_stopped() {
            tracing::debug!("Auth check denied: stop engaged");
            metrics::record_auth_check("stopped");
            return AuthStatus::denied(STOPPED_ERROR);
        }

        if self.breaker.is_open() {
            tracing::debug!("Auth check denied: circuit open");
            metrics::record_auth_check("circuit_open");
            return AuthStatus::denied(CIRCUIT_OPEN_ERROR);
        }

        match self.provider.get_session().await {
            Ok(Some(session)) => {
                let remaining = session.seconds_until_expiry(chrono::Utc::now().timestamp());
                let needs_refresh = remaining < self.refresh_margin_secs;
                self.breaker.record_success();
                metrics::record_auth_check("authenticated");
                tracing::debug!(
                    expires_in_secs = remaining,
                    needs_refresh,
                    "Session active"
                );
                AuthStatus::authenticated(needs_refresh)
            }
            Ok(None) => {
                // Absence of a session is not a provider malfunction; the
                // breaker stays untouched.
                metrics::record_auth_check("no_session");
                AuthStatus::absent()
            }
            Err(e) => {
                match classify(&e) {
                    ProviderErrorKind::RefreshTokenInvalid => {
                        tracing::error!(
                            error = %e,
                            "Refresh-token-invalid signature on status read, engaging stop"
                        );
                        self.stop.auto_stop_on_refresh_error();
                        self.breaker.record_failure();
                    }
                    ProviderErrorKind::RateLimited => {
                        // Provider-imposed backoff, not malfunction.
                        tracing::warn!(error = %e, "Status read rate limited by provider");
                    }
                    ProviderErrorKind::Other => {
                        tracing::warn!(error = %e, "Status read failed");
                        self.breaker.record_failure();
                    }
                }
                metrics::record_auth_check("provider_error");
                AuthStatus::denied(e.message().to_string())
            }
        }
    }

    /// Attempt a token refresh. Returns whether it succeeded.
    ///
    /// Refresh outcomes never touch the breaker: a rate limit is a backoff
    /// signal, and other failures are already surfaced by the status path.
    pub async fn refresh_token(&self) -> bool {
        match self.provider.refresh().await {
            Ok(session) => {
                tracing::debug!(
                    expires_at = session.expires_at,
                    "Token refresh succeeded"
                );
                metrics::record_refresh("success");
                true
            }
            Err(e) => {
                match classify(&e) {
                    ProviderErrorKind::RateLimited => {
                        tracing::warn!(error = %e, "Token refresh rate limited, backing off");
                        metrics::record_refresh("rate_limited");
                    }
                    _ => {
                        tracing::warn!(error = %e, "Token refresh failed");
                        metrics::record_refresh("error");
                    }
                }
                false
            }
        }
    }

    /// Status check with opportunistic refresh.
    ///
    /// A failed refresh does not downgrade the returned status: the current
    /// token has not expired yet, so the caller's request is still good.
    pub async fn safe_auth_check(&self) -> AuthStatus {
        let status = self.check_auth_status().await;

        if status.is_authenticated && status.needs_refresh {
            if !self.refresh_token().await {
                tracing::warn!("Opportunistic refresh failed; current token remains valid");
            }
        }

        status
    }

    /// Sign out and wipe local session artifacts.
    ///
    /// Local cleanup runs on every exit path, whether or not the provider
    /// sign-out succeeded.
    pub async fn clear_session(&self) {
        if let Err(e) = self.provider.sign_out().await {
            tracing::warn!(error = %e, "Provider sign-out failed, continuing with local cleanup");
        }

        let removed = self.store.clear_all();
        metrics::record_session_cleared();
        tracing::info!(artifacts_removed = removed, "Local session artifacts cleared");
    }

    /// Check for the refresh-token-invalid signature and wipe the session
    /// when found. Returns whether a corrupted session was cleared.
    ///
    /// Bypasses the stop and breaker gates on purpose: this is the recovery
    /// path for the condition that trips them.
    pub async fn detect_and_clear_corrupted_session(&self) -> bool {
        match self.provider.get_session().await {
            Err(e) if classify(&e) == ProviderErrorKind::RefreshTokenInvalid => {
                tracing::warn!(error = %e, "Corrupted session detected, clearing");
                self.clear_session().await;
                true
            }
            _ => false,
        }
    }

    // --- Operator surface: thin compositions of the operations above. ---

    /// Trip the breaker, wipe the session, and engage the kill-switch in one
    /// call.
    pub async fn emergency_stop(&self, reason: &str) {
        tracing::warn!(reason, "Emergency stop requested");
        self.breaker.trip();
        self.clear_session().await;
        self.stop.stop(reason);
    }

    /// Clear both gates back to their initial state.
    pub fn reset_protection(&self) {
        self.breaker.reset();
        self.stop.resume();
    }

    /// Combined state of both gates.
    pub fn protection_status(&self) -> ProtectionStatus {
        ProtectionStatus {
            breaker: self.breaker.snapshot(),
            stop: self.stop.info(),
        }
    }
}
