//! Background auth monitor.
//!
//! # Data Flow
//! ```text
//! Periodic timer (tokio interval)
//!     → detect_and_clear_corrupted_session (first, every tick)
//!     → when nothing was cleared: safe_auth_check
//!     → result logged + recorded as metrics
//! ```
//!
//! # Design Decisions
//! - Corruption detection runs before the safe check so a session already
//!   known to be bad is purged before any refresh is attempted against it
//! - Idempotent start and stop, guarded by the handle slot: a second `start`
//!   never leaks a duplicate timer
//! - Shutdown via a broadcast channel, same pattern as process lifecycle
//! - Only the timer is cancellable: `stop` signals the loop and lets an
//!   in-flight tick drain, so guard cleanup never stops mid-flight

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time;

use crate::config::MonitorConfig;
use crate::guard::SessionGuard;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

struct MonitorTask {
    shutdown: Shutdown,
    join: JoinHandle<()>,
}

/// Restartable, non-overlapping periodic loop driving the guard's
/// corruption-detection and safe-check routines.
///
/// Owns its timer handle and a reference to the guard; owns no auth state
/// itself.
pub struct AuthMonitor {
    guard: Arc<SessionGuard>,
    interval: Duration,
    task: Mutex<Option<MonitorTask>>,
}

impl AuthMonitor {
    pub fn new(guard: Arc<SessionGuard>, config: &MonitorConfig) -> Self {
        Self {
            guard,
            interval: Duration::from_millis(config.interval_ms),
            task: Mutex::new(None),
        }
    }

    /// Start the periodic loop. No-op when already running.
    pub fn start(&self) {
        let mut slot = self.task.lock().expect("monitor mutex poisoned");
        if slot.is_some() {
            tracing::debug!("Auth monitor already running, start ignored");
            return;
        }

        let guard = self.guard.clone();
        let interval = self.interval;
        let shutdown = Shutdown::new();
        let mut shutdown_rx = shutdown.subscribe();

        tracing::info!(interval_ms = interval.as_millis() as u64, "Auth monitor starting");
        metrics::record_monitor_running(true);

        let join = tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            // The immediate first tick would race startup; skip it.
            ticker.tick().await;

            loop {
                // Biased: when a shutdown raced with a pending tick, honor
                // the shutdown so no new tick starts after stop().
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => {
                        tracing::info!("Auth monitor received shutdown signal, exiting loop");
                        break;
                    }
                    _ = ticker.tick() => {
                        Self::run_tick(&guard).await;
                    }
                }
            }
        });

        *slot = Some(MonitorTask { shutdown, join });
    }

    async fn run_tick(guard: &SessionGuard) {
        metrics::record_monitor_tick();

        if guard.detect_and_clear_corrupted_session().await {
            // The session was just wiped; nothing left worth checking until
            // the next tick.
            tracing::warn!("Monitor cleared a corrupted session, skipping check this tick");
            return;
        }

        let status = guard.safe_auth_check().await;
        tracing::debug!(
            authenticated = status.is_authenticated,
            needs_refresh = status.needs_refresh,
            error = status.error.as_deref(),
            "Monitor tick complete"
        );
    }

    /// Cancel the timer and clear the handle. Idempotent.
    ///
    /// Only the timer is cancellable: the loop observes shutdown between
    /// ticks, so a tick already in flight runs to completion and its cleanup
    /// is never interrupted.
    pub fn stop(&self) {
        let task = self.task.lock().expect("monitor mutex poisoned").take();
        match task {
            Some(task) => {
                task.shutdown.trigger();
                metrics::record_monitor_running(false);
                tracing::info!("Auth monitor stopped");
            }
            None => {
                tracing::debug!("Auth monitor not running, stop ignored");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.lock().expect("monitor mutex poisoned").is_some()
    }
}

impl Drop for AuthMonitor {
    fn drop(&mut self) {
        // Teardown path: nothing will poll the task again, so a hard abort
        // is acceptable here.
        if let Some(task) = self.task.lock().expect("monitor mutex poisoned").take() {
            task.shutdown.trigger();
            task.join.abort();
            metrics::record_monitor_running(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BreakerConfig, GuardConfig, StorageConfig};
    use crate::provider::{ProviderError, Session, SessionProvider};
    use crate::resilience::{CircuitBreaker, StopManager};
    use crate::storage::SessionStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    /// Provider that always reports the same outcome and counts calls.
    struct StaticProvider {
        corrupted: AtomicBool,
        get_calls: AtomicU32,
        sign_out_calls: AtomicU32,
        sign_out_delay: Duration,
    }

    impl StaticProvider {
        fn healthy() -> Self {
            Self {
                corrupted: AtomicBool::new(false),
                get_calls: AtomicU32::new(0),
                sign_out_calls: AtomicU32::new(0),
                sign_out_delay: Duration::ZERO,
            }
        }

        fn corrupted() -> Self {
            Self {
                corrupted: AtomicBool::new(true),
                ..Self::healthy()
            }
        }

        fn corrupted_with_slow_sign_out(delay: Duration) -> Self {
            Self {
                sign_out_delay: delay,
                ..Self::corrupted()
            }
        }
    }

    #[async_trait]
    impl SessionProvider for StaticProvider {
        async fn get_session(&self) -> Result<Option<Session>, ProviderError> {
            self.get_calls.fetch_add(1, Ordering::SeqCst);
            if self.corrupted.load(Ordering::SeqCst) {
                Err(ProviderError::Api("invalid refresh token".to_string()))
            } else {
                Ok(Some(Session {
                    access_token: "at".to_string(),
                    refresh_token: "rt".to_string(),
                    expires_at: chrono::Utc::now().timestamp() + 3_600,
                    user_id: None,
                }))
            }
        }

        async fn refresh(&self) -> Result<Session, ProviderError> {
            Err(ProviderError::Api("unscripted refresh".to_string()))
        }

        async fn sign_out(&self) -> Result<(), ProviderError> {
            self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
            if !self.sign_out_delay.is_zero() {
                tokio::time::sleep(self.sign_out_delay).await;
            }
            Ok(())
        }
    }

    fn monitor_with(provider: Arc<StaticProvider>, interval_ms: u64) -> (AuthMonitor, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SessionStore::new(&StorageConfig {
            dir: dir.path().to_string_lossy().into_owned(),
            token_key_prefix: "auth-token".to_string(),
        }));
        let guard = Arc::new(SessionGuard::new(
            provider,
            store,
            Arc::new(CircuitBreaker::new(&BreakerConfig::default())),
            Arc::new(StopManager::new()),
            &GuardConfig::default(),
        ));
        let monitor = AuthMonitor::new(guard, &MonitorConfig {
            enabled: true,
            interval_ms,
        });
        (monitor, dir)
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let provider = Arc::new(StaticProvider::healthy());
        let (monitor, _dir) = monitor_with(provider.clone(), 10);

        monitor.start();
        monitor.start();
        assert!(monitor.is_running());

        tokio::time::sleep(Duration::from_millis(60)).await;

        // A single stop must be sufficient to cancel all ticking.
        monitor.stop();
        assert!(!monitor.is_running());

        tokio::time::sleep(Duration::from_millis(30)).await;
        let calls_after_stop = provider.get_calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(
            provider.get_calls.load(Ordering::SeqCst),
            calls_after_stop,
            "no ticks may run after stop"
        );
    }

    #[tokio::test]
    async fn test_stop_without_start_is_noop() {
        let (monitor, _dir) = monitor_with(Arc::new(StaticProvider::healthy()), 10);
        monitor.stop();
        assert!(!monitor.is_running());
    }

    #[tokio::test]
    async fn test_ticks_invoke_guard() {
        let provider = Arc::new(StaticProvider::healthy());
        let (monitor, _dir) = monitor_with(provider.clone(), 10);

        monitor.start();
        tokio::time::sleep(Duration::from_millis(80)).await;
        monitor.stop();

        assert!(provider.get_calls.load(Ordering::SeqCst) >= 2);
        // Healthy sessions are never signed out by the monitor.
        assert_eq!(provider.sign_out_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_corrupted_session_is_cleared_not_checked() {
        let provider = Arc::new(StaticProvider::corrupted());
        let (monitor, _dir) = monitor_with(provider.clone(), 10);

        monitor.start();
        tokio::time::sleep(Duration::from_millis(45)).await;
        monitor.stop();

        let get_calls = provider.get_calls.load(Ordering::SeqCst);
        let sign_outs = provider.sign_out_calls.load(Ordering::SeqCst);
        assert!(sign_outs >= 1, "corrupted session must trigger cleanup");
        // detect-and-clear short-circuits the tick: one status read per tick,
        // never a second one for the safe check.
        assert_eq!(get_calls, sign_outs);
    }

    #[tokio::test]
    async fn test_stop_drains_in_flight_cleanup() {
        let provider = Arc::new(StaticProvider::corrupted_with_slow_sign_out(
            Duration::from_millis(300),
        ));
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SessionStore::new(&StorageConfig {
            dir: dir.path().to_string_lossy().into_owned(),
            token_key_prefix: "auth-token".to_string(),
        }));
        store
            .save_session(&Session {
                access_token: "at".to_string(),
                refresh_token: "rt".to_string(),
                expires_at: chrono::Utc::now().timestamp() + 3_600,
                user_id: None,
            })
            .unwrap();
        let guard = Arc::new(SessionGuard::new(
            provider.clone(),
            store.clone(),
            Arc::new(CircuitBreaker::new(&BreakerConfig::default())),
            Arc::new(StopManager::new()),
            &GuardConfig::default(),
        ));
        let monitor = AuthMonitor::new(guard, &MonitorConfig {
            enabled: true,
            interval_ms: 10,
        });

        monitor.start();
        // Wait until the first tick is inside the slow sign-out, then stop.
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(provider.sign_out_calls.load(Ordering::SeqCst) >= 1);
        monitor.stop();
        assert!(!monitor.is_running());

        // The in-flight tick must drain: the local wipe after sign-out still
        // runs, even though stop() already returned.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(
            store.load_session().is_none(),
            "session artifacts must be wiped by the tick that was in flight at stop()"
        );
        // No new tick started after the shutdown signal.
        assert_eq!(provider.sign_out_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let provider = Arc::new(StaticProvider::healthy());
        let (monitor, _dir) = monitor_with(provider.clone(), 10);

        monitor.start();
        monitor.stop();
        monitor.start();
        assert!(monitor.is_running());
        monitor.stop();
    }
}
