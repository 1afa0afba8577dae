//! Metrics collection and exposition.
//!
//! # Metrics
//! - `auth_checks_total` (counter): status checks by outcome
//! - `auth_refresh_total` (counter): refresh attempts by outcome
//! - `auth_breaker_transitions_total` (counter): breaker open/close events
//! - `auth_breaker_open` (gauge): 1 = open, 0 = closed
//! - `auth_stop_engaged` (gauge): 1 = kill-switch engaged
//! - `auth_monitor_running` (gauge): 1 = background monitor active
//! - `auth_monitor_ticks_total` (counter): monitor loop iterations
//! - `auth_sessions_cleared_total` (counter): corrupted-session cleanups
//!
//! # Design Decisions
//! - Low-overhead metric updates via the `metrics` facade
//! - Prometheus exposition is optional; recording without an exporter is a no-op

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP scrape listener.
///
/// Failures are logged, not fatal: the sentinel degrades to recording into
/// the void rather than refusing to start.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_auth_check(outcome: &'static str) {
    counter!("auth_checks_total", "outcome" => outcome).increment(1);
}

pub fn record_refresh(outcome: &'static str) {
    counter!("auth_refresh_total", "outcome" => outcome).increment(1);
}

pub fn record_breaker_opened() {
    counter!("auth_breaker_transitions_total", "state" => "open").increment(1);
    gauge!("auth_breaker_open").set(1.0);
}

pub fn record_breaker_closed() {
    counter!("auth_breaker_transitions_total", "state" => "closed").increment(1);
    gauge!("auth_breaker_open").set(0.0);
}

pub fn record_stop_state(engaged: bool) {
    gauge!("auth_stop_engaged").set(if engaged { 1.0 } else { 0.0 });
}

pub fn record_monitor_running(running: bool) {
    gauge!("auth_monitor_running").set(if running { 1.0 } else { 0.0 });
}

pub fn record_monitor_tick() {
    counter!("auth_monitor_ticks_total").increment(1);
}

pub fn record_session_cleared() {
    counter!("auth_sessions_cleared_total").increment(1);
}
