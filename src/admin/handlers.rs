use axum::{body::Bytes, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::admin::AppState;
use crate::guard::ProtectionStatus;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub protection: ProtectionStatus,
    pub monitor_running: bool,
}

#[derive(Deserialize)]
pub struct EmergencyStopRequest {
    #[serde(default = "default_reason")]
    pub reason: String,
}

fn default_reason() -> String {
    "manual".to_string()
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        protection: state.guard.protection_status(),
        monitor_running: state.monitor.is_running(),
    })
}

pub async fn post_emergency_stop(
    State(state): State<AppState>,
    body: Bytes,
) -> Json<SystemStatus> {
    // Body is optional; an absent or unreadable one falls back to "manual".
    let reason = serde_json::from_slice::<EmergencyStopRequest>(&body)
        .map(|req| req.reason)
        .unwrap_or_else(|_| default_reason());

    state.guard.emergency_stop(&reason).await;

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        protection: state.guard.protection_status(),
        monitor_running: state.monitor.is_running(),
    })
}

pub async fn post_reset(State(state): State<AppState>) -> Json<SystemStatus> {
    state.guard.reset_protection();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        protection: state.guard.protection_status(),
        monitor_running: state.monitor.is_running(),
    })
}

pub async fn post_monitor_start(State(state): State<AppState>) -> Json<SystemStatus> {
    state.monitor.start();
    get_status(State(state)).await
}

pub async fn post_monitor_stop(State(state): State<AppState>) -> Json<SystemStatus> {
    state.monitor.stop();
    get_status(State(state)).await
}
