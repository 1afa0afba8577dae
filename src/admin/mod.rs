//! Operator-facing admin API.
//!
//! Thin orchestration endpoints over the guard's recovery operations. These
//! carry no containment logic of their own:
//! - `GET  /admin/status`: combined breaker + stop + monitor state
//! - `POST /admin/emergency-stop`: trip breaker, wipe session, engage stop
//! - `POST /admin/reset`: clear both gates
//! - `POST /admin/monitor/start`, `POST /admin/monitor/stop`

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::guard::SessionGuard;
use crate::monitor::AuthMonitor;

/// State injected into admin handlers.
#[derive(Clone)]
pub struct AppState {
    pub guard: Arc<SessionGuard>,
    pub monitor: Arc<AuthMonitor>,
    pub api_key: Arc<String>,
}

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/emergency-stop", post(post_emergency_stop))
        .route("/admin/reset", post(post_reset))
        .route("/admin/monitor/start", post(post_monitor_start))
        .route("/admin/monitor/stop", post(post_monitor_stop))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
