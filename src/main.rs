//! Auth Sentinel daemon.
//!
//! Wires the resilience subsystem together and runs it:
//! - loads and validates configuration
//! - builds the provider client, gates, guard, and monitor
//! - serves the operator admin API
//! - shuts everything down cleanly on ctrl-c

use std::path::Path;
use std::sync::Arc;

use auth_sentinel::admin::{setup_admin_router, AppState};
use auth_sentinel::config::{loader::load_config, SentinelConfig};
use auth_sentinel::guard::SessionGuard;
use auth_sentinel::monitor::AuthMonitor;
use auth_sentinel::observability::{logging, metrics};
use auth_sentinel::provider::http::HttpSessionProvider;
use auth_sentinel::resilience::{CircuitBreaker, StopManager};
use auth_sentinel::storage::SessionStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => load_config(Path::new(&path))?,
        None => SentinelConfig::default(),
    };

    logging::init(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "auth-sentinel starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = Arc::new(SessionStore::new(&config.storage));
    let provider = Arc::new(HttpSessionProvider::new(&config.provider, store.clone()));
    let breaker = Arc::new(CircuitBreaker::new(&config.breaker));
    let stop = Arc::new(StopManager::new());

    let guard = Arc::new(SessionGuard::new(
        provider,
        store,
        breaker,
        stop,
        &config.guard,
    ));
    let monitor = Arc::new(AuthMonitor::new(guard.clone(), &config.monitor));

    if config.monitor.enabled {
        monitor.start();
    } else {
        tracing::info!("Background auth monitor disabled");
    }

    if config.admin.enabled {
        let state = AppState {
            guard: guard.clone(),
            monitor: monitor.clone(),
            api_key: Arc::new(config.admin.api_key.clone()),
        };
        let router = setup_admin_router(state);

        let listener = tokio::net::TcpListener::bind(&config.admin.bind_address).await?;
        tracing::info!(address = %listener.local_addr()?, "Admin API listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;
    } else {
        tracing::info!("Admin API disabled, running until ctrl-c");
        tokio::signal::ctrl_c().await?;
    }

    monitor.stop();
    tracing::info!("Shutdown complete");
    Ok(())
}
