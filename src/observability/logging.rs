//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Log level comes from config; RUST_LOG in the environment wins when set

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// `default_level` applies when RUST_LOG is unset (e.g. "info" gives
/// "auth_sentinel=info").
pub fn init(default_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("auth_sentinel={}", default_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
