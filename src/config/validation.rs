//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds > 0, intervals > 0)
//! - Catch placeholder credentials before they reach production
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SentinelConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::SentinelConfig;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g. "breaker.max_failures").
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &SentinelConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.provider.base_url.parse::<url::Url>().is_err() {
        errors.push(ValidationError {
            field: "provider.base_url".to_string(),
            message: format!("not a valid URL: '{}'", config.provider.base_url),
        });
    }
    if config.provider.timeout_secs == 0 {
        errors.push(ValidationError {
            field: "provider.timeout_secs".to_string(),
            message: "must be greater than 0".to_string(),
        });
    }

    if config.breaker.max_failures == 0 {
        errors.push(ValidationError {
            field: "breaker.max_failures".to_string(),
            message: "must be at least 1".to_string(),
        });
    }
    if config.breaker.close_threshold == 0 {
        errors.push(ValidationError {
            field: "breaker.close_threshold".to_string(),
            message: "must be at least 1".to_string(),
        });
    }
    if config.breaker.reset_timeout_ms == 0 {
        errors.push(ValidationError {
            field: "breaker.reset_timeout_ms".to_string(),
            message: "must be greater than 0".to_string(),
        });
    }

    if config.guard.refresh_margin_secs < 0 {
        errors.push(ValidationError {
            field: "guard.refresh_margin_secs".to_string(),
            message: "must not be negative".to_string(),
        });
    }

    if config.monitor.enabled && config.monitor.interval_ms == 0 {
        errors.push(ValidationError {
            field: "monitor.interval_ms".to_string(),
            message: "must be greater than 0 when the monitor is enabled".to_string(),
        });
    }

    if config.storage.token_key_prefix.is_empty() {
        errors.push(ValidationError {
            field: "storage.token_key_prefix".to_string(),
            message: "must not be empty (cleanup would match every file)".to_string(),
        });
    }

    if config.admin.enabled && config.admin.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "admin.bind_address".to_string(),
            message: format!("not a valid socket address: '{}'", config.admin.bind_address),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
