//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the sentinel.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the auth sentinel.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SentinelConfig {
    /// Session provider endpoint settings.
    pub provider: ProviderConfig,

    /// Circuit breaker thresholds.
    pub breaker: BreakerConfig,

    /// Session guard policy.
    pub guard: GuardConfig,

    /// Background monitor settings.
    pub monitor: MonitorConfig,

    /// Local session artifact storage.
    pub storage: StorageConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Session provider endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the session provider (e.g. "https://auth.example.com").
    pub base_url: String,

    /// Public API key sent with every provider request.
    pub api_key: String,

    /// Request timeout in seconds for provider calls.
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9999".to_string(),
            api_key: String::new(),
            timeout_secs: 10,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive failures before the breaker opens.
    pub max_failures: u32,

    /// Consecutive successes before an open breaker closes.
    pub close_threshold: u32,

    /// Time after the last failure before an open breaker resets itself, in milliseconds.
    pub reset_timeout_ms: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            max_failures: 3,
            close_threshold: 2,
            reset_timeout_ms: 60_000,
        }
    }
}

/// Session guard policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Sessions expiring within this margin are flagged for refresh, in seconds.
    pub refresh_margin_secs: i64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            refresh_margin_secs: 300,
        }
    }
}

/// Background auth monitor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Enable the background monitor.
    pub enabled: bool,

    /// Tick interval in milliseconds.
    pub interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 300_000,
        }
    }
}

/// Local session artifact storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding persisted session artifacts.
    pub dir: String,

    /// Filename prefix for token artifacts. Cleanup removes every file
    /// whose name starts with this prefix.
    pub token_key_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: ".auth-sentinel".to_string(),
            token_key_prefix: "auth-token".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_thresholds() {
        let config = SentinelConfig::default();
        assert_eq!(config.breaker.max_failures, 3);
        assert_eq!(config.breaker.close_threshold, 2);
        assert_eq!(config.breaker.reset_timeout_ms, 60_000);
        assert_eq!(config.guard.refresh_margin_secs, 300);
        assert_eq!(config.monitor.interval_ms, 300_000);
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: SentinelConfig = toml::from_str(
            r#"
            [provider]
            base_url = "https://auth.example.com"
            api_key = "anon"
            "#,
        )
        .unwrap();
        assert_eq!(config.provider.base_url, "https://auth.example.com");
        assert_eq!(config.breaker.max_failures, 3);
        assert!(config.monitor.enabled);
    }
}
