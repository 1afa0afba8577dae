//! Provider error classification.
//!
//! The provider is an external black box, so classification is substring
//! matching on its error messages. All matching lives behind this one
//! function; the rest of the system depends on the returned variant, never
//! on raw strings. Targeting a different provider means extending the
//! pattern lists here and nowhere else.

use crate::provider::ProviderError;

/// Closed set of error categories the guard acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// The stored refresh token is unknown or invalid. The persisted session
    /// is unrecoverable without re-authentication; escalates to the stop
    /// manager.
    RefreshTokenInvalid,

    /// Provider-imposed backoff. A transient "try later" condition, never
    /// counted against the circuit breaker.
    RateLimited,

    /// Any other malfunction. Counted against the circuit breaker.
    Other,
}

/// Message fragments the provider emits for a dead refresh token.
const REFRESH_TOKEN_INVALID_PATTERNS: &[&str] = &[
    "invalid refresh token",
    "refresh token not found",
    "refresh_token_not_found",
    "already used",
];

/// Message fragments the provider emits when rate limiting.
const RATE_LIMIT_PATTERNS: &[&str] = &[
    "rate limit",
    "too many requests",
    "over_request_rate_limit",
];

/// Classify a provider error into the closed category set.
pub fn classify(error: &ProviderError) -> ProviderErrorKind {
    let message = error.message().to_lowercase();

    if REFRESH_TOKEN_INVALID_PATTERNS
        .iter()
        .any(|p| message.contains(p))
    {
        return ProviderErrorKind::RefreshTokenInvalid;
    }

    if RATE_LIMIT_PATTERNS.iter().any(|p| message.contains(p)) {
        return ProviderErrorKind::RateLimited;
    }

    ProviderErrorKind::Other
}
