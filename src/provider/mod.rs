//! Session provider boundary.
//!
//! # Data Flow
//! ```text
//! SessionGuard
//!     → SessionProvider trait (get_session / refresh / sign_out)
//!     → http.rs (production client against the identity service)
//! ```
//!
//! # Design Decisions
//! - The guard depends only on the trait; the HTTP client is one implementation
//! - Provider error messages are opaque here; classification lives in the guard
//! - Status reads transparently refresh an expired session, so refresh-token
//!   failures surface through the status path

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An authenticated session as issued by the provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    /// Short-lived access credential.
    pub access_token: String,

    /// Long-lived credential used to obtain new access tokens.
    pub refresh_token: String,

    /// Unix timestamp (seconds) at which the access token expires.
    pub expires_at: i64,

    /// Provider-side user identifier, when known.
    #[serde(default)]
    pub user_id: Option<String>,
}

impl Session {
    /// Seconds until the access token expires; negative once expired.
    pub fn seconds_until_expiry(&self, now_unix: i64) -> i64 {
        self.expires_at - now_unix
    }
}

/// Errors that can occur when talking to the session provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network-level failure (connect, DNS, TLS).
    #[error("transport error: {0}")]
    Transport(String),

    /// Provider did not respond within the configured deadline.
    #[error("provider timeout after {0} seconds")]
    Timeout(u64),

    /// Provider responded with an error payload. The message is the raw
    /// provider-supplied text; the guard's classifier interprets it.
    #[error("provider error: {0}")]
    Api(String),
}

impl ProviderError {
    /// The provider-facing message text used for error classification.
    pub fn message(&self) -> &str {
        match self {
            ProviderError::Transport(msg) | ProviderError::Api(msg) => msg,
            ProviderError::Timeout(_) => "timeout",
        }
    }
}

/// The external identity service the sentinel wraps.
///
/// All three operations suspend while awaiting the provider; none of them
/// support mid-flight cancellation.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Read the current session state. `Ok(None)` means no session exists,
    /// which is a benign negative result, not a malfunction.
    async fn get_session(&self) -> Result<Option<Session>, ProviderError>;

    /// Attempt to extend the session via the refresh grant.
    async fn refresh(&self) -> Result<Session, ProviderError>;

    /// Invalidate the session server-side.
    async fn sign_out(&self) -> Result<(), ProviderError>;
}
