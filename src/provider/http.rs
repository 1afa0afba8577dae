//! HTTP session provider client.
//!
//! Speaks a GoTrue-style token API:
//! - `POST /token?grant_type=refresh_token` to extend a session
//! - `POST /logout` to invalidate it server-side
//!
//! The status read never hits the network while the stored access token is
//! still valid. Once it expires, the read attempts the refresh grant
//! transparently, which is how refresh-token failures surface to the guard
//! through the status path.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::ProviderConfig;
use crate::provider::{ProviderError, Session, SessionProvider};
use crate::storage::SessionStore;

/// Production session provider backed by an HTTP identity service.
pub struct HttpSessionProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout_secs: u64,
    store: Arc<SessionStore>,
}

/// Successful refresh grant response body.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    refresh_token: String,
    /// Access token lifetime in seconds.
    expires_in: i64,
    #[serde(default)]
    user: Option<UserRef>,
}

#[derive(Debug, Deserialize)]
struct UserRef {
    id: String,
}

/// Error payload shapes the provider is known to emit.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpSessionProvider {
    pub fn new(config: &ProviderConfig, store: Arc<SessionStore>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout_secs: config.timeout_secs,
            store,
        }
    }

    fn map_transport_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(self.timeout_secs)
        } else {
            ProviderError::Transport(e.to_string())
        }
    }

    /// Pull the most useful message out of an error response body.
    fn extract_error_message(status: reqwest::StatusCode, body: &str) -> String {
        if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
            if let Some(msg) = parsed
                .error_description
                .or(parsed.msg)
                .or(parsed.error)
                .filter(|m| !m.is_empty())
            {
                return msg;
            }
        }
        format!("unexpected status {}", status)
    }

    fn now_unix() -> i64 {
        chrono::Utc::now().timestamp()
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn get_session(&self) -> Result<Option<Session>, ProviderError> {
        let Some(session) = self.store.load_session() else {
            return Ok(None);
        };

        if session.seconds_until_expiry(Self::now_unix()) > 0 {
            return Ok(Some(session));
        }

        // Access token expired; the session only survives if the refresh
        // grant still works.
        tracing::debug!("stored access token expired, attempting refresh");
        self.refresh().await.map(Some)
    }

    async fn refresh(&self) -> Result<Session, ProviderError> {
        let refresh_token = self
            .store
            .load_session()
            .map(|s| s.refresh_token)
            .ok_or_else(|| ProviderError::Api("refresh token not found".to_string()))?;

        let url = format!("{}/token?grant_type=refresh_token", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(Self::extract_error_message(
                status, &body,
            )));
        }

        let grant: RefreshResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Api(format!("malformed refresh response: {}", e)))?;

        let session = Session {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_at: Self::now_unix() + grant.expires_in,
            user_id: grant.user.map(|u| u.id),
        };

        if let Err(e) = self.store.save_session(&session) {
            tracing::warn!(error = %e, "Failed to persist refreshed session");
        }

        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        let Some(session) = self.store.load_session() else {
            return Ok(());
        };

        let url = format!("{}/logout", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        // 401 means the token is already dead server-side, which is the
        // outcome sign-out wants anyway.
        if status.is_success() || status == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::Api(Self::extract_error_message(
            status, &body,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_error_message_prefers_description() {
        let body = r#"{"error": "invalid_grant", "error_description": "Invalid Refresh Token"}"#;
        let msg =
            HttpSessionProvider::extract_error_message(reqwest::StatusCode::BAD_REQUEST, body);
        assert_eq!(msg, "Invalid Refresh Token");
    }

    #[test]
    fn test_extract_error_message_falls_back_to_msg_field() {
        let body = r#"{"msg": "Rate limit exceeded"}"#;
        let msg = HttpSessionProvider::extract_error_message(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            body,
        );
        assert_eq!(msg, "Rate limit exceeded");
    }

    #[test]
    fn test_extract_error_message_handles_garbage_body() {
        let msg =
            HttpSessionProvider::extract_error_message(reqwest::StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(msg, "unexpected status 502 Bad Gateway");
    }
}
