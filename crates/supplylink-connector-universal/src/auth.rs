//! OAuth2 token cache with single-flight refresh.
//!
//! Tokens come from the client-credentials grant. When the vendor hands out
//! a refresh token (or the stored credentials carry one) the refresh-token
//! grant is tried first and client credentials are the fallback.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use supplylink_connector::credentials::VendorCredentials;
use supplylink_connector::error::{ConnectorError, ConnectorResult};

/// Refresh this long before the vendor-reported expiry.
const GRACE_PERIOD_SECS: i64 = 60;

/// Lifetime assumed when the token response omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// OAuth2 token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Cached OAuth2 access token.
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: SecretString,
    /// `None` for seeded tokens of unknown lifetime; they are used until rejected.
    expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Returns true if the token is expired or will expire within the grace period.
    fn is_expired(&self, grace_period: Duration) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Utc::now() + grace_period >= expires_at)
    }

    fn matches(&self, token: &str) -> bool {
        self.access_token.expose_secret() == token
    }
}

/// Token cache for one set of client credentials.
///
/// At most one token request is in flight at a time. Callers that find the
/// cache stale while a refresh is running wait for it and reuse its result.
#[derive(Debug)]
pub struct TokenCache {
    http_client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: SecretString,
    scopes: Vec<String>,
    cached_token: RwLock<Option<CachedToken>>,
    refresh_token: RwLock<Option<SecretString>>,
    refresh_gate: Mutex<()>,
    grace_period: Duration,
}

impl TokenCache {
    /// Build from `OAuth2` credentials, seeding any access or refresh token they carry.
    ///
    /// `default_token_url` is used when the credentials name none.
    pub fn from_credentials(
        credentials: &VendorCredentials,
        default_token_url: &str,
    ) -> ConnectorResult<Self> {
        let VendorCredentials::OAuth2 {
            client_id,
            client_secret,
            token_url,
            access_token,
            refresh_token,
            expires_at,
            scopes,
        } = credentials
        else {
            return Err(ConnectorError::invalid_config(format!(
                "expected oauth2 credentials, got {}",
                credentials.mode()
            )));
        };

        let seeded = access_token.as_ref().map(|token| CachedToken {
            access_token: token.clone(),
            expires_at: *expires_at,
        });

        Ok(Self {
            http_client: reqwest::Client::new(),
            token_url: token_url
                .clone()
                .unwrap_or_else(|| default_token_url.to_string()),
            client_id: client_id.clone(),
            client_secret: client_secret.clone(),
            scopes: scopes.clone(),
            cached_token: RwLock::new(seeded),
            refresh_token: RwLock::new(refresh_token.clone()),
            refresh_gate: Mutex::new(()),
            grace_period: Duration::seconds(GRACE_PERIOD_SECS),
        })
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    async fn cached(&self) -> Option<String> {
        let cache = self.cached_token.read().await;
        cache
            .as_ref()
            .filter(|token| !token.is_expired(self.grace_period))
            .map(|token| token.access_token.expose_secret().clone())
    }

    /// A valid access token, refreshing when the cached one is near expiry.
    #[instrument(skip(self), fields(client_id = %self.client_id))]
    pub async fn token(&self) -> ConnectorResult<String> {
        if let Some(token) = self.cached().await {
            return Ok(token);
        }

        let _gate = self.refresh_gate.lock().await;
        // Another caller may have refreshed while we waited.
        if let Some(token) = self.cached().await {
            debug!("Reusing token refreshed by a concurrent caller");
            return Ok(token);
        }
        let had_token = self.cached_token.read().await.is_some();
        self.refresh_locked(had_token).await
    }

    /// Replace a token the vendor rejected.
    ///
    /// If the cache already holds a different token, a concurrent caller has
    /// refreshed it and that token is returned without another request.
    #[instrument(skip(self, rejected), fields(client_id = %self.client_id))]
    pub async fn refresh_after_rejection(&self, rejected: &str) -> ConnectorResult<String> {
        let _gate = self.refresh_gate.lock().await;
        {
            let cache = self.cached_token.read().await;
            if let Some(token) = cache.as_ref() {
                if !token.matches(rejected) && !token.is_expired(self.grace_period) {
                    debug!("Rejected token already replaced");
                    return Ok(token.access_token.expose_secret().clone());
                }
            }
        }
        self.refresh_locked(true).await
    }

    /// Drop the cached token, forcing a refresh on next use.
    pub async fn invalidate(&self) {
        *self.cached_token.write().await = None;
    }

    /// Request a new token. Caller holds the refresh gate.
    ///
    /// When a token was already held, an authentication failure means the
    /// session cannot be renewed and is reported as `CredentialsExpired`.
    async fn refresh_locked(&self, had_token: bool) -> ConnectorResult<String> {
        let fresh = match self.acquire_token().await {
            Ok(fresh) => fresh,
            Err(e) if had_token && e.is_authentication() => {
                warn!(error = %e, "Vendor refused to renew access token");
                *self.cached_token.write().await = None;
                return Err(ConnectorError::CredentialsExpired);
            }
            Err(e) => return Err(e),
        };
        let token = fresh.access_token.expose_secret().clone();
        *self.cached_token.write().await = Some(fresh);
        Ok(token)
    }

    /// Refresh-token grant when a refresh token is held, else client credentials.
    async fn acquire_token(&self) -> ConnectorResult<CachedToken> {
        let refresh_token = self.refresh_token.read().await.clone();
        if let Some(refresh_token) = refresh_token {
            match self.request_token(Some(&refresh_token)).await {
                Ok(token) => return Ok(token),
                Err(e) if e.is_authentication() => {
                    warn!(error = %e, "Refresh token rejected, falling back to client credentials");
                    *self.refresh_token.write().await = None;
                }
                Err(e) => return Err(e),
            }
        }
        self.request_token(None).await
    }

    async fn request_token(&self, refresh_token: Option<&SecretString>) -> ConnectorResult<CachedToken> {
        let scope = self.scopes.join(" ");
        let mut params = vec![
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret().as_str()),
        ];
        match refresh_token {
            Some(refresh_token) => {
                params.push(("grant_type", "refresh_token"));
                params.push(("refresh_token", refresh_token.expose_secret().as_str()));
            }
            None => {
                params.push(("grant_type", "client_credentials"));
                if !scope.is_empty() {
                    params.push(("scope", scope.as_str()));
                }
            }
        }

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| ConnectorError::connection_failed_with_source("token request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("token request failed with status {status}: {body}");
            return Err(if status.is_server_error() {
                ConnectorError::TargetUnavailable { message }
            } else {
                ConnectorError::authentication(message)
            });
        }

        let token_response: TokenResponse = response.json().await.map_err(|e| {
            ConnectorError::invalid_data(format!("failed to parse token response: {e}"))
        })?;

        if let Some(rotated) = token_response.refresh_token {
            *self.refresh_token.write().await = Some(SecretString::new(rotated));
        }

        let expires_at = Utc::now()
            + Duration::seconds(token_response.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS));

        info!(
            grant = if refresh_token.is_some() { "refresh_token" } else { "client_credentials" },
            expires_at = %expires_at.format("%Y-%m-%d %H:%M:%S UTC"),
            "Acquired vendor access token"
        );

        Ok(CachedToken {
            access_token: SecretString::new(token_response.access_token),
            expires_at: Some(expires_at),
        })
    }
}
