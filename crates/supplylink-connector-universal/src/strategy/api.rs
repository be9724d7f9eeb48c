//! REST API strategy.

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use supplylink_connector::config::ConnectorSettings;
use supplylink_connector::context::OperationContext;
use supplylink_connector::credentials::{CredentialBundle, VendorCredentials};
use supplylink_connector::error::{ConnectorError, ConnectorResult};

use crate::auth::TokenCache;
use crate::client::{ApiClient, ApiResponse};
use crate::config::UniversalConnectorConfig;
use crate::rate_limit::RateLimiter;

/// Talks to a vendor REST API.
///
/// The HTTP client is installed by a successful [`validate`](Self::validate);
/// data calls made before that fail with `ClientNotInitialized`. The rate
/// limiter and OAuth2 token cache live as long as the strategy, so
/// revalidating keeps the vendor's quota and token.
#[derive(Debug)]
pub struct ApiStrategy {
    base_url: String,
    auth_path: String,
    credentials: CredentialBundle,
    settings: ConnectorSettings,
    rate_limiter: Arc<RateLimiter>,
    tokens: Option<Arc<TokenCache>>,
    client: RwLock<Option<Arc<ApiClient>>>,
}

impl ApiStrategy {
    pub fn new(config: &UniversalConnectorConfig) -> ConnectorResult<Self> {
        let base_url = config
            .base_url()
            .ok_or_else(|| ConnectorError::invalid_config("endpoints.base_url is required for API vendors"))?;

        let tokens = match config.credentials() {
            credentials @ VendorCredentials::OAuth2 { .. } => {
                let default_token_url = config.token_url().unwrap_or_default();
                Some(Arc::new(TokenCache::from_credentials(
                    credentials,
                    &default_token_url,
                )?))
            }
            _ => None,
        };

        Ok(Self {
            base_url: base_url.to_string(),
            auth_path: config.config.endpoints.auth.clone(),
            credentials: config.credentials.clone(),
            settings: config.settings.clone(),
            rate_limiter: Arc::new(RateLimiter::new(&config.config.rate_limits)),
            tokens,
            client: RwLock::new(None),
        })
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    pub fn token_cache(&self) -> Option<&Arc<TokenCache>> {
        self.tokens.as_ref()
    }

    pub async fn is_initialized(&self) -> bool {
        self.client.read().await.is_some()
    }

    /// Build a client and call the vendor's auth-check endpoint with it.
    ///
    /// The client is installed only when the vendor accepts the credentials;
    /// a rejection also removes any client installed by an earlier success.
    pub async fn validate(&self, ctx: &OperationContext) -> ConnectorResult<bool> {
        let mut client = ApiClient::new(
            &self.base_url,
            &self.credentials,
            &self.settings,
            self.rate_limiter.clone(),
        )?;
        if let Some(tokens) = &self.tokens {
            client = client.with_token_cache(tokens.clone());
        }
        let client = Arc::new(client);

        let accepted = match client.get(&self.auth_path, &[], ctx).await {
            Ok(ApiResponse::Data(_)) => {
                info!(base_url = %self.base_url, "Vendor credentials accepted");
                true
            }
            Ok(ApiResponse::NotFound) => {
                warn!(auth_path = %self.auth_path, "Auth check endpoint not found");
                false
            }
            Err(e) if e.is_authentication() || matches!(e, ConnectorError::VendorRejected { .. }) => {
                warn!(base_url = %self.base_url, error = %e, "Vendor rejected credentials");
                false
            }
            Err(e) => return Err(e),
        };

        *self.client.write().await = accepted.then_some(client);
        Ok(accepted)
    }

    async fn client(&self) -> ConnectorResult<Arc<ApiClient>> {
        self.client
            .read()
            .await
            .clone()
            .ok_or(ConnectorError::ClientNotInitialized)
    }

    /// GET a path, `None` on 404.
    pub async fn fetch(
        &self,
        path: &str,
        query: &[(String, String)],
        ctx: &OperationContext,
    ) -> ConnectorResult<Option<Value>> {
        let client = self.client().await?;
        Ok(client.get(path, query, ctx).await?.into_option())
    }

    /// POST a payload.
    pub async fn submit(
        &self,
        path: &str,
        payload: &Value,
        ctx: &OperationContext,
    ) -> ConnectorResult<Value> {
        let client = self.client().await?;
        match client.post(path, payload, ctx).await? {
            ApiResponse::Data(value) => Ok(value),
            ApiResponse::NotFound => Err(ConnectorError::UnexpectedStatus {
                status: 404,
                message: format!("{path} not found"),
            }),
        }
    }
}
