//! HTTP client for vendor REST APIs.
//!
//! Builds auth headers from the credential union, unwraps the
//! `{success, data, error}` envelope and maps HTTP failures onto the
//! connector error taxonomy. OAuth2 clients carry a [`TokenCache`] and
//! renew a rejected bearer token once per request.

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use secrecy::ExposeSecret;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use supplylink_connector::config::ConnectorSettings;
use supplylink_connector::context::OperationContext;
use supplylink_connector::credentials::{CredentialBundle, VendorCredentials};
use supplylink_connector::error::{ConnectorError, ConnectorResult};
use supplylink_connector::retry::RetryPolicy;

use crate::auth::TokenCache;
use crate::rate_limit::RateLimiter;

/// Outcome of a vendor call that reached the vendor.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// Unwrapped `data` of a successful response.
    Data(Value),
    /// HTTP 404.
    NotFound,
}

impl ApiResponse {
    pub fn into_option(self) -> Option<Value> {
        match self {
            ApiResponse::Data(value) => Some(value),
            ApiResponse::NotFound => None,
        }
    }
}

/// REST client bound to one vendor.
#[derive(Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    timeout_secs: u64,
    retry: RetryPolicy,
    rate_limiter: Arc<RateLimiter>,
    tokens: Option<Arc<TokenCache>>,
}

impl ApiClient {
    /// Build a client for `base_url` with headers derived from `bundle`.
    ///
    /// `rate_limiter` is shared with the owner so the quota outlives this client.
    pub fn new(
        base_url: &str,
        bundle: &CredentialBundle,
        settings: &ConnectorSettings,
        rate_limiter: Arc<RateLimiter>,
    ) -> ConnectorResult<Self> {
        let http = Client::builder()
            .timeout(settings.timeout())
            .connect_timeout(settings.connect_timeout())
            .build()
            .map_err(|e| ConnectorError::invalid_config(format!("failed to build HTTP client: {e}")))?;

        let query = match &bundle.credentials {
            VendorCredentials::Custom { params, .. } => params
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            _ => Vec::new(),
        };

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            headers: build_headers(bundle)?,
            query,
            timeout_secs: settings.timeout_secs,
            retry: RetryPolicy::from_settings(settings),
            rate_limiter,
            tokens: None,
        })
    }

    /// Authorize every request with a bearer token from `tokens`.
    #[must_use]
    pub fn with_token_cache(mut self, tokens: Arc<TokenCache>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn token_cache(&self) -> Option<&Arc<TokenCache>> {
        self.tokens.as_ref()
    }

    /// Underlying reqwest client, for calls outside the vendor base URL.
    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    /// Absolute URL for a configured path.
    pub fn url(&self, path: &str) -> String {
        if path.is_empty() {
            return self.base_url.clone();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET with retry on transient errors.
    pub async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
        ctx: &OperationContext,
    ) -> ConnectorResult<ApiResponse> {
        self.retry
            .execute_in(ctx, || self.send(Method::GET, path, query, None))
            .await
    }

    /// POST, never retried.
    pub async fn post(
        &self,
        path: &str,
        body: &Value,
        ctx: &OperationContext,
    ) -> ConnectorResult<ApiResponse> {
        ctx.run(self.send(Method::POST, path, &[], Some(body))).await
    }

    /// Issue one request.
    ///
    /// With a token cache the request carries a bearer token; a 401/403 on
    /// that token triggers one refresh and one resend.
    #[instrument(skip(self, query, body), fields(base_url = %self.base_url))]
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> ConnectorResult<ApiResponse> {
        let Some(tokens) = &self.tokens else {
            return self.send_once(method, path, query, body, None).await;
        };

        let token = tokens.token().await?;
        let bearer = format!("Bearer {token}");
        match self
            .send_once(method.clone(), path, query, body, Some(&bearer))
            .await
        {
            Err(ConnectorError::AuthenticationFailed { .. }) => {
                warn!(path, "Vendor rejected access token, refreshing once");
                let token = tokens.refresh_after_rejection(&token).await?;
                let bearer = format!("Bearer {token}");
                self.send_once(method, path, query, body, Some(&bearer)).await
            }
            other => other,
        }
    }

    /// `authorization` replaces any credential-derived `Authorization` header.
    async fn send_once(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
        authorization: Option<&str>,
    ) -> ConnectorResult<ApiResponse> {
        self.rate_limiter.acquire().await;

        let url = self.url(path);
        let mut headers = self.headers.clone();
        if let Some(value) = authorization {
            headers.insert(header::AUTHORIZATION, sensitive(value)?);
        }
        let mut request = self.http.request(method.clone(), &url).headers(headers);
        if !self.query.is_empty() {
            request = request.query(&self.query);
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(json) = body {
            request = request.json(json);
        }

        debug!(url = %url, method = %method, "Sending vendor request");

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ConnectorError::network_with_source("failed to read response body", e))?;

        debug!(url = %url, status = %status, "Received vendor response");

        if status == StatusCode::NOT_FOUND {
            return Ok(ApiResponse::NotFound);
        }
        if !status.is_success() {
            let error = response_error(status, &text);
            warn!(url = %url, status = %status, error_code = error.error_code(), "Vendor request failed");
            return Err(error);
        }
        if text.trim().is_empty() {
            return Ok(ApiResponse::Data(Value::Null));
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| ConnectorError::invalid_data(format!("response is not JSON: {e}")))?;
        unwrap_envelope(body).map(ApiResponse::Data)
    }

    fn transport_error(&self, e: reqwest::Error) -> ConnectorError {
        if e.is_timeout() {
            ConnectorError::ConnectionTimeout {
                timeout_secs: self.timeout_secs,
            }
        } else if e.is_connect() {
            ConnectorError::connection_failed_with_source("failed to connect to vendor", e)
        } else {
            ConnectorError::network_with_source("request to vendor failed", e)
        }
    }
}

/// Default, credential and extra headers.
///
/// Credential headers take precedence: API key, then bearer, then basic,
/// then custom. Extra headers never replace them.
pub fn build_headers(bundle: &CredentialBundle) -> ConnectorResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

    match &bundle.credentials {
        VendorCredentials::ApiKey {
            api_key,
            api_secret,
            header_name,
        } => {
            headers.insert(header_name_of(header_name)?, sensitive(api_key.expose_secret())?);
            if let Some(secret) = api_secret {
                headers.insert(
                    HeaderName::from_static("x-api-secret"),
                    sensitive(secret.expose_secret())?,
                );
            }
        }
        VendorCredentials::Bearer { token } => {
            headers.insert(
                header::AUTHORIZATION,
                sensitive(&format!("Bearer {}", token.expose_secret()))?,
            );
        }
        VendorCredentials::OAuth2 {
            access_token: Some(token),
            ..
        } => {
            headers.insert(
                header::AUTHORIZATION,
                sensitive(&format!("Bearer {}", token.expose_secret()))?,
            );
        }
        VendorCredentials::Basic { username, password } => {
            let encoded = base64_encode(format!("{username}:{}", password.expose_secret()));
            headers.insert(header::AUTHORIZATION, sensitive(&format!("Basic {encoded}"))?);
        }
        VendorCredentials::Custom { headers: custom, .. } => {
            for (name, value) in custom {
                headers.insert(header_name_of(name)?, header_value_of(name, value)?);
            }
        }
        VendorCredentials::OAuth2 { .. }
        | VendorCredentials::None
        | VendorCredentials::Sftp { .. }
        | VendorCredentials::Edi { .. } => {}
    }

    for (name, value) in &bundle.extra_headers {
        let name = header_name_of(name)?;
        if !headers.contains_key(&name) {
            let value = header_value_of(name.as_str(), value)?;
            headers.insert(name, value);
        }
    }

    Ok(headers)
}

/// Unwrap `{success, data, error}`. Bodies without a `success` flag are
/// returned whole.
pub fn unwrap_envelope(body: Value) -> ConnectorResult<Value> {
    let Value::Object(mut map) = body else {
        return Ok(body);
    };
    match map.get("success").and_then(Value::as_bool) {
        Some(true) => Ok(map.remove("data").unwrap_or(Value::Null)),
        Some(false) => Err(ConnectorError::VendorRejected {
            message: map
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("vendor reported failure without a message")
                .to_string(),
        }),
        None => Ok(Value::Object(map)),
    }
}

/// Map a non-2xx response onto the error taxonomy.
pub fn response_error(status: StatusCode, body: &str) -> ConnectorError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            ["error", "message"]
                .iter()
                .find_map(|key| json.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.chars().take(200).collect());

    match status {
        StatusCode::UNAUTHORIZED => ConnectorError::authentication(message),
        StatusCode::FORBIDDEN => ConnectorError::authentication(format!("forbidden: {message}")),
        StatusCode::TOO_MANY_REQUESTS => ConnectorError::TargetUnavailable {
            message: format!("rate limited: {message}"),
        },
        s if s.is_server_error() => ConnectorError::TargetUnavailable {
            message: format!("HTTP {}: {message}", s.as_u16()),
        },
        s => ConnectorError::UnexpectedStatus {
            status: s.as_u16(),
            message,
        },
    }
}

fn header_name_of(name: &str) -> ConnectorResult<HeaderName> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| ConnectorError::invalid_config(format!("invalid header name '{name}'")))
}

fn header_value_of(name: &str, value: &str) -> ConnectorResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| ConnectorError::invalid_config(format!("invalid value for header '{name}'")))
}

fn sensitive(value: &str) -> ConnectorResult<HeaderValue> {
    let mut value = HeaderValue::from_str(value)
        .map_err(|_| ConnectorError::invalid_config("credential contains invalid header characters"))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Base64 encode bytes to string.
fn base64_encode(data: impl AsRef<[u8]>) -> String {
    use base64::{engine::general_purpose::STANDARD, Engine};
    STANDARD.encode(data)
}
