//! Vendor configuration types
//!
//! Value objects describing a vendor's integration shape, plus the
//! per-instance connector settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ConnectorError, ConnectorResult};
use crate::model::Capabilities;
use crate::types::{AuthenticationMode, DataDomain, DataFormat, ProtocolType};

/// Declares how a vendor is integrated.
///
/// Immutable once a connector has been built from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorConfig {
    /// Protocol used to reach the vendor.
    #[serde(rename = "type", default)]
    pub protocol: ProtocolType,

    /// Declared authentication mode.
    #[serde(default)]
    pub authentication: AuthenticationMode,

    /// Vendor-imposed request budgets.
    #[serde(default)]
    pub rate_limits: RateLimits,

    /// Base URL and per-domain paths.
    #[serde(default)]
    pub endpoints: VendorEndpoints,

    /// Feature flags.
    #[serde(default)]
    pub features: VendorFeatures,

    /// Wire format per data domain.
    #[serde(default)]
    pub data_formats: DataFormats,
}

impl VendorConfig {
    /// Create a config for the given protocol with default everything else.
    pub fn new(protocol: ProtocolType, authentication: AuthenticationMode) -> Self {
        Self {
            protocol,
            authentication,
            rate_limits: RateLimits::default(),
            endpoints: VendorEndpoints::default(),
            features: VendorFeatures::default(),
            data_formats: DataFormats::default(),
        }
    }

    /// Set the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.endpoints.base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_endpoints(mut self, endpoints: VendorEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    #[must_use]
    pub fn with_rate_limits(mut self, rate_limits: RateLimits) -> Self {
        self.rate_limits = rate_limits;
        self
    }

    #[must_use]
    pub fn with_features(mut self, features: VendorFeatures) -> Self {
        self.features = features;
        self
    }

    /// Validate internal consistency.
    pub fn validate(&self) -> ConnectorResult<()> {
        match self.protocol {
            ProtocolType::Api | ProtocolType::Custom => {
                let base_url = self.endpoints.base_url.as_deref().unwrap_or_default();
                if base_url.is_empty() {
                    return Err(ConnectorError::invalid_config(
                        "endpoints.base_url is required for API vendors",
                    ));
                }
                if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                    return Err(ConnectorError::invalid_config(format!(
                        "endpoints.base_url must be an http(s) URL, got '{base_url}'"
                    )));
                }
            }
            ProtocolType::Sftp | ProtocolType::Edi | ProtocolType::Webhook => {}
        }
        self.rate_limits.validate()
    }
}

/// Request budgets. `None` means unlimited for that window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_minute: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_hour: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_day: Option<u32>,
}

impl RateLimits {
    pub fn per_minute(limit: u32) -> Self {
        Self {
            requests_per_minute: Some(limit),
            ..Default::default()
        }
    }

    /// Whether no budget is configured.
    pub fn is_unlimited(&self) -> bool {
        self.requests_per_minute.is_none()
            && self.requests_per_hour.is_none()
            && self.requests_per_day.is_none()
    }

    fn validate(&self) -> ConnectorResult<()> {
        for (name, limit) in [
            ("requests_per_minute", self.requests_per_minute),
            ("requests_per_hour", self.requests_per_hour),
            ("requests_per_day", self.requests_per_day),
        ] {
            if limit == Some(0) {
                return Err(ConnectorError::invalid_config(format!(
                    "rate_limits.{name} must be greater than zero"
                )));
            }
        }
        Ok(())
    }
}

/// Base URL and per-domain paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorEndpoints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_products_path")]
    pub products: String,
    #[serde(default = "default_inventory_path")]
    pub inventory: String,
    #[serde(default = "default_pricing_path")]
    pub pricing: String,
    #[serde(default = "default_orders_path")]
    pub orders: String,
    #[serde(default = "default_auth_path")]
    pub auth: String,
    /// OAuth2 token path, used when the credentials name no token URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_products_path() -> String {
    "/products".to_string()
}

fn default_inventory_path() -> String {
    "/inventory".to_string()
}

fn default_pricing_path() -> String {
    "/pricing".to_string()
}

fn default_orders_path() -> String {
    "/orders".to_string()
}

fn default_auth_path() -> String {
    "/auth/validate".to_string()
}

impl Default for VendorEndpoints {
    fn default() -> Self {
        Self {
            base_url: None,
            products: default_products_path(),
            inventory: default_inventory_path(),
            pricing: default_pricing_path(),
            orders: default_orders_path(),
            auth: default_auth_path(),
            token: None,
        }
    }
}

impl VendorEndpoints {
    /// Token URL for OAuth2 vendors: `base_url` joined with the token path,
    /// `/oauth/token` when none is configured.
    pub fn token_url(&self) -> Option<String> {
        let base = self.base_url.as_deref()?.trim_end_matches('/');
        let path = self.token.as_deref().unwrap_or("/oauth/token");
        Some(format!("{base}/{}", path.trim_start_matches('/')))
    }

    /// Path configured for a data domain.
    pub fn path_for(&self, domain: DataDomain) -> &str {
        match domain {
            DataDomain::Products => &self.products,
            DataDomain::Inventory => &self.inventory,
            DataDomain::Pricing => &self.pricing,
            DataDomain::Orders => &self.orders,
        }
    }
}

/// Feature flags a vendor declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorFeatures {
    #[serde(default = "default_true")]
    pub catalog: bool,
    #[serde(default)]
    pub real_time_inventory: bool,
    #[serde(default)]
    pub real_time_pricing: bool,
    #[serde(default)]
    pub order_management: bool,
    #[serde(default)]
    pub bulk_operations: bool,
    #[serde(default)]
    pub webhooks: bool,
}

fn default_true() -> bool {
    true
}

impl Default for VendorFeatures {
    fn default() -> Self {
        Self {
            catalog: true,
            real_time_inventory: false,
            real_time_pricing: false,
            order_management: false,
            bulk_operations: false,
            webhooks: false,
        }
    }
}

impl VendorFeatures {
    /// Every feature enabled.
    pub fn all() -> Self {
        Self {
            catalog: true,
            real_time_inventory: true,
            real_time_pricing: true,
            order_management: true,
            bulk_operations: true,
            webhooks: true,
        }
    }

    /// Capability map reported by connectors built on these features.
    pub fn capabilities(&self) -> Capabilities {
        [
            ("products", self.catalog),
            ("inventory", self.catalog || self.real_time_inventory),
            ("pricing", self.catalog || self.real_time_pricing),
            ("orders", self.order_management),
            ("real_time_inventory", self.real_time_inventory),
            ("real_time_pricing", self.real_time_pricing),
            ("bulk_operations", self.bulk_operations),
            ("webhooks", self.webhooks),
        ]
        .into_iter()
        .map(|(name, enabled)| (name.to_string(), enabled))
        .collect()
    }
}

/// Wire format per data domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFormats {
    #[serde(default)]
    pub products: DataFormat,
    #[serde(default)]
    pub inventory: DataFormat,
    #[serde(default)]
    pub pricing: DataFormat,
    #[serde(default)]
    pub orders: DataFormat,
}

impl DataFormats {
    /// Same format for every domain.
    pub fn uniform(format: DataFormat) -> Self {
        Self {
            products: format,
            inventory: format,
            pricing: format,
            orders: format,
        }
    }
}

/// Per-instance connector settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorSettings {
    /// Maximum attempts for retryable operations (including the first).
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for ConnectorSettings {
    fn default() -> Self {
        Self {
            retry_attempts: default_retry_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl ConnectorSettings {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay_ms = delay.as_millis() as u64;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_config_deserialize_defaults() {
        let json = r#"{"type": "api", "endpoints": {"base_url": "https://api.acme.test"}}"#;
        let config: VendorConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.protocol, ProtocolType::Api);
        assert_eq!(config.authentication, AuthenticationMode::ApiKey);
        assert_eq!(config.endpoints.products, "/products");
        assert_eq!(config.endpoints.auth, "/auth/validate");
        assert!(config.features.catalog);
        assert!(!config.features.webhooks);
        assert_eq!(config.data_formats.orders, DataFormat::Json);
        assert!(config.rate_limits.is_unlimited());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_api_config_requires_base_url() {
        let config = VendorConfig::new(ProtocolType::Api, AuthenticationMode::ApiKey);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("base_url"));

        let config = VendorConfig::new(ProtocolType::Custom, AuthenticationMode::Basic)
            .with_base_url("ftp://files.acme.test");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sftp_config_needs_no_url() {
        let config = VendorConfig::new(ProtocolType::Sftp, AuthenticationMode::SftpPassword);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_rate_limit_rejected() {
        let config = VendorConfig::new(ProtocolType::Api, AuthenticationMode::ApiKey)
            .with_base_url("https://api.acme.test")
            .with_rate_limits(RateLimits::per_minute(0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_protocol_serializes_as_type() {
        let config = VendorConfig::new(ProtocolType::Edi, AuthenticationMode::Edi);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["type"], "edi");
        assert_eq!(json["authentication"], "edi");
    }

    #[test]
    fn test_settings_defaults() {
        let settings = ConnectorSettings::default();
        assert_eq!(settings.retry_attempts, 3);
        assert_eq!(settings.retry_base_delay(), Duration::from_secs(1));
        assert_eq!(settings.timeout(), Duration::from_secs(30));

        let settings = ConnectorSettings::new()
            .with_retry_attempts(5)
            .with_timeout(60);
        assert_eq!(settings.retry_attempts, 5);
        assert_eq!(settings.timeout_secs, 60);
    }

    #[test]
    fn test_feature_capabilities() {
        let caps = VendorFeatures::default().capabilities();
        assert_eq!(caps.get("products"), Some(&true));
        assert_eq!(caps.get("orders"), Some(&false));
        assert_eq!(caps.len(), 8);
        assert!(VendorFeatures::all().capabilities().values().all(|v| *v));
    }

    #[test]
    fn test_path_for_domain() {
        let endpoints = VendorEndpoints {
            inventory: "/v2/stock".to_string(),
            ..Default::default()
        };
        assert_eq!(endpoints.path_for(DataDomain::Inventory), "/v2/stock");
        assert_eq!(endpoints.path_for(DataDomain::Orders), "/orders");
    }

    #[test]
    fn test_token_url() {
        assert_eq!(VendorEndpoints::default().token_url(), None);

        let mut endpoints = VendorEndpoints {
            base_url: Some("https://api.acme.test/v1/".to_string()),
            ..Default::default()
        };
        assert_eq!(
            endpoints.token_url().as_deref(),
            Some("https://api.acme.test/v1/oauth/token")
        );

        endpoints.token = Some("/auth/token".to_string());
        assert_eq!(
            endpoints.token_url().as_deref(),
            Some("https://api.acme.test/v1/auth/token")
        );
    }
}
