//! Universal connector configuration.

use serde::Deserialize;
use url::Url;

use supplylink_connector::config::{ConnectorSettings, VendorConfig};
use supplylink_connector::credentials::{CredentialBundle, VendorCredentials};
use supplylink_connector::error::{ConnectorError, ConnectorResult};
use supplylink_connector::ids::VendorId;
use supplylink_connector::mapping::{DomainTransforms, FieldMapping};
use supplylink_connector::types::ProtocolType;

/// Everything needed to build a [`UniversalConnector`](crate::UniversalConnector).
#[derive(Debug, Clone, Deserialize)]
pub struct UniversalConnectorConfig {
    /// Registry key or slug of the vendor.
    pub vendor_id: VendorId,

    /// Display name.
    pub vendor_name: String,

    /// Integration shape.
    pub config: VendorConfig,

    /// Credentials plus extra headers and endpoint override.
    #[serde(default)]
    pub credentials: CredentialBundle,

    /// Canonical field name to vendor path, per domain.
    #[serde(default = "FieldMapping::standard")]
    pub field_mapping: FieldMapping,

    /// Retry and timeout settings.
    #[serde(default)]
    pub settings: ConnectorSettings,

    /// Code-supplied transforms; never part of stored configuration.
    #[serde(skip)]
    pub transforms: DomainTransforms,
}

impl UniversalConnectorConfig {
    pub fn new(
        vendor_id: impl Into<VendorId>,
        vendor_name: impl Into<String>,
        config: VendorConfig,
        credentials: impl Into<CredentialBundle>,
    ) -> Self {
        Self {
            vendor_id: vendor_id.into(),
            vendor_name: vendor_name.into(),
            config,
            credentials: credentials.into(),
            field_mapping: FieldMapping::standard(),
            settings: ConnectorSettings::default(),
            transforms: DomainTransforms::default(),
        }
    }

    #[must_use]
    pub fn with_field_mapping(mut self, mapping: FieldMapping) -> Self {
        self.field_mapping = mapping;
        self
    }

    #[must_use]
    pub fn with_transforms(mut self, transforms: DomainTransforms) -> Self {
        self.transforms = transforms;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ConnectorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn credentials(&self) -> &VendorCredentials {
        &self.credentials.credentials
    }

    /// Base URL after applying the credential endpoint override.
    pub fn base_url(&self) -> Option<&str> {
        self.credentials
            .endpoint_override
            .as_deref()
            .or(self.config.endpoints.base_url.as_deref())
            .filter(|url| !url.is_empty())
    }

    /// OAuth2 token URL, resolved against [`base_url`](Self::base_url).
    pub fn token_url(&self) -> Option<String> {
        let mut endpoints = self.config.endpoints.clone();
        endpoints.base_url = self.base_url().map(str::to_string);
        endpoints.token_url()
    }

    /// Protocol with `custom` resolved to the API strategy.
    pub fn effective_protocol(&self) -> ProtocolType {
        match self.config.protocol {
            ProtocolType::Custom => ProtocolType::Api,
            other => other,
        }
    }

    /// Check config and credentials before a connector is built.
    pub fn validate(&self) -> ConnectorResult<()> {
        if self.vendor_id.is_empty() {
            return Err(ConnectorError::invalid_config("vendor_id cannot be empty"));
        }

        if let Some(url) = &self.credentials.endpoint_override {
            Url::parse(url).map_err(|e| {
                ConnectorError::invalid_config(format!("invalid endpoint_override '{url}': {e}"))
            })?;
        }

        let mut config = self.config.clone();
        if config.endpoints.base_url.is_none() {
            config.endpoints.base_url = self.credentials.endpoint_override.clone();
        }
        config.validate()?;

        if let (ProtocolType::Api | ProtocolType::Custom, Some(url)) =
            (self.config.protocol, self.base_url())
        {
            Url::parse(url).map_err(|e| {
                ConnectorError::invalid_config(format!("invalid base_url '{url}': {e}"))
            })?;
        }

        self.credentials().validate_for(self.config.protocol)
    }
}
