//! Vendor onboarding.
//!
//! Connects a brand-new vendor: build its configuration from a request,
//! check it with a throwaway [`UniversalConnector`], and register it only
//! when the connection test passes.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use supplylink_connector::config::{
    ConnectorSettings, DataFormats, RateLimits, VendorConfig, VendorEndpoints, VendorFeatures,
};
use supplylink_connector::credentials::CredentialBundle;
use supplylink_connector::ids::VendorId;
use supplylink_connector::mapping::FieldMapping;
use supplylink_connector::model::VendorConnectionTest;
use supplylink_connector::types::{AuthenticationMode, ProtocolType, VendorType};
use supplylink_connector_universal::{
    SftpTransport, SshSftpTransport, UniversalConnector, UniversalConnectorConfig,
};

use crate::error::{VendorError, VendorResult};
use crate::registry::{VendorCapabilities, VendorRegistry, VendorRegistryEntry};

const ID_SUFFIX_LEN: usize = 6;
const MAX_ID_ATTEMPTS: usize = 5;

/// Everything needed to connect a new vendor. Omitted parts take defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct VendorConnectionRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub protocol: ProtocolType,
    #[serde(default = "default_vendor_type")]
    pub vendor_type: VendorType,
    /// Defaults to the mode of the supplied credentials.
    #[serde(default)]
    pub authentication: Option<AuthenticationMode>,
    #[serde(default)]
    pub credentials: CredentialBundle,
    #[serde(default)]
    pub endpoints: VendorEndpoints,
    /// Shorthand for `endpoints.base_url`.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Layered over the standard mapping.
    #[serde(default)]
    pub field_mapping: FieldMapping,
    #[serde(default)]
    pub rate_limits: RateLimits,
    #[serde(default)]
    pub features: VendorFeatures,
    #[serde(default)]
    pub data_formats: DataFormats,
    #[serde(default)]
    pub settings: ConnectorSettings,
}

fn default_vendor_type() -> VendorType {
    VendorType::Universal
}

impl VendorConnectionRequest {
    pub fn new(
        name: impl Into<String>,
        protocol: ProtocolType,
        credentials: impl Into<CredentialBundle>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            protocol,
            vendor_type: default_vendor_type(),
            authentication: None,
            credentials: credentials.into(),
            endpoints: VendorEndpoints::default(),
            base_url: None,
            field_mapping: FieldMapping::default(),
            rate_limits: RateLimits::default(),
            features: VendorFeatures::default(),
            data_formats: DataFormats::default(),
            settings: ConnectorSettings::default(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_field_mapping(mut self, mapping: FieldMapping) -> Self {
        self.field_mapping = mapping;
        self
    }

    #[must_use]
    pub fn with_features(mut self, features: VendorFeatures) -> Self {
        self.features = features;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ConnectorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The integration shape this request describes.
    pub fn vendor_config(&self) -> VendorConfig {
        let mut endpoints = self.endpoints.clone();
        if let Some(base_url) = &self.base_url {
            endpoints.base_url = Some(base_url.clone());
        }
        VendorConfig {
            protocol: self.protocol,
            authentication: self
                .authentication
                .unwrap_or_else(|| self.credentials.credentials.mode()),
            rate_limits: self.rate_limits,
            endpoints,
            features: self.features.clone(),
            data_formats: self.data_formats.clone(),
        }
    }

    fn universal_config(&self, vendor_id: VendorId, config: VendorConfig) -> UniversalConnectorConfig {
        UniversalConnectorConfig::new(
            vendor_id,
            self.name.trim(),
            config,
            self.credentials.clone(),
        )
        .with_field_mapping(FieldMapping::standard().merged_with(&self.field_mapping))
        .with_settings(self.settings.clone())
    }
}

/// Result of [`VendorManager::connect_vendor`].
#[derive(Debug, Clone, Serialize)]
pub struct VendorConnectionOutcome {
    pub vendor_id: VendorId,
    pub registered: bool,
    pub test: VendorConnectionTest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<VendorRegistryEntry>,
}

/// Onboards and disconnects vendors against a shared registry.
#[derive(Debug, Clone)]
pub struct VendorManager {
    registry: Arc<VendorRegistry>,
    sftp_transport: Arc<dyn SftpTransport>,
}

impl VendorManager {
    pub fn new(registry: Arc<VendorRegistry>) -> Self {
        Self {
            registry,
            sftp_transport: Arc::new(SshSftpTransport),
        }
    }

    /// Use a specific transport for SFTP connection tests.
    #[must_use]
    pub fn with_sftp_transport(mut self, transport: Arc<dyn SftpTransport>) -> Self {
        self.sftp_transport = transport;
        self
    }

    pub fn registry(&self) -> &Arc<VendorRegistry> {
        &self.registry
    }

    /// Test a new vendor and register it if the test passes.
    ///
    /// A failed test is not an error: the outcome carries the diagnostics
    /// and nothing is registered. Errors are reserved for malformed requests
    /// and configurations a connector cannot be built from.
    #[instrument(skip(self, request), fields(vendor = %request.name, protocol = %request.protocol))]
    pub async fn connect_vendor(
        &self,
        request: VendorConnectionRequest,
    ) -> VendorResult<VendorConnectionOutcome> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(VendorError::invalid_request("vendor name cannot be empty"));
        }
        let base_id = VendorId::slugify(name);
        if base_id.is_empty() {
            return Err(VendorError::invalid_request(format!(
                "vendor name '{name}' has no letters or digits"
            )));
        }

        let vendor_id = self.allocate_id(&base_id);
        let config = request.vendor_config();
        let connector = UniversalConnector::with_sftp_transport(
            request.universal_config(vendor_id.clone(), config.clone()),
            Arc::clone(&self.sftp_transport),
        )?;

        let test = connector.test_connection().await;
        if !test.success {
            warn!(vendor_id = %vendor_id, errors = ?test.errors, "Connection test failed; vendor not registered");
            return Ok(VendorConnectionOutcome {
                vendor_id,
                registered: false,
                test,
                entry: None,
            });
        }

        let capabilities = VendorCapabilities::from_test(&test.details, &config.features);
        let mut entry = VendorRegistryEntry::new(vendor_id, name, request.vendor_type, config)
            .with_capabilities(capabilities)
            .with_field_mapping(request.field_mapping);
        if let Some(description) = request.description {
            entry = entry.with_description(description);
        }

        let entry = self.register_unique(&base_id, entry).await?;
        info!(vendor_id = %entry.id, "Vendor onboarded");

        Ok(VendorConnectionOutcome {
            vendor_id: entry.id.clone(),
            registered: true,
            test,
            entry: Some(entry),
        })
    }

    /// Remove an onboarded vendor. Seeded profiles cannot be removed.
    pub async fn disconnect_vendor(&self, vendor_id: &VendorId) -> VendorResult<VendorRegistryEntry> {
        let entry = self
            .registry
            .get(vendor_id)
            .ok_or_else(|| VendorError::not_found(vendor_id.as_str()))?;
        if entry.builtin {
            return Err(VendorError::invalid_request(format!(
                "built-in vendor '{vendor_id}' cannot be disconnected"
            )));
        }
        self.registry.remove(vendor_id).await
    }

    /// The slug itself if free, otherwise the slug plus a random suffix.
    fn allocate_id(&self, base: &VendorId) -> VendorId {
        if self.registry.contains(base) {
            suffixed(base)
        } else {
            base.clone()
        }
    }

    /// Register, picking a fresh suffix if a concurrent onboarding took the id.
    async fn register_unique(
        &self,
        base: &VendorId,
        mut entry: VendorRegistryEntry,
    ) -> VendorResult<VendorRegistryEntry> {
        for _ in 0..MAX_ID_ATTEMPTS {
            match self.registry.register(entry.clone()).await {
                Err(VendorError::DuplicateVendor { .. }) => entry.id = suffixed(base),
                other => return other,
            }
        }
        Err(VendorError::DuplicateVendor {
            vendor_id: entry.id.to_string(),
        })
    }
}

fn suffixed(base: &VendorId) -> VendorId {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    VendorId::new(format!("{base}_{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use supplylink_connector::credentials::VendorCredentials;
    use supplylink_connector::error::ConnectorResult;
    use supplylink_connector_universal::{SftpSession, SftpTarget};

    #[derive(Debug)]
    struct AcceptingTransport;

    struct NoopSession;

    #[async_trait]
    impl SftpSession for NoopSession {
        async fn close(self: Box<Self>) -> ConnectorResult<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl SftpTransport for AcceptingTransport {
        async fn connect(&self, _target: &SftpTarget) -> ConnectorResult<Box<dyn SftpSession>> {
            Ok(Box::new(NoopSession))
        }
    }

    fn manager() -> VendorManager {
        VendorManager::new(Arc::new(VendorRegistry::with_known_distributors()))
            .with_sftp_transport(Arc::new(AcceptingTransport))
    }

    #[test]
    fn test_request_defaults_from_json() {
        let request: VendorConnectionRequest = serde_json::from_value(json!({
            "name": "Acme Paper",
            "base_url": "https://api.acme.test",
            "credentials": {"credentials": {"auth_type": "api_key", "api_key": "k"}}
        }))
        .unwrap();

        assert_eq!(request.protocol, ProtocolType::Api);
        assert_eq!(request.vendor_type, VendorType::Universal);

        let config = request.vendor_config();
        assert_eq!(config.authentication, AuthenticationMode::ApiKey);
        assert_eq!(config.endpoints.base_url.as_deref(), Some("https://api.acme.test"));
        assert_eq!(config.endpoints.products, "/products");
        assert!(config.features.catalog);
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let request = VendorConnectionRequest::new("  ", ProtocolType::Webhook, CredentialBundle::default());
        let err = manager().connect_vendor(request).await.unwrap_err();
        assert!(matches!(err, VendorError::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn test_failed_test_registers_nothing() {
        let manager = manager();
        let before = manager.registry().stats().total;

        // Login succeeds but SFTP has no data operations to check.
        let request = VendorConnectionRequest::new(
            "Depot Files",
            ProtocolType::Sftp,
            VendorCredentials::sftp_password("sftp.depot.test", "depot", "pw"),
        );
        let outcome = manager.connect_vendor(request).await.unwrap();

        assert!(!outcome.registered);
        assert!(outcome.test.details.authentication);
        assert!(!outcome.test.success);
        assert!(outcome.entry.is_none());
        assert_eq!(manager.registry().stats().total, before);
    }

    #[tokio::test]
    async fn test_unbuildable_config_is_an_error() {
        let request = VendorConnectionRequest::new(
            "No Url",
            ProtocolType::Api,
            VendorCredentials::api_key("k"),
        );
        let err = manager().connect_vendor(request).await.unwrap_err();
        assert!(matches!(err, VendorError::Connector(_)));
    }

    #[test]
    fn test_taken_slug_gets_suffix() {
        let manager = manager();
        let id = manager.allocate_id(&VendorId::new("essendant"));

        assert!(id.as_str().starts_with("essendant_"));
        assert_eq!(id.as_str().len(), "essendant_".len() + ID_SUFFIX_LEN);
        assert_eq!(manager.allocate_id(&VendorId::new("acme")).as_str(), "acme");
    }

    #[tokio::test]
    async fn test_builtin_vendor_cannot_be_disconnected() {
        let manager = manager();
        let err = manager
            .disconnect_vendor(&VendorId::new("sp_richards"))
            .await
            .unwrap_err();
        assert!(matches!(err, VendorError::InvalidRequest { .. }));

        let err = manager
            .disconnect_vendor(&VendorId::new("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, VendorError::RegistryEntryNotFound { .. }));
    }
}
