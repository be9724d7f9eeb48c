//! Connector factory.
//!
//! Turns a vendor record plus credentials into a [`BoxedVendorConnector`].
//! A registry profile always wins; otherwise the vendor type selects a
//! connector from a fixed dispatch table.

use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use supplylink_connector::config::{ConnectorSettings, VendorConfig};
use supplylink_connector::credentials::{CredentialBundle, VendorCredentials};
use supplylink_connector::ids::VendorId;
use supplylink_connector::mapping::FieldMapping;
use supplylink_connector::model::Vendor;
use supplylink_connector::traits::BoxedVendorConnector;
use supplylink_connector::types::{ProtocolType, VendorType};
use supplylink_connector_distributors::{essendant, sp_richards, FixtureConnector};
use supplylink_connector_universal::{UniversalConnector, UniversalConnectorConfig};

use crate::error::{VendorError, VendorResult};
use crate::registry::{ConfigOverrides, VendorRegistry};

/// Vendor setting that opts into the demo catalog.
pub const USE_FIXTURE_DATA: &str = "use_fixture_data";

/// What the fixed dispatch table builds for a vendor type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorKind {
    SpRichards,
    Essendant,
    /// Universal connector configured from the vendor record.
    Universal,
    /// Known distributor without a connector.
    NotYetImplemented,
}

impl ConnectorKind {
    pub fn for_vendor_type(vendor_type: VendorType) -> Self {
        match vendor_type {
            VendorType::SpRichards => ConnectorKind::SpRichards,
            VendorType::Essendant => ConnectorKind::Essendant,
            VendorType::Synnex | VendorType::Universal | VendorType::Other => {
                ConnectorKind::Universal
            }
            VendorType::IngramMicro => ConnectorKind::NotYetImplemented,
        }
    }
}

/// Builds connectors for vendor records.
#[derive(Debug, Clone)]
pub struct ConnectorFactory {
    registry: Arc<VendorRegistry>,
}

impl ConnectorFactory {
    pub fn new(registry: Arc<VendorRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<VendorRegistry> {
        &self.registry
    }

    /// Build a connector for `vendor`.
    ///
    /// Resolution order: the `use_fixture_data` opt-in, a registry profile
    /// keyed by the vendor type, then the dispatch table.
    pub fn create(
        &self,
        vendor: &Vendor,
        credentials: CredentialBundle,
        settings: Option<ConnectorSettings>,
    ) -> VendorResult<BoxedVendorConnector> {
        let settings = settings.unwrap_or_default();
        let parsed_type = VendorType::from_str(&vendor.vendor_type).ok();
        let registry_id = match parsed_type {
            Some(vendor_type) => VendorId::new(vendor_type.as_str()),
            None => VendorId::new(vendor.vendor_type.as_str()),
        };

        if fixture_requested(&vendor.settings) {
            info!(vendor = %vendor.id, "Serving fixture data by request");
            return Ok(Box::new(FixtureConnector::new(registry_id, vendor.name.clone())));
        }

        let overrides = ConfigOverrides {
            credentials: credentials.clone(),
            settings: Some(settings.clone()),
            ..Default::default()
        };
        if let Some(config) = self
            .registry
            .create_universal_connector_config(&registry_id, overrides)
        {
            debug!(vendor = %vendor.id, registry_id = %registry_id, "Using registry profile");
            return Ok(Box::new(UniversalConnector::new(config)?));
        }

        let vendor_type = parsed_type.ok_or_else(|| VendorError::UnsupportedVendorType {
            vendor_type: vendor.vendor_type.clone(),
        })?;

        match ConnectorKind::for_vendor_type(vendor_type) {
            ConnectorKind::SpRichards => Ok(Box::new(sp_richards::connector(
                registry_id,
                credentials,
                settings,
            )?)),
            ConnectorKind::Essendant => Ok(Box::new(essendant::connector(
                registry_id,
                credentials,
                settings,
            )?)),
            ConnectorKind::Universal => {
                let config = adhoc_config(vendor, credentials, settings)?;
                Ok(Box::new(UniversalConnector::new(config)?))
            }
            ConnectorKind::NotYetImplemented => {
                warn!(vendor = %vendor.id, vendor_type = %vendor_type.as_str(), "No connector for vendor type");
                Err(VendorError::NotYetImplemented {
                    vendor_type: vendor_type.as_str().to_string(),
                })
            }
        }
    }
}

fn fixture_requested(settings: &Value) -> bool {
    settings
        .get(USE_FIXTURE_DATA)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Protocol implied by the credential shape when no config is stored.
fn protocol_for(credentials: &VendorCredentials) -> ProtocolType {
    match credentials {
        VendorCredentials::Sftp { .. } => ProtocolType::Sftp,
        VendorCredentials::Edi { .. } => ProtocolType::Edi,
        _ => ProtocolType::Api,
    }
}

/// Universal config from the record's `settings.config` and
/// `settings.field_mapping`, falling back to the credential shape.
fn adhoc_config(
    vendor: &Vendor,
    credentials: CredentialBundle,
    settings: ConnectorSettings,
) -> VendorResult<UniversalConnectorConfig> {
    let config = match vendor.settings.get("config") {
        Some(raw) => serde_json::from_value::<VendorConfig>(raw.clone()).map_err(|e| {
            VendorError::invalid_request(format!("vendor settings.config is invalid: {e}"))
        })?,
        None => VendorConfig::new(
            protocol_for(&credentials.credentials),
            credentials.credentials.mode(),
        ),
    };

    let mut mapping = FieldMapping::standard();
    if let Some(raw) = vendor.settings.get("field_mapping") {
        let custom = serde_json::from_value::<FieldMapping>(raw.clone()).map_err(|e| {
            VendorError::invalid_request(format!("vendor settings.field_mapping is invalid: {e}"))
        })?;
        mapping = mapping.merged_with(&custom);
    }

    let slug = VendorId::slugify(&vendor.name);
    let vendor_id = if slug.is_empty() {
        VendorId::new(vendor.id.to_string())
    } else {
        slug
    };

    Ok(
        UniversalConnectorConfig::new(vendor_id, vendor.name.clone(), config, credentials)
            .with_field_mapping(mapping)
            .with_settings(settings),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::registry::VendorRegistryEntry;
    use supplylink_connector::ids::TenantId;
    use supplylink_connector::traits::VendorConnector;
    use supplylink_connector::types::AuthenticationMode;

    fn factory(registry: VendorRegistry) -> ConnectorFactory {
        ConnectorFactory::new(Arc::new(registry))
    }

    fn vendor(vendor_type: &str) -> Vendor {
        Vendor::new(TenantId::new(), vendor_type, "Test Vendor")
    }

    #[test]
    fn test_dispatch_table() {
        assert_eq!(
            ConnectorKind::for_vendor_type(VendorType::SpRichards),
            ConnectorKind::SpRichards
        );
        assert_eq!(
            ConnectorKind::for_vendor_type(VendorType::Other),
            ConnectorKind::Universal
        );
        assert_eq!(
            ConnectorKind::for_vendor_type(VendorType::IngramMicro),
            ConnectorKind::NotYetImplemented
        );
    }

    #[tokio::test]
    async fn test_registry_profile_takes_precedence() {
        let registry = VendorRegistry::new();
        let config = VendorConfig::new(ProtocolType::Webhook, AuthenticationMode::None)
            .with_base_url("https://hooks.essendant.test");
        registry
            .register(VendorRegistryEntry::new(
                "essendant",
                "Essendant (registry)",
                VendorType::Essendant,
                config,
            ))
            .await
            .unwrap();

        let connector = factory(registry)
            .create(&vendor("essendant"), CredentialBundle::default(), None)
            .unwrap();

        let metadata = connector.metadata();
        assert_eq!(metadata.vendor_name, "Essendant (registry)");
        assert_eq!(metadata.protocol, ProtocolType::Webhook);
    }

    #[test]
    fn test_seeded_profile_builds_universal_connector() {
        let factory = factory(VendorRegistry::with_known_distributors());
        let connector = factory
            .create(&vendor("sp-richards"), VendorCredentials::oauth2("id", "secret").into(), None)
            .unwrap();
        assert_eq!(connector.metadata().vendor_id.as_str(), "sp_richards");
        assert_eq!(connector.metadata().version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_dispatch_table_without_registry() {
        let factory = factory(VendorRegistry::new());
        let connector = factory
            .create(
                &vendor("sp_richards"),
                VendorCredentials::oauth2("id", "secret").into(),
                None,
            )
            .unwrap();
        assert_eq!(connector.metadata().vendor_name, "S.P. Richards");
    }

    #[test]
    fn test_not_yet_implemented() {
        let factory = factory(VendorRegistry::with_known_distributors());
        let err = factory
            .create(&vendor("ingram-micro"), CredentialBundle::default(), None)
            .err().unwrap();
        assert!(matches!(err, VendorError::NotYetImplemented { .. }));
    }

    #[test]
    fn test_unknown_vendor_type() {
        let factory = factory(VendorRegistry::new());
        let err = factory
            .create(&vendor("acme_widgets"), CredentialBundle::default(), None)
            .err().unwrap();
        assert!(matches!(err, VendorError::UnsupportedVendorType { .. }));
        assert_eq!(err.error_code(), "UNSUPPORTED_VENDOR_TYPE");
    }

    #[test]
    fn test_adhoc_universal_from_settings() {
        let factory = factory(VendorRegistry::new());
        let mut record = vendor("universal");
        record.settings = json!({
            "config": {
                "type": "api",
                "authentication": "bearer",
                "endpoints": {"base_url": "https://api.vendor.test", "products": "/v2/items"}
            },
            "field_mapping": {"products": {"sku": "item.code"}}
        });

        let connector = factory
            .create(&record, VendorCredentials::bearer("t").into(), None)
            .unwrap();
        assert_eq!(connector.metadata().vendor_id.as_str(), "test_vendor");
        assert_eq!(connector.metadata().protocol, ProtocolType::Api);
    }

    #[test]
    fn test_adhoc_universal_from_credentials_alone() {
        let factory = factory(VendorRegistry::new());
        let connector = factory
            .create(
                &vendor("other"),
                VendorCredentials::sftp_password("sftp.vendor.test", "u", "p").into(),
                None,
            )
            .unwrap();
        assert_eq!(connector.metadata().protocol, ProtocolType::Sftp);
        assert_eq!(connector.capabilities().get("products"), Some(&false));
    }

    #[test]
    fn test_invalid_settings_config_rejected() {
        let factory = factory(VendorRegistry::new());
        let mut record = vendor("universal");
        record.settings = json!({"config": {"type": "carrier-pigeon"}});

        let err = factory
            .create(&record, CredentialBundle::default(), None)
            .err().unwrap();
        assert!(matches!(err, VendorError::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn test_fixture_only_on_request() {
        let factory = factory(VendorRegistry::with_known_distributors());
        let mut record = vendor("essendant");
        record.settings = json!({"use_fixture_data": true});

        let connector = factory
            .create(&record, CredentialBundle::default(), None)
            .unwrap();
        assert!(connector.metadata().version.ends_with("-fixture"));
        assert_eq!(connector.get_products(None).await.unwrap().len(), 4);
    }

    #[test]
    fn test_credentials_mismatch_surfaces_as_connector_error() {
        let factory = factory(VendorRegistry::new());
        let err = factory
            .create(
                &vendor("essendant"),
                VendorCredentials::basic("u", "p").into(),
                None,
            )
            .err().unwrap();
        assert!(matches!(err, VendorError::Connector(_)));
        assert!(err.is_configuration());
    }
}
