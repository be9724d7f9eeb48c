//! Vendor registry.
//!
//! In-memory catalog of vendor integration profiles. The registry is an
//! ordinary value shared as `Arc<VendorRegistry>`; there is no global.
//!
//! Writes are serialized through an async writer lock and publish a new
//! immutable map. Readers clone the current `Arc` and never wait on a
//! writer's async work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, info};

use supplylink_connector::config::{
    ConnectorSettings, DataFormats, RateLimits, VendorConfig, VendorFeatures,
};
use supplylink_connector::credentials::CredentialBundle;
use supplylink_connector::ids::VendorId;
use supplylink_connector::mapping::FieldMapping;
use supplylink_connector::model::ConnectionTestDetails;
use supplylink_connector::types::{
    AuthenticationMode, DataFormat, IntegrationMethod, ProtocolType, VendorStatus, VendorType,
};
use supplylink_connector_distributors::{essendant, sp_richards, DistributorProfile};
use supplylink_connector_universal::UniversalConnectorConfig;

use crate::error::{VendorError, VendorResult};

/// Data capabilities advertised by a registry entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorCapabilities {
    #[serde(default)]
    pub products: bool,
    #[serde(default)]
    pub inventory: bool,
    #[serde(default)]
    pub pricing: bool,
    #[serde(default)]
    pub orders: bool,
    #[serde(default)]
    pub real_time_sync: bool,
}

impl VendorCapabilities {
    /// Capabilities implied by declared features.
    pub fn from_features(features: &VendorFeatures) -> Self {
        Self {
            products: features.catalog,
            inventory: features.catalog || features.real_time_inventory,
            pricing: features.catalog || features.real_time_pricing,
            orders: features.order_management,
            real_time_sync: features.real_time_inventory || features.real_time_pricing,
        }
    }

    /// Capabilities proven by a connection test.
    pub fn from_test(details: &ConnectionTestDetails, features: &VendorFeatures) -> Self {
        Self {
            products: details.products,
            inventory: details.inventory,
            pricing: details.pricing,
            orders: details.orders,
            real_time_sync: features.real_time_inventory || features.real_time_pricing,
        }
    }

    /// Look up a capability by name. Unknown names are unsupported.
    pub fn supports(&self, capability: &str) -> bool {
        match capability {
            "products" => self.products,
            "inventory" => self.inventory,
            "pricing" => self.pricing,
            "orders" => self.orders,
            "real_time_sync" => self.real_time_sync,
            _ => false,
        }
    }
}

/// One vendor integration profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorRegistryEntry {
    pub id: VendorId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub vendor_type: VendorType,
    #[serde(default)]
    pub capabilities: VendorCapabilities,
    #[serde(default)]
    pub integration_methods: Vec<IntegrationMethod>,
    pub config: VendorConfig,
    /// Vendor-specific field names layered over the standard mapping.
    #[serde(default, skip_serializing_if = "FieldMapping::is_empty")]
    pub field_mapping: FieldMapping,
    #[serde(default)]
    pub status: VendorStatus,
    /// Seeded at startup rather than onboarded.
    #[serde(default)]
    pub builtin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VendorRegistryEntry {
    pub fn new(
        id: impl Into<VendorId>,
        name: impl Into<String>,
        vendor_type: VendorType,
        config: VendorConfig,
    ) -> Self {
        let now = Utc::now();
        let capabilities = match config.protocol {
            ProtocolType::Api | ProtocolType::Custom => {
                VendorCapabilities::from_features(&config.features)
            }
            _ => VendorCapabilities::default(),
        };
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            vendor_type,
            capabilities,
            integration_methods: vec![config.protocol.into()],
            config,
            field_mapping: FieldMapping::default(),
            status: VendorStatus::Active,
            builtin: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_capabilities(mut self, capabilities: VendorCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    #[must_use]
    pub fn with_integration_methods(mut self, methods: Vec<IntegrationMethod>) -> Self {
        self.integration_methods = methods;
        self
    }

    #[must_use]
    pub fn with_field_mapping(mut self, mapping: FieldMapping) -> Self {
        self.field_mapping = mapping;
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: VendorStatus) -> Self {
        self.status = status;
        self
    }

    fn matches(&self, needle: &str) -> bool {
        [
            self.name.as_str(),
            self.description.as_str(),
            self.vendor_type.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Partial update applied by [`VendorRegistry::update`].
#[derive(Debug, Clone, Default)]
pub struct VendorUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub capabilities: Option<VendorCapabilities>,
    pub integration_methods: Option<Vec<IntegrationMethod>>,
    pub config: Option<VendorConfig>,
    pub field_mapping: Option<FieldMapping>,
    pub status: Option<VendorStatus>,
}

/// Caller-supplied parts merged into a stored profile.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub credentials: CredentialBundle,
    pub base_url: Option<String>,
    pub rate_limits: Option<RateLimits>,
    /// Layered over the entry's mapping.
    pub field_mapping: Option<FieldMapping>,
    pub settings: Option<ConnectorSettings>,
}

impl ConfigOverrides {
    pub fn with_credentials(credentials: impl Into<CredentialBundle>) -> Self {
        Self {
            credentials: credentials.into(),
            ..Default::default()
        }
    }
}

/// Aggregate counts over the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub total: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
    pub by_integration_method: BTreeMap<String, usize>,
}

type Entries = HashMap<VendorId, VendorRegistryEntry>;

/// Catalog of vendor integration profiles.
#[derive(Debug, Default)]
pub struct VendorRegistry {
    entries: RwLock<Arc<Entries>>,
    writer: Mutex<()>,
}

impl VendorRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-seeded with the known distributor profiles.
    pub fn with_known_distributors() -> Self {
        let entries: Entries = known_distributors()
            .into_iter()
            .map(|entry| (entry.id.clone(), entry))
            .collect();
        debug!(count = entries.len(), "Seeded vendor registry");
        Self {
            entries: RwLock::new(Arc::new(entries)),
            writer: Mutex::new(()),
        }
    }

    /// Current contents. Cheap; later writes do not affect the snapshot.
    pub fn snapshot(&self) -> Arc<Entries> {
        let guard = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    fn publish(&self, entries: Entries) {
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(entries);
    }

    /// Apply `change` to a copy of the map and publish it, one writer at a time.
    async fn write<T>(
        &self,
        change: impl FnOnce(&mut Entries) -> VendorResult<T>,
    ) -> VendorResult<T> {
        let _writer = self.writer.lock().await;
        let mut next = (*self.snapshot()).clone();
        let out = change(&mut next)?;
        self.publish(next);
        Ok(out)
    }

    /// Add a new entry. Fails if the id is already registered.
    pub async fn register(&self, entry: VendorRegistryEntry) -> VendorResult<VendorRegistryEntry> {
        if entry.id.is_empty() {
            return Err(VendorError::invalid_request("vendor id cannot be empty"));
        }
        let registered = self
            .write(|entries| {
                if entries.contains_key(&entry.id) {
                    return Err(VendorError::DuplicateVendor {
                        vendor_id: entry.id.to_string(),
                    });
                }
                entries.insert(entry.id.clone(), entry.clone());
                Ok(entry)
            })
            .await?;
        info!(vendor_id = %registered.id, vendor_type = %registered.vendor_type.as_str(), "Vendor registered");
        Ok(registered)
    }

    pub fn get(&self, id: &VendorId) -> Option<VendorRegistryEntry> {
        self.snapshot().get(id).cloned()
    }

    pub fn contains(&self, id: &VendorId) -> bool {
        self.snapshot().contains_key(id)
    }

    /// Apply a partial update. `updated_at` never moves backwards.
    pub async fn update(
        &self,
        id: &VendorId,
        update: VendorUpdate,
    ) -> VendorResult<VendorRegistryEntry> {
        let updated = self
            .write(|entries| {
                let entry = entries
                    .get_mut(id)
                    .ok_or_else(|| VendorError::not_found(id.as_str()))?;
                if let Some(name) = update.name {
                    entry.name = name;
                }
                if let Some(description) = update.description {
                    entry.description = description;
                }
                if let Some(capabilities) = update.capabilities {
                    entry.capabilities = capabilities;
                }
                if let Some(methods) = update.integration_methods {
                    entry.integration_methods = methods;
                }
                if let Some(config) = update.config {
                    entry.config = config;
                }
                if let Some(mapping) = update.field_mapping {
                    entry.field_mapping = mapping;
                }
                if let Some(status) = update.status {
                    entry.status = status;
                }
                entry.updated_at = entry.updated_at.max(Utc::now());
                Ok(entry.clone())
            })
            .await?;
        debug!(vendor_id = %id, "Vendor updated");
        Ok(updated)
    }

    pub async fn set_status(
        &self,
        id: &VendorId,
        status: VendorStatus,
    ) -> VendorResult<VendorRegistryEntry> {
        self.update(
            id,
            VendorUpdate {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn remove(&self, id: &VendorId) -> VendorResult<VendorRegistryEntry> {
        let removed = self
            .write(|entries| {
                entries
                    .remove(id)
                    .ok_or_else(|| VendorError::not_found(id.as_str()))
            })
            .await?;
        info!(vendor_id = %id, "Vendor removed");
        Ok(removed)
    }

    /// All entries, ordered by id.
    pub fn list(&self) -> Vec<VendorRegistryEntry> {
        self.collect(|_| true)
    }

    pub fn list_active(&self) -> Vec<VendorRegistryEntry> {
        self.collect(|e| e.status == VendorStatus::Active)
    }

    pub fn filter_by_type(&self, vendor_type: VendorType) -> Vec<VendorRegistryEntry> {
        self.collect(|e| e.vendor_type == vendor_type)
    }

    pub fn filter_by_capability(&self, capability: &str) -> Vec<VendorRegistryEntry> {
        self.collect(|e| e.capabilities.supports(capability))
    }

    pub fn filter_by_integration_method(
        &self,
        method: IntegrationMethod,
    ) -> Vec<VendorRegistryEntry> {
        self.collect(|e| e.integration_methods.contains(&method))
    }

    /// Case-insensitive substring match over name, description and type.
    pub fn search(&self, query: &str) -> Vec<VendorRegistryEntry> {
        let needle = query.trim().to_lowercase();
        self.collect(|e| e.matches(&needle))
    }

    pub fn stats(&self) -> RegistryStats {
        let snapshot = self.snapshot();
        let mut stats = RegistryStats {
            total: snapshot.len(),
            ..Default::default()
        };
        for entry in snapshot.values() {
            *stats
                .by_type
                .entry(entry.vendor_type.as_str().to_string())
                .or_default() += 1;
            *stats
                .by_status
                .entry(entry.status.as_str().to_string())
                .or_default() += 1;
            for method in &entry.integration_methods {
                *stats
                    .by_integration_method
                    .entry(method.as_str().to_string())
                    .or_default() += 1;
            }
        }
        stats
    }

    /// Build a ready-to-use universal connector config from a stored profile.
    ///
    /// Returns `None` for an unknown id. The field mapping is the standard
    /// dictionary, then the entry's own names, then the caller's overrides.
    pub fn create_universal_connector_config(
        &self,
        id: &VendorId,
        overrides: ConfigOverrides,
    ) -> Option<UniversalConnectorConfig> {
        let entry = self.get(id)?;

        let mut config = entry.config;
        if let Some(base_url) = overrides.base_url {
            config.endpoints.base_url = Some(base_url);
        }
        if let Some(rate_limits) = overrides.rate_limits {
            config.rate_limits = rate_limits;
        }

        let mut mapping = FieldMapping::standard().merged_with(&entry.field_mapping);
        if let Some(extra) = &overrides.field_mapping {
            mapping = mapping.merged_with(extra);
        }

        Some(
            UniversalConnectorConfig::new(entry.id, entry.name, config, overrides.credentials)
                .with_field_mapping(mapping)
                .with_settings(overrides.settings.unwrap_or_default()),
        )
    }

    fn collect(&self, keep: impl Fn(&VendorRegistryEntry) -> bool) -> Vec<VendorRegistryEntry> {
        let mut entries: Vec<_> = self
            .snapshot()
            .values()
            .filter(|e| keep(e))
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }
}

fn distributor_entry(profile: &DistributorProfile, description: &str) -> VendorRegistryEntry {
    let features = VendorFeatures {
        catalog: true,
        real_time_inventory: capability(profile, "real_time_inventory"),
        real_time_pricing: capability(profile, "real_time_pricing"),
        order_management: capability(profile, "orders"),
        bulk_operations: capability(profile, "bulk_operations"),
        webhooks: capability(profile, "webhooks"),
    };
    let config = VendorConfig::new(ProtocolType::Api, profile.authentication)
        .with_endpoints(profile.endpoints())
        .with_rate_limits(profile.rate_limits)
        .with_features(features);

    let mut entry = VendorRegistryEntry::new(
        profile.vendor_type.as_str(),
        profile.name,
        profile.vendor_type,
        config,
    )
    .with_description(description)
    .with_field_mapping((profile.field_mapping)());
    entry.builtin = true;
    entry
}

fn capability(profile: &DistributorProfile, name: &str) -> bool {
    profile
        .capabilities
        .iter()
        .any(|(cap, enabled)| *cap == name && *enabled)
}

/// Profiles seeded by [`VendorRegistry::with_known_distributors`].
pub fn known_distributors() -> Vec<VendorRegistryEntry> {
    let mut synnex_config = VendorConfig::new(ProtocolType::Sftp, AuthenticationMode::SftpPassword);
    synnex_config.data_formats = DataFormats::uniform(DataFormat::Csv);
    synnex_config.features.bulk_operations = true;

    let mut synnex = VendorRegistryEntry::new(
        VendorType::Synnex.as_str(),
        "TD Synnex",
        VendorType::Synnex,
        synnex_config,
    )
    .with_description("Technology distributor exchanging catalog and order files over SFTP and EDI")
    .with_integration_methods(vec![IntegrationMethod::Sftp, IntegrationMethod::Edi])
    .with_status(VendorStatus::Testing);
    synnex.builtin = true;

    vec![
        distributor_entry(
            &sp_richards::PROFILE,
            "Wholesale office products distributor with an OAuth2 REST API",
        ),
        distributor_entry(
            &essendant::PROFILE,
            "Office, janitorial and breakroom supplies wholesaler with an API-key REST API",
        ),
        synnex,
    ]
}
