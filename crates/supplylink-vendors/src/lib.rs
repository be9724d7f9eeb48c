//! # Vendor Management
//!
//! Registry of vendor integration profiles, the factory that turns a vendor
//! record into a connector, and the onboarding flow for new vendors.
//!
//! ## Components
//!
//! - [`VendorRegistry`] - profiles keyed by vendor id, shared as `Arc<VendorRegistry>`
//! - [`ConnectorFactory`] - registry profile first, then a per-type dispatch table
//! - [`VendorManager`] - test a new vendor, register it only when the test passes
//! - [`integration_templates`] / [`wizard_steps`] - descriptive onboarding metadata
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use supplylink_connector::prelude::*;
//! use supplylink_vendors::{ConnectorFactory, VendorManager, VendorRegistry};
//!
//! let registry = Arc::new(VendorRegistry::with_known_distributors());
//! let factory = ConnectorFactory::new(Arc::clone(&registry));
//!
//! let connector = factory.create(&vendor, credentials, None)?;
//! // Registry-built connectors open their API client on validation.
//! if connector.validate_credentials().await? {
//!     let result = connector.sync_inventory().await;
//! }
//!
//! let manager = VendorManager::new(registry);
//! let outcome = manager.connect_vendor(request).await?;
//! ```

pub mod error;
pub mod factory;
pub mod onboarding;
pub mod registry;
pub mod templates;

// Re-exports
pub use error::{VendorError, VendorResult};
pub use factory::{ConnectorFactory, ConnectorKind};
pub use onboarding::{VendorConnectionOutcome, VendorConnectionRequest, VendorManager};
pub use registry::{
    ConfigOverrides, RegistryStats, VendorCapabilities, VendorRegistry, VendorRegistryEntry,
    VendorUpdate,
};
pub use templates::{
    integration_templates, wizard_steps, FieldKind, IntegrationTemplate, WizardField, WizardStep,
};
