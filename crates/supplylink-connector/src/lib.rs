//! # Vendor Connector Framework
//!
//! Core abstractions for integrating the commerce platform with supplier and
//! distributor systems.
//!
//! Vendors expose REST APIs, SFTP drops, EDI exchanges or webhooks. This crate
//! defines the pieces every connector shares, independent of protocol.
//!
//! ## Architecture
//!
//! - [`VendorConnector`](traits::VendorConnector) - the contract every connector implements
//! - [`VendorCredentials`](credentials::VendorCredentials) - auth material, one variant per mode
//! - [`VendorConfig`](config::VendorConfig) - a vendor's integration shape
//! - [`FieldMapper`](transform::FieldMapper) - vendor payloads to canonical shapes
//! - [`RetryPolicy`](retry::RetryPolicy) - exponential backoff for transient errors
//! - [`OperationContext`](context::OperationContext) - deadline and cancellation
//!
//! ## Example
//!
//! ```ignore
//! use supplylink_connector::prelude::*;
//!
//! let ctx = OperationContext::with_timeout(Duration::from_secs(120));
//! let result = connector.sync_with_context(DataDomain::Inventory, &ctx).await;
//! if !result.success {
//!     tracing::warn!(error = ?result.error, "inventory sync failed");
//! }
//! ```
//!
//! ## Crate Organization
//!
//! - [`ids`] - Type-safe identifiers (`VendorId`, `TenantId`)
//! - [`types`] - Protocol, domain and status enums
//! - [`error`] - Error types with transient/permanent classification
//! - [`credentials`] - Credential union and bundle
//! - [`config`] - Vendor configuration and connector settings
//! - [`model`] - Canonical data shapes and results
//! - [`mapping`] - Field mapping dictionaries and transforms
//! - [`transform`] - Mapping engine
//! - [`retry`] - Retry policy
//! - [`context`] - Per-operation deadline and cancellation
//! - [`traits`] - Connector contract

pub mod config;
pub mod context;
pub mod credentials;
pub mod error;
pub mod ids;
pub mod mapping;
pub mod model;
pub mod retry;
pub mod traits;
pub mod transform;
pub mod types;

/// Prelude module for convenient imports.
///
/// ```
/// use supplylink_connector::prelude::*;
/// ```
pub mod prelude {
    // IDs
    pub use crate::ids::{TenantId, VendorId};

    // Types and enums
    pub use crate::types::{
        AuthenticationMode, DataDomain, DataFormat, IntegrationMethod, ProtocolType,
        VendorStatus, VendorType,
    };

    // Error handling
    pub use crate::error::{ConnectorError, ConnectorResult};

    // Credentials and configuration
    pub use crate::config::{
        ConnectorSettings, DataFormats, RateLimits, VendorConfig, VendorEndpoints,
        VendorFeatures,
    };
    pub use crate::credentials::{CredentialBundle, SftpAuth, VendorCredentials};

    // Canonical data
    pub use crate::model::{
        Capabilities, ConnectionTestDetails, ConnectorMetadata, NewOrder, NewOrderLine,
        OrderLineItem, SyncResult, Vendor, VendorConnectionTest, VendorOrderData,
        VendorProductData,
    };

    // Mapping
    pub use crate::mapping::{DomainTransforms, FieldMapping, RecordTransform};
    pub use crate::transform::{FieldMapper, MappedBatch};

    // Resilience
    pub use crate::context::OperationContext;
    pub use crate::retry::RetryPolicy;

    // Traits
    pub use crate::traits::{
        BoxedVendorConnector, DomainSnapshot, InventoryLevels, MappedFetch, PriceList,
        VendorConnector,
    };
}

// Re-export async_trait for connector implementors
pub use async_trait::async_trait;
