//! # Universal Connector
//!
//! Configuration-driven vendor connector for supplylink.
//!
//! A single connector type covers any vendor whose integration can be
//! described by a [`UniversalConnectorConfig`]: protocol, credentials,
//! endpoints, rate limits and a field mapping. The protocol picks one of
//! the strategies in [`strategy`].
//!
//! ## Features
//!
//! - REST APIs with API key, OAuth2, bearer, basic or custom headers
//! - OAuth2 token acquisition, refresh-token renewal and one retry on a rejected token
//! - `{success, data}` response envelopes
//! - Per-minute/hour/day rate limiting
//! - Dot-path field mapping and per-domain transforms
//! - SSH-authenticated SFTP, EDI and webhook credential validation
//! - Multi-step connection test for onboarding
//!
//! ## Example
//!
//! ```ignore
//! use supplylink_connector::prelude::*;
//! use supplylink_connector_universal::{UniversalConnector, UniversalConnectorConfig};
//!
//! let config = UniversalConnectorConfig::new(
//!     "acme",
//!     "Acme Supply",
//!     VendorConfig::new(ProtocolType::Api, AuthenticationMode::ApiKey)
//!         .with_base_url("https://api.acme.example/v1"),
//!     VendorCredentials::api_key("my-key"),
//! );
//!
//! let connector = UniversalConnector::new(config)?;
//! let report = connector.test_connection().await;
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod connector;
pub mod rate_limit;
pub mod strategy;

// Re-exports
pub use auth::TokenCache;
pub use client::{ApiClient, ApiResponse};
pub use config::UniversalConnectorConfig;
pub use connector::UniversalConnector;
pub use rate_limit::RateLimiter;
pub use strategy::{
    ApiStrategy, EdiStrategy, ProtocolStrategy, SftpSession, SftpStrategy, SftpTarget,
    SftpTransport, SshSftpTransport, WebhookStrategy,
};
