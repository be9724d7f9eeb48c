//! # Distributor Connectors
//!
//! Connectors for named office-products distributors.
//!
//! Each distributor is a [`DistributorProfile`] (endpoints, authentication
//! mode, field names) served by the shared [`DistributorConnector`].
//!
//! ## Distributors
//!
//! - [`sp_richards`]: OAuth2 client credentials, tokens cached and renewed by the API client
//! - [`essendant`]: API key
//!
//! [`FixtureConnector`] serves a canned catalog for demos. It is never used
//! as a fallback for a failing live connector.
//!
//! ## Example
//!
//! ```ignore
//! use supplylink_connector::prelude::*;
//! use supplylink_connector_distributors::sp_richards;
//!
//! let credentials = VendorCredentials::oauth2("client-id", "client-secret");
//! let connector = sp_richards::connector("spr", credentials.into(), ConnectorSettings::default())?;
//! let products = connector.get_products(None).await?;
//! ```

pub mod connector;
pub mod essendant;
pub mod fixtures;
pub mod profile;
pub mod sp_richards;

// Re-exports
pub use connector::DistributorConnector;
pub use fixtures::FixtureConnector;
pub use profile::DistributorProfile;
