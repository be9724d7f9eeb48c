//! Static description of a distributor's REST API.

use supplylink_connector::config::{RateLimits, VendorEndpoints};
use supplylink_connector::mapping::FieldMapping;
use supplylink_connector::model::Capabilities;
use supplylink_connector::types::{AuthenticationMode, VendorType};

/// Endpoints, auth mode, request budget and field names of one distributor.
#[derive(Debug, Clone, Copy)]
pub struct DistributorProfile {
    pub vendor_type: VendorType,
    pub name: &'static str,
    pub authentication: AuthenticationMode,
    pub default_base_url: &'static str,
    /// OAuth2 token path relative to the base URL, for token-based distributors.
    pub token_path: Option<&'static str>,
    pub auth_path: &'static str,
    pub products_path: &'static str,
    pub inventory_path: &'static str,
    pub pricing_path: &'static str,
    pub orders_path: &'static str,
    /// Published request budget.
    pub rate_limits: RateLimits,
    pub capabilities: &'static [(&'static str, bool)],
    pub field_mapping: fn() -> FieldMapping,
}

impl DistributorProfile {
    pub fn endpoints(&self) -> VendorEndpoints {
        VendorEndpoints {
            base_url: Some(self.default_base_url.to_string()),
            products: self.products_path.to_string(),
            inventory: self.inventory_path.to_string(),
            pricing: self.pricing_path.to_string(),
            orders: self.orders_path.to_string(),
            auth: self.auth_path.to_string(),
            token: self.token_path.map(str::to_string),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
            .iter()
            .map(|(name, enabled)| ((*name).to_string(), *enabled))
            .collect()
    }
}
