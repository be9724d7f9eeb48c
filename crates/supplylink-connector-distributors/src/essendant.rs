//! Essendant.
//!
//! API-key REST API with snake_case fields.

use supplylink_connector::config::{ConnectorSettings, RateLimits};
use supplylink_connector::credentials::CredentialBundle;
use supplylink_connector::error::ConnectorResult;
use supplylink_connector::ids::VendorId;
use supplylink_connector::mapping::{fields, FieldMapping};
use supplylink_connector::types::{AuthenticationMode, DataDomain, VendorType};

use crate::connector::DistributorConnector;
use crate::profile::DistributorProfile;

pub static PROFILE: DistributorProfile = DistributorProfile {
    vendor_type: VendorType::Essendant,
    name: "Essendant",
    authentication: AuthenticationMode::ApiKey,
    default_base_url: "https://api.essendant.com/v2",
    token_path: None,
    auth_path: "/auth/verify",
    products_path: "/products",
    inventory_path: "/inventory",
    pricing_path: "/pricing",
    orders_path: "/orders",
    rate_limits: RateLimits {
        requests_per_minute: Some(60),
        requests_per_hour: None,
        requests_per_day: Some(5_000),
    },
    capabilities: &[
        ("products", true),
        ("inventory", true),
        ("pricing", true),
        ("orders", true),
        ("real_time_inventory", false),
        ("real_time_pricing", false),
        ("bulk_operations", false),
        ("webhooks", false),
    ],
    field_mapping,
};

/// Essendant field names.
pub fn field_mapping() -> FieldMapping {
    FieldMapping::standard()
        .with(DataDomain::Products, fields::SKU, "item_id")
        .with(DataDomain::Products, fields::NAME, "item_name")
        .with(DataDomain::Products, fields::PRICE, "list_price")
        .with(DataDomain::Products, fields::COST, "net_cost")
        .with(DataDomain::Products, fields::QUANTITY, "qty_available")
        .with(DataDomain::Inventory, fields::SKU, "item_id")
        .with(DataDomain::Inventory, fields::QUANTITY, "qty_available")
        .with(DataDomain::Pricing, fields::SKU, "item_id")
        .with(DataDomain::Pricing, fields::PRICE, "contract_price")
        .with(DataDomain::Orders, fields::ORDER_ID, "order_number")
        .with(DataDomain::Orders, fields::ITEMS, "line_items")
        .with(DataDomain::Orders, fields::TOTAL_AMOUNT, "order_total")
        .with(DataDomain::Orders, fields::REFERENCE, "po_number")
        .with(DataDomain::Orders, fields::LINE_SKU, "item_id")
        .with(DataDomain::Orders, fields::LINE_NAME, "item_name")
        .with(DataDomain::Orders, fields::LINE_QUANTITY, "qty")
        .with(DataDomain::Orders, fields::LINE_PRICE, "unit_price")
        .with(DataDomain::Orders, fields::LINE_TOTAL, "extended_price")
}

/// Build an Essendant connector. Credentials must be `api_key`.
pub fn connector(
    vendor_id: impl Into<VendorId>,
    credentials: CredentialBundle,
    settings: ConnectorSettings,
) -> ConnectorResult<DistributorConnector> {
    DistributorConnector::new(&PROFILE, vendor_id, credentials, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use supplylink_connector::credentials::VendorCredentials;
    use supplylink_connector::transform::FieldMapper;

    #[test]
    fn test_product_mapping() {
        let mapper = FieldMapper::new(field_mapping());
        let product = mapper
            .to_product(&json!({
                "item_id": "ESS-100",
                "item_name": "Copy Paper",
                "list_price": 45.99,
                "qty_available": 120
            }))
            .unwrap()
            .unwrap();
        assert_eq!(product.sku, "ESS-100");
        assert_eq!(product.price, Some(dec!(45.99)));
        assert_eq!(product.quantity, Some(120));
    }

    #[test]
    fn test_rejects_oauth_credentials() {
        assert!(connector(
            "ess",
            VendorCredentials::oauth2("id", "secret").into(),
            ConnectorSettings::default(),
        )
        .is_err());
    }

    #[test]
    fn test_endpoint_override_replaces_base_url() {
        let bundle = CredentialBundle::new(VendorCredentials::api_key("k"))
            .with_endpoint_override("https://sandbox.essendant.test");
        let connector = connector("ess", bundle, ConnectorSettings::default()).unwrap();
        assert!(format!("{connector:?}").contains("sandbox.essendant.test"));
    }
}
