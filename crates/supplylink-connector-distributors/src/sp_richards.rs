//! S.P. Richards.
//!
//! OAuth2 client-credentials API. Item fields use camelCase and line items
//! are nested under `lines`.

use supplylink_connector::config::{ConnectorSettings, RateLimits};
use supplylink_connector::credentials::CredentialBundle;
use supplylink_connector::error::ConnectorResult;
use supplylink_connector::ids::VendorId;
use supplylink_connector::mapping::{fields, FieldMapping};
use supplylink_connector::types::{AuthenticationMode, DataDomain, VendorType};

use crate::connector::DistributorConnector;
use crate::profile::DistributorProfile;

pub static PROFILE: DistributorProfile = DistributorProfile {
    vendor_type: VendorType::SpRichards,
    name: "S.P. Richards",
    authentication: AuthenticationMode::OAuth2,
    default_base_url: "https://api.sprichards.com/v1",
    token_path: Some("/oauth/token"),
    auth_path: "/account",
    products_path: "/catalog/items",
    inventory_path: "/inventory/availability",
    pricing_path: "/pricing/net",
    orders_path: "/orders",
    rate_limits: RateLimits {
        requests_per_minute: Some(120),
        requests_per_hour: None,
        requests_per_day: None,
    },
    capabilities: &[
        ("products", true),
        ("inventory", true),
        ("pricing", true),
        ("orders", true),
        ("real_time_inventory", true),
        ("real_time_pricing", false),
        ("bulk_operations", true),
        ("webhooks", false),
    ],
    field_mapping,
};

/// S.P. Richards field names.
pub fn field_mapping() -> FieldMapping {
    let products = [
        (fields::SKU, "itemNumber"),
        (fields::NAME, "description"),
        (fields::PRICE, "listPrice"),
        (fields::COST, "dealerCost"),
        (fields::QUANTITY, "quantityAvailable"),
        (fields::DESCRIPTION, "extendedDescription"),
    ];
    let inventory = [
        (fields::SKU, "itemNumber"),
        (fields::QUANTITY, "quantityAvailable"),
    ];
    let pricing = [(fields::SKU, "itemNumber"), (fields::PRICE, "netPrice")];
    let orders = [
        (fields::ORDER_ID, "orderNumber"),
        (fields::STATUS, "orderStatus"),
        (fields::ITEMS, "lines"),
        (fields::TOTAL_AMOUNT, "orderTotal"),
        (fields::CREATED_AT, "orderDate"),
        (fields::REFERENCE, "poNumber"),
        (fields::SHIP_TO, "shipTo"),
        (fields::NOTES, "comments"),
        (fields::LINE_SKU, "itemNumber"),
        (fields::LINE_NAME, "description"),
        (fields::LINE_QUANTITY, "quantityOrdered"),
        (fields::LINE_PRICE, "unitPrice"),
        (fields::LINE_TOTAL, "extendedPrice"),
    ];

    let mut mapping = FieldMapping::default();
    for (domain, pairs) in [
        (DataDomain::Products, &products[..]),
        (DataDomain::Inventory, &inventory[..]),
        (DataDomain::Pricing, &pricing[..]),
        (DataDomain::Orders, &orders[..]),
    ] {
        for (canonical, path) in pairs {
            mapping = mapping.with(domain, canonical, path);
        }
    }
    mapping
}

/// Build an S.P. Richards connector. Credentials must be `oauth2`.
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
    use serde_json::json;
    use supplylink_connector::credentials::VendorCredentials;
    use supplylink_connector::transform::FieldMapper;

    #[test]
    fn test_rejects_api_key_credentials() {
        let err = connector(
            "spr",
            VendorCredentials::api_key("k").into(),
            ConnectorSettings::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("oauth2"));
    }

    #[test]
    fn test_order_mapping() {
        let mapper = FieldMapper::new(field_mapping());
        let order = mapper
            .to_order(&json!({
                "orderNumber": "SPR-1",
                "orderStatus": "open",
                "lines": [{"itemNumber": "UNV21200", "quantityOrdered": 4, "unitPrice": "2.50"}]
            }))
            .unwrap()
            .unwrap();
        assert_eq!(order.order_id, "SPR-1");
        assert_eq!(order.items[0].sku, "UNV21200");
        assert_eq!(order.items[0].quantity, 4);
        assert_eq!(order.total_amount.to_string(), "10.00");
    }
}
