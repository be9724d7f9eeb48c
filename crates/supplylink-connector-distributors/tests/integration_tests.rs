//! Integration tests for the distributor connectors using wiremock.

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use supplylink_connector::prelude::*;
use supplylink_connector_distributors::{essendant, sp_richards};

// =============================================================================
// Test Helpers
// =============================================================================

fn settings() -> ConnectorSettings {
    ConnectorSettings::new()
        .with_retry_attempts(1)
        .with_timeout(5)
}

fn spr_credentials(server: &MockServer, access_token: &str, expires_in: Duration) -> CredentialBundle {
    CredentialBundle::new(
        VendorCredentials::oauth2("spr-client", "spr-secret")
            .with_access_token(access_token, Utc::now() + expires_in),
    )
    .with_endpoint_override(server.uri())
}

async fn mount_token(server: &MockServer, token: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": token, "expires_in": 3600, "token_type": "Bearer"})),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn spr_items() -> serde_json::Value {
    json!({"items": [
        {"itemNumber": "UNV21200", "description": "Copy Paper", "listPrice": "42.10", "quantityAvailable": 300},
        {"itemNumber": "BIC-GSM11", "description": "Pens", "listPrice": "7.25", "quantityAvailable": 50}
    ]})
}

// =============================================================================
// S.P. Richards
// =============================================================================

#[tokio::test]
async fn test_sp_richards_refreshes_token_near_expiry() {
    let server = MockServer::start().await;
    mount_token(&server, "renewed", 1).await;

    Mock::given(method("GET"))
        .and(path("/catalog/items"))
        .and(header("Authorization", "Bearer renewed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(spr_items()))
        .expect(1)
        .mount(&server)
        .await;

    // Expires inside the refresh grace window.
    let connector = sp_richards::connector(
        "spr",
        spr_credentials(&server, "expiring", Duration::seconds(20)),
        settings(),
    )
    .unwrap();

    let products = connector.get_products(None).await.unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].sku, "UNV21200");
    assert_eq!(products[0].price, Some(dec!(42.10)));
}

#[tokio::test]
async fn test_sp_richards_reauthenticates_once_on_401() {
    let server = MockServer::start().await;
    mount_token(&server, "renewed", 1).await;

    Mock::given(method("GET"))
        .and(path("/inventory/availability"))
        .and(header("Authorization", "Bearer revoked"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "invalid_token"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/inventory/availability"))
        .and(header("Authorization", "Bearer renewed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"itemNumber": "UNV21200", "quantityAvailable": 300}
        ])))
        .expect(3)
        .mount(&server)
        .await;

    let connector = sp_richards::connector(
        "spr",
        spr_credentials(&server, "revoked", Duration::hours(1)),
        settings(),
    )
    .unwrap();

    let (a, b, c) = tokio::join!(
        connector.get_inventory(None),
        connector.get_inventory(None),
        connector.get_inventory(None)
    );
    for levels in [a, b, c] {
        assert_eq!(levels.unwrap().get("UNV21200"), Some(&300));
    }
}

#[tokio::test]
async fn test_sp_richards_validate_credentials() {
    let server = MockServer::start().await;
    mount_token(&server, "fresh", 1).await;

    Mock::given(method("GET"))
        .and(path("/account"))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accountNumber": "A-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let bundle = CredentialBundle::new(VendorCredentials::oauth2("spr-client", "spr-secret"))
        .with_endpoint_override(server.uri());
    let connector = sp_richards::connector("spr", bundle, settings()).unwrap();

    assert!(connector.validate_credentials().await.unwrap());
}

#[tokio::test]
async fn test_sp_richards_rejected_client_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "invalid_client"})))
        .mount(&server)
        .await;

    let bundle = CredentialBundle::new(VendorCredentials::oauth2("spr-client", "wrong"))
        .with_endpoint_override(server.uri());
    let connector = sp_richards::connector("spr", bundle, settings()).unwrap();

    assert!(!connector.validate_credentials().await.unwrap());
}

#[tokio::test]
async fn test_sp_richards_failure_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/catalog/items"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let connector = sp_richards::connector(
        "spr",
        spr_credentials(&server, "valid", Duration::hours(1)),
        settings(),
    )
    .unwrap();

    let err = connector.get_products(None).await.unwrap_err();
    assert!(err.is_transient());

    let result = connector.sync_products().await;
    assert!(!result.success);
    assert!(result.data.is_none());
}

// =============================================================================
// Essendant
// =============================================================================

#[tokio::test]
async fn test_essendant_pricing_with_sku_filter() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pricing"))
        .and(header("X-API-Key", "ess-key"))
        .and(query_param("skus", "ESS-1,ESS-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                {"item_id": "ESS-1", "contract_price": 3.15},
                {"item_id": "ESS-2", "contract_price": "12.00"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let bundle = CredentialBundle::new(VendorCredentials::api_key("ess-key"))
        .with_endpoint_override(server.uri());
    let connector = essendant::connector("ess", bundle, settings()).unwrap();

    let skus = vec!["ESS-1".to_string(), "ESS-2".to_string()];
    let prices = connector.get_pricing(Some(&skus)).await.unwrap();
    assert_eq!(prices.get("ESS-1"), Some(&dec!(3.15)));
    assert_eq!(prices.get("ESS-2"), Some(&dec!(12.00)));
}

#[tokio::test]
async fn test_essendant_create_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(wiremock::matchers::body_partial_json(json!({
            "po_number": "PO-5",
            "line_items": [{"item_id": "ESS-1", "qty": 10}]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "order_number": "E-778",
            "status": "received",
            "order_total": "31.50"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let bundle = CredentialBundle::new(VendorCredentials::api_key("ess-key"))
        .with_endpoint_override(server.uri());
    let connector = essendant::connector("ess", bundle, settings()).unwrap();

    let order = NewOrder::new(vec![NewOrderLine {
        sku: "ESS-1".to_string(),
        quantity: 10,
        price: None,
    }])
    .with_reference("PO-5");
    let created = connector.create_order(&order).await.unwrap();

    assert_eq!(created.order_id, "E-778");
    assert_eq!(created.total_amount, dec!(31.50));
}

#[tokio::test]
async fn test_essendant_unknown_order_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders/E-000"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let bundle = CredentialBundle::new(VendorCredentials::api_key("ess-key"))
        .with_endpoint_override(server.uri());
    let connector = essendant::connector("ess", bundle, settings()).unwrap();

    assert!(connector.get_order("E-000").await.unwrap().is_none());
}
