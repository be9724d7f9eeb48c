//! Canonical data shapes
//!
//! Every connector normalizes vendor payloads into these types before
//! handing them back to the owning service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::ids::{TenantId, VendorId};
use crate::types::{DataDomain, ProtocolType, VendorStatus};

/// A product as reported by a vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorProductData {
    pub sku: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Mapped fields outside the canonical set.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, Value>,
}

impl VendorProductData {
    pub fn new(sku: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            name: None,
            price: None,
            cost: None,
            quantity: None,
            description: None,
            attributes: HashMap::new(),
        }
    }
}

/// One line of a vendor order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub sku: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub quantity: i64,
    pub price: Decimal,
    pub total: Decimal,
}

/// An order as reported by a vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorOrderData {
    pub order_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderLineItem>,
    pub total_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// One line of an order to place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub sku: String,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
}

/// An order to place with a vendor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    /// Caller's purchase-order reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub items: Vec<NewOrderLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_to: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewOrder {
    pub fn new(items: Vec<NewOrderLine>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Sum of priced lines.
    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .filter_map(|line| line.price.map(|p| p * Decimal::from(line.quantity)))
            .sum()
    }
}

/// Outcome of a bulk fetch for one data domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResult {
    pub success: bool,
    pub items_processed: usize,
    pub items_total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl SyncResult {
    /// A sync that fetched `total` records and normalized `processed` of them.
    pub fn completed(processed: usize, total: usize, data: Value) -> Self {
        Self {
            success: true,
            items_processed: processed,
            items_total: total,
            error: None,
            data: Some(data),
        }
    }

    /// A sync that failed before producing any data.
    pub fn failed(error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            items_processed: 0,
            items_total: 0,
            error: Some(error.to_string()),
            data: None,
        }
    }

    /// Whether some fetched records could not be normalized.
    pub fn is_partial(&self) -> bool {
        self.success && self.items_processed < self.items_total
    }
}

/// Per-capability outcome of a connection test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTestDetails {
    pub authentication: bool,
    pub products: bool,
    pub inventory: bool,
    pub pricing: bool,
    pub orders: bool,
}

impl ConnectionTestDetails {
    pub fn domain(&self, domain: DataDomain) -> bool {
        match domain {
            DataDomain::Products => self.products,
            DataDomain::Inventory => self.inventory,
            DataDomain::Pricing => self.pricing,
            DataDomain::Orders => self.orders,
        }
    }

    fn set_domain(&mut self, domain: DataDomain, passed: bool) {
        match domain {
            DataDomain::Products => self.products = passed,
            DataDomain::Inventory => self.inventory = passed,
            DataDomain::Pricing => self.pricing = passed,
            DataDomain::Orders => self.orders = passed,
        }
    }

    /// Whether any data domain passed.
    pub fn any_domain(&self) -> bool {
        DataDomain::all().iter().any(|d| self.domain(*d))
    }
}

/// Diagnostic result of probing a vendor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorConnectionTest {
    pub success: bool,
    pub details: ConnectionTestDetails,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl VendorConnectionTest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_authentication(&mut self, result: Result<(), String>) {
        match result {
            Ok(()) => self.details.authentication = true,
            Err(e) => {
                self.details.authentication = false;
                self.errors.push(format!("authentication: {e}"));
            }
        }
        self.refresh_success();
    }

    pub fn record_domain(&mut self, domain: DataDomain, result: Result<(), String>) {
        match result {
            Ok(()) => self.details.set_domain(domain, true),
            Err(e) => {
                self.details.set_domain(domain, false);
                self.errors.push(format!("{domain}: {e}"));
            }
        }
        self.refresh_success();
    }

    fn refresh_success(&mut self) {
        self.success = self.details.authentication && self.details.any_domain();
    }
}

/// Capability name to availability.
pub type Capabilities = BTreeMap<String, bool>;

/// Descriptive information about a connector instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorMetadata {
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub protocol: ProtocolType,
    pub version: String,
}

/// Vendor record owned by the calling service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: Uuid,
    pub tenant_id: TenantId,
    /// Vendor type key, e.g. `sp_richards` or a registry id.
    #[serde(rename = "type")]
    pub vendor_type: String,
    pub name: String,
    #[serde(default)]
    pub status: VendorStatus,
    /// Free-form settings stored alongside the record.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub settings: Value,
}

impl Vendor {
    pub fn new(tenant_id: TenantId, vendor_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            vendor_type: vendor_type.into(),
            name: name.into(),
            status: VendorStatus::Active,
            settings: Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_connection_test_requires_auth_and_one_domain() {
        let mut test = VendorConnectionTest::new();
        test.record_domain(DataDomain::Products, Ok(()));
        assert!(!test.success);

        test.record_authentication(Ok(()));
        assert!(test.success);

        let mut test = VendorConnectionTest::new();
        test.record_authentication(Ok(()));
        for domain in DataDomain::all() {
            test.record_domain(*domain, Err("HTTP 500".to_string()));
        }
        assert!(!test.success);
        assert_eq!(test.errors.len(), 4);
        assert_eq!(test.errors[0], "products: HTTP 500");
    }

    #[test]
    fn test_sync_result_partial() {
        let result = SyncResult::completed(3, 5, Value::Array(vec![]));
        assert!(result.success);
        assert!(result.is_partial());

        let result = SyncResult::failed("vendor unavailable");
        assert!(!result.success);
        assert!(!result.is_partial());
        assert_eq!(result.error.as_deref(), Some("vendor unavailable"));
    }

    #[test]
    fn test_new_order_total() {
        let order = NewOrder::new(vec![
            NewOrderLine {
                sku: "A".to_string(),
                quantity: 2,
                price: Some(dec!(4.50)),
            },
            NewOrderLine {
                sku: "B".to_string(),
                quantity: 1,
                price: None,
            },
        ]);
        assert_eq!(order.total(), dec!(9.00));
    }

    #[test]
    fn test_vendor_record_uses_type_key() {
        let vendor = Vendor::new(TenantId::new(), "essendant", "Essendant");
        let json = serde_json::to_value(&vendor).unwrap();
        assert_eq!(json["type"], "essendant");
        assert_eq!(json["status"], "active");
        assert!(json.get("settings").is_none());
    }
}
