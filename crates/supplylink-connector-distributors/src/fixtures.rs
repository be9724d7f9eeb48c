//! Fixture connector serving canned catalog data.
//!
//! For local development and demos. Never substituted for a live connector
//! on failure; it has to be requested explicitly.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use supplylink_connector::error::{ConnectorError, ConnectorResult};
use supplylink_connector::ids::VendorId;
use supplylink_connector::model::{
    Capabilities, ConnectorMetadata, NewOrder, OrderLineItem, VendorOrderData, VendorProductData,
};
use supplylink_connector::traits::{InventoryLevels, PriceList, VendorConnector};
use supplylink_connector::types::ProtocolType;

/// Connector backed by a fixed in-memory catalog.
#[derive(Debug)]
pub struct FixtureConnector {
    vendor_id: VendorId,
    vendor_name: String,
    products: Vec<VendorProductData>,
    orders: Vec<VendorOrderData>,
    next_order: AtomicU64,
}

impl FixtureConnector {
    /// Fixture with the default sample catalog.
    pub fn new(vendor_id: impl Into<VendorId>, vendor_name: impl Into<String>) -> Self {
        Self::with_catalog(vendor_id, vendor_name, sample_products())
    }

    pub fn with_catalog(
        vendor_id: impl Into<VendorId>,
        vendor_name: impl Into<String>,
        products: Vec<VendorProductData>,
    ) -> Self {
        Self {
            vendor_id: vendor_id.into(),
            vendor_name: vendor_name.into(),
            products,
            orders: sample_orders(),
            next_order: AtomicU64::new(1),
        }
    }

    fn matching<'a>(
        &'a self,
        skus: Option<&'a [String]>,
    ) -> impl Iterator<Item = &'a VendorProductData> + 'a {
        self.products.iter().filter(move |p| match skus {
            Some(skus) if !skus.is_empty() => skus.iter().any(|s| s == &p.sku),
            _ => true,
        })
    }
}

fn product(sku: &str, name: &str, price: Decimal, cost: Decimal, quantity: i64) -> VendorProductData {
    let mut product = VendorProductData::new(sku);
    product.name = Some(name.to_string());
    product.price = Some(price);
    product.cost = Some(cost);
    product.quantity = Some(quantity);
    product
}

/// Sample office-products catalog.
pub fn sample_products() -> Vec<VendorProductData> {
    vec![
        product("PAP-8511", "Copy Paper, Letter, 20 lb, 10 Reams", Decimal::new(4599, 2), Decimal::new(3210, 2), 240),
        product("PEN-BLK12", "Ballpoint Pens, Black, 12/Pack", Decimal::new(899, 2), Decimal::new(455, 2), 1_200),
        product("STP-747", "Desktop Stapler, 20 Sheet", Decimal::new(1749, 2), Decimal::new(980, 2), 85),
        product("TNR-26A", "Toner Cartridge, Black", Decimal::new(13999, 2), Decimal::new(10250, 2), 0),
    ]
}

fn sample_orders() -> Vec<VendorOrderData> {
    let price = Decimal::new(4599, 2);
    vec![VendorOrderData {
        order_id: "FIX-0".to_string(),
        status: Some("delivered".to_string()),
        items: vec![OrderLineItem {
            sku: "PAP-8511".to_string(),
            name: Some("Copy Paper, Letter, 20 lb, 10 Reams".to_string()),
            quantity: 2,
            price,
            total: price * Decimal::from(2),
        }],
        total_amount: price * Decimal::from(2),
        created_at: None,
    }]
}

#[async_trait]
impl VendorConnector for FixtureConnector {
    fn metadata(&self) -> ConnectorMetadata {
        ConnectorMetadata {
            vendor_id: self.vendor_id.clone(),
            vendor_name: self.vendor_name.clone(),
            protocol: ProtocolType::Api,
            version: format!("{}-fixture", env!("CARGO_PKG_VERSION")),
        }
    }

    fn capabilities(&self) -> Capabilities {
        ["products", "inventory", "pricing", "orders"]
            .into_iter()
            .map(|name| (name.to_string(), true))
            .collect()
    }

    async fn validate_credentials(&self) -> ConnectorResult<bool> {
        Ok(true)
    }

    async fn get_products(&self, skus: Option<&[String]>) -> ConnectorResult<Vec<VendorProductData>> {
        Ok(self.matching(skus).cloned().collect())
    }

    async fn get_product(&self, sku: &str) -> ConnectorResult<Option<VendorProductData>> {
        Ok(self.products.iter().find(|p| p.sku == sku).cloned())
    }

    async fn get_inventory(&self, skus: Option<&[String]>) -> ConnectorResult<InventoryLevels> {
        Ok(self
            .matching(skus)
            .map(|p| (p.sku.clone(), p.quantity.unwrap_or(0)))
            .collect())
    }

    async fn get_pricing(&self, skus: Option<&[String]>) -> ConnectorResult<PriceList> {
        Ok(self
            .matching(skus)
            .filter_map(|p| p.price.map(|price| (p.sku.clone(), price)))
            .collect())
    }

    async fn create_order(&self, order: &NewOrder) -> ConnectorResult<VendorOrderData> {
        let prices: HashMap<&str, Decimal> = self
            .products
            .iter()
            .filter_map(|p| p.price.map(|price| (p.sku.as_str(), price)))
            .collect();

        let mut items = Vec::with_capacity(order.items.len());
        for line in &order.items {
            let price = match line.price.or_else(|| prices.get(line.sku.as_str()).copied()) {
                Some(price) => price,
                None => {
                    return Err(ConnectorError::invalid_data(format!(
                        "unknown SKU {}",
                        line.sku
                    )))
                }
            };
            items.push(OrderLineItem {
                sku: line.sku.clone(),
                name: None,
                quantity: line.quantity,
                price,
                total: price * Decimal::from(line.quantity),
            });
        }

        let number = self.next_order.fetch_add(1, Ordering::Relaxed);
        debug!(vendor_id = %self.vendor_id, order = number, "Fixture order created");

        Ok(VendorOrderData {
            order_id: format!("FIX-{number}"),
            status: Some("accepted".to_string()),
            total_amount: items.iter().map(|l| l.total).sum(),
            items,
            created_at: Some(chrono::Utc::now()),
        })
    }

    async fn get_order(&self, order_id: &str) -> ConnectorResult<Option<VendorOrderData>> {
        Ok(self.orders.iter().find(|o| o.order_id == order_id).cloned())
    }

    async fn get_orders(
        &self,
        status: Option<&str>,
        limit: Option<usize>,
    ) -> ConnectorResult<Vec<VendorOrderData>> {
        Ok(self
            .orders
            .iter()
            .filter(|o| status.map_or(true, |s| o.status.as_deref() == Some(s)))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use supplylink_connector::model::NewOrderLine;

    #[tokio::test]
    async fn test_filters_by_sku() {
        let fixture = FixtureConnector::new("demo", "Demo Supply");
        let skus = vec!["STP-747".to_string()];

        let products = fixture.get_products(Some(&skus)).await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].sku, "STP-747");

        let levels = fixture.get_inventory(None).await.unwrap();
        assert_eq!(levels.get("TNR-26A"), Some(&0));
    }

    #[tokio::test]
    async fn test_create_order_prices_from_catalog() {
        let fixture = FixtureConnector::new("demo", "Demo Supply");
        let order = NewOrder::new(vec![NewOrderLine {
            sku: "PEN-BLK12".to_string(),
            quantity: 3,
            price: None,
        }]);

        let created = fixture.create_order(&order).await.unwrap();
        assert_eq!(created.order_id, "FIX-1");
        assert_eq!(created.total_amount, dec!(26.97));
    }

    #[tokio::test]
    async fn test_unknown_sku_rejected() {
        let fixture = FixtureConnector::new("demo", "Demo Supply");
        let order = NewOrder::new(vec![NewOrderLine {
            sku: "NOPE".to_string(),
            quantity: 1,
            price: None,
        }]);
        assert!(fixture.create_order(&order).await.is_err());
    }

    #[tokio::test]
    async fn test_sync_reports_full_counts() {
        let fixture = FixtureConnector::new("demo", "Demo Supply");
        let result = fixture.sync_products().await;
        assert!(result.success);
        assert_eq!(result.items_processed, 4);
        assert_eq!(result.items_total, 4);
    }
}
