//! Vendor connector contract
//!
//! The operation set every connector implements, whatever protocol sits
//! underneath.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::context::OperationContext;
use crate::error::ConnectorResult;
use crate::model::{
    Capabilities, ConnectorMetadata, NewOrder, SyncResult, VendorOrderData, VendorProductData,
};
use crate::transform::MappedBatch;
use crate::types::DataDomain;

/// Inventory levels keyed by SKU.
pub type InventoryLevels = HashMap<String, i64>;

/// Prices keyed by SKU.
pub type PriceList = HashMap<String, Decimal>;

/// Normalized data for one domain plus how many raw records produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainSnapshot {
    pub data: Value,
    pub processed: usize,
    pub total: usize,
}

impl DomainSnapshot {
    /// Snapshot where every fetched record was kept.
    pub fn complete(data: Value, count: usize) -> Self {
        Self {
            data,
            processed: count,
            total: count,
        }
    }
}

/// Per-domain fetches that keep the raw record count, shared by the
/// REST-backed connectors.
#[async_trait]
pub trait MappedFetch: Send + Sync {
    async fn products_in(
        &self,
        skus: Option<&[String]>,
        ctx: &OperationContext,
    ) -> ConnectorResult<MappedBatch<VendorProductData>>;

    async fn inventory_in(
        &self,
        skus: Option<&[String]>,
        ctx: &OperationContext,
    ) -> ConnectorResult<MappedBatch<(String, i64)>>;

    async fn pricing_in(
        &self,
        skus: Option<&[String]>,
        ctx: &OperationContext,
    ) -> ConnectorResult<MappedBatch<(String, Decimal)>>;

    /// Orders, capped at `limit` even when the vendor ignores it.
    async fn orders_in(
        &self,
        status: Option<&str>,
        limit: Option<usize>,
        ctx: &OperationContext,
    ) -> ConnectorResult<MappedBatch<VendorOrderData>>;

    /// Whole-domain snapshot for a sync.
    async fn snapshot(
        &self,
        domain: DataDomain,
        ctx: &OperationContext,
    ) -> ConnectorResult<DomainSnapshot> {
        match domain {
            DataDomain::Products => self.products_in(None, ctx).await?.into_snapshot(),
            DataDomain::Inventory => self.inventory_in(None, ctx).await?.into_keyed_snapshot(),
            DataDomain::Pricing => self.pricing_in(None, ctx).await?.into_keyed_snapshot(),
            DataDomain::Orders => self.orders_in(None, None, ctx).await?.into_snapshot(),
        }
    }
}

/// `skus=A,B` filter; empty when no SKUs are given.
pub fn sku_query(skus: Option<&[String]>) -> Vec<(String, String)> {
    match skus {
        Some(skus) if !skus.is_empty() => vec![("skus".to_string(), skus.join(","))],
        _ => Vec::new(),
    }
}

/// `status` and `limit` filters for order listings.
pub fn orders_query(status: Option<&str>, limit: Option<usize>) -> Vec<(String, String)> {
    let mut query = Vec::new();
    if let Some(status) = status {
        query.push(("status".to_string(), status.to_string()));
    }
    if let Some(limit) = limit {
        query.push(("limit".to_string(), limit.to_string()));
    }
    query
}

/// A connector to one vendor.
///
/// Fetch operations propagate errors. Single-item fetches return `Ok(None)`
/// when the vendor does not know the item. Sync operations never fail: the
/// outcome is captured in the returned [`SyncResult`].
#[async_trait]
pub trait VendorConnector: Send + Sync {
    /// Describe this connector instance.
    fn metadata(&self) -> ConnectorMetadata;

    /// Capabilities keyed by name (`products`, `inventory`, `orders`, ...).
    fn capabilities(&self) -> Capabilities;

    /// Check the credentials against the vendor.
    ///
    /// `Ok(false)` means the vendor rejected them; `Err` means the check
    /// itself could not be performed.
    async fn validate_credentials(&self) -> ConnectorResult<bool>;

    /// Fetch products, optionally restricted to `skus`.
    async fn get_products(&self, skus: Option<&[String]>) -> ConnectorResult<Vec<VendorProductData>>;

    /// Fetch one product.
    async fn get_product(&self, sku: &str) -> ConnectorResult<Option<VendorProductData>>;

    /// Fetch inventory levels, optionally restricted to `skus`.
    async fn get_inventory(&self, skus: Option<&[String]>) -> ConnectorResult<InventoryLevels>;

    /// Fetch prices, optionally restricted to `skus`.
    async fn get_pricing(&self, skus: Option<&[String]>) -> ConnectorResult<PriceList>;

    /// Place an order.
    async fn create_order(&self, order: &NewOrder) -> ConnectorResult<VendorOrderData>;

    /// Fetch one order.
    async fn get_order(&self, order_id: &str) -> ConnectorResult<Option<VendorOrderData>>;

    /// Fetch orders, optionally filtered by status and capped at `limit`.
    async fn get_orders(
        &self,
        status: Option<&str>,
        limit: Option<usize>,
    ) -> ConnectorResult<Vec<VendorOrderData>>;

    /// Fetch a whole domain for a sync.
    ///
    /// Connectors that can tell how many raw records were dropped during
    /// normalization override this to report it.
    async fn fetch_domain(
        &self,
        domain: DataDomain,
        ctx: &OperationContext,
    ) -> ConnectorResult<DomainSnapshot> {
        match domain {
            DataDomain::Products => {
                let items = ctx.run(self.get_products(None)).await?;
                Ok(DomainSnapshot::complete(serde_json::to_value(&items)?, items.len()))
            }
            DataDomain::Inventory => {
                let levels = ctx.run(self.get_inventory(None)).await?;
                Ok(DomainSnapshot::complete(serde_json::to_value(&levels)?, levels.len()))
            }
            DataDomain::Pricing => {
                let prices = ctx.run(self.get_pricing(None)).await?;
                Ok(DomainSnapshot::complete(serde_json::to_value(&prices)?, prices.len()))
            }
            DataDomain::Orders => {
                let orders = ctx.run(self.get_orders(None, None)).await?;
                Ok(DomainSnapshot::complete(serde_json::to_value(&orders)?, orders.len()))
            }
        }
    }

    /// Sync one domain under a caller deadline / cancellation token.
    async fn sync_with_context(&self, domain: DataDomain, ctx: &OperationContext) -> SyncResult {
        let vendor_id = self.metadata().vendor_id;
        match self.fetch_domain(domain, ctx).await {
            Ok(snapshot) => {
                if snapshot.processed < snapshot.total {
                    warn!(
                        vendor_id = %vendor_id,
                        domain = %domain,
                        processed = snapshot.processed,
                        total = snapshot.total,
                        "Sync completed with skipped records"
                    );
                } else {
                    info!(
                        vendor_id = %vendor_id,
                        domain = %domain,
                        processed = snapshot.processed,
                        "Sync completed"
                    );
                }
                SyncResult::completed(snapshot.processed, snapshot.total, snapshot.data)
            }
            Err(e) => {
                warn!(
                    vendor_id = %vendor_id,
                    domain = %domain,
                    error_code = e.error_code(),
                    error = %e,
                    "Sync failed"
                );
                SyncResult::failed(e)
            }
        }
    }

    async fn sync_products(&self) -> SyncResult {
        self.sync_with_context(DataDomain::Products, &OperationContext::new())
            .await
    }

    async fn sync_inventory(&self) -> SyncResult {
        self.sync_with_context(DataDomain::Inventory, &OperationContext::new())
            .await
    }

    async fn sync_pricing(&self) -> SyncResult {
        self.sync_with_context(DataDomain::Pricing, &OperationContext::new())
            .await
    }

    async fn sync_orders(&self) -> SyncResult {
        self.sync_with_context(DataDomain::Orders, &OperationContext::new())
            .await
    }
}

/// Boxed connector for dynamic dispatch.
pub type BoxedVendorConnector = Box<dyn VendorConnector>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConnectorError;
    use crate::ids::VendorId;
    use crate::types::ProtocolType;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    /// Connector with canned data whose inventory call can be made to fail.
    struct StaticConnector {
        fail_inventory: AtomicBool,
    }

    impl StaticConnector {
        fn new() -> Self {
            Self {
                fail_inventory: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl VendorConnector for StaticConnector {
        fn metadata(&self) -> ConnectorMetadata {
            ConnectorMetadata {
                vendor_id: VendorId::new("static"),
                vendor_name: "Static".to_string(),
                protocol: ProtocolType::Api,
                version: "test".to_string(),
            }
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::new()
        }

        async fn validate_credentials(&self) -> ConnectorResult<bool> {
            Ok(true)
        }

        async fn get_products(
            &self,
            _skus: Option<&[String]>,
        ) -> ConnectorResult<Vec<VendorProductData>> {
            Ok(vec![VendorProductData::new("A"), VendorProductData::new("B")])
        }

        async fn get_product(&self, sku: &str) -> ConnectorResult<Option<VendorProductData>> {
            Ok((sku == "A").then(|| VendorProductData::new("A")))
        }

        async fn get_inventory(&self, _skus: Option<&[String]>) -> ConnectorResult<InventoryLevels> {
            if self.fail_inventory.load(Ordering::SeqCst) {
                return Err(ConnectorError::network("connection reset"));
            }
            Ok(HashMap::from([("A".to_string(), 3)]))
        }

        async fn get_pricing(&self, _skus: Option<&[String]>) -> ConnectorResult<PriceList> {
            Ok(PriceList::new())
        }

        async fn create_order(&self, _order: &NewOrder) -> ConnectorResult<VendorOrderData> {
            Err(ConnectorError::unsupported(ProtocolType::Api, "create_order"))
        }

        async fn get_order(&self, _order_id: &str) -> ConnectorResult<Option<VendorOrderData>> {
            Ok(None)
        }

        async fn get_orders(
            &self,
            _status: Option<&str>,
            _limit: Option<usize>,
        ) -> ConnectorResult<Vec<VendorOrderData>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_sync_drives_fetch() {
        let connector = StaticConnector::new();
        let result = connector.sync_products().await;
        assert!(result.success);
        assert_eq!(result.items_processed, 2);
        assert_eq!(result.items_total, 2);
        assert_eq!(result.data.unwrap()[1]["sku"], "B");
    }

    #[tokio::test]
    async fn test_sync_captures_errors() {
        let connector = StaticConnector::new();
        connector.fail_inventory.store(true, Ordering::SeqCst);

        let result = connector.sync_inventory().await;
        assert!(!result.success);
        assert_eq!(result.items_processed, 0);
        assert_eq!(
            result.error.as_deref(),
            Some("network error: connection reset")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_with_context_aborts_hung_fetch() {
        let connector = StaticConnector::new();
        let ctx = OperationContext::with_timeout(Duration::from_secs(5));

        let result = connector.sync_with_context(DataDomain::Orders, &ctx).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("operation deadline exceeded"));
    }

    /// Source whose records lost one entry per domain during mapping.
    struct LossySource;

    #[async_trait]
    impl MappedFetch for LossySource {
        async fn products_in(
            &self,
            _skus: Option<&[String]>,
            _ctx: &OperationContext,
        ) -> ConnectorResult<MappedBatch<VendorProductData>> {
            Ok(MappedBatch {
                items: vec![VendorProductData::new("A")],
                total: 2,
            })
        }

        async fn inventory_in(
            &self,
            _skus: Option<&[String]>,
            _ctx: &OperationContext,
        ) -> ConnectorResult<MappedBatch<(String, i64)>> {
            Ok(MappedBatch {
                items: vec![("A".to_string(), 7)],
                total: 2,
            })
        }

        async fn pricing_in(
            &self,
            _skus: Option<&[String]>,
            _ctx: &OperationContext,
        ) -> ConnectorResult<MappedBatch<(String, Decimal)>> {
            Ok(MappedBatch {
                items: Vec::new(),
                total: 0,
            })
        }

        async fn orders_in(
            &self,
            _status: Option<&str>,
            limit: Option<usize>,
            _ctx: &OperationContext,
        ) -> ConnectorResult<MappedBatch<VendorOrderData>> {
            Ok(MappedBatch {
                items: Vec::new(),
                total: 3,
            }
            .capped(limit))
        }
    }

    #[tokio::test]
    async fn test_snapshot_keeps_raw_totals() {
        let ctx = OperationContext::new();

        let products = LossySource.snapshot(DataDomain::Products, &ctx).await.unwrap();
        assert_eq!((products.processed, products.total), (1, 2));
        assert_eq!(products.data[0]["sku"], "A");

        let inventory = LossySource.snapshot(DataDomain::Inventory, &ctx).await.unwrap();
        assert_eq!(inventory.data["A"], 7);
        assert_eq!((inventory.processed, inventory.total), (1, 2));

        let orders = LossySource.snapshot(DataDomain::Orders, &ctx).await.unwrap();
        assert_eq!((orders.processed, orders.total), (0, 3));
    }

    #[test]
    fn test_query_helpers() {
        assert!(sku_query(None).is_empty());
        assert!(sku_query(Some(&[])).is_empty());
        let skus = vec!["A".to_string(), "B".to_string()];
        assert_eq!(
            sku_query(Some(&skus)),
            vec![("skus".to_string(), "A,B".to_string())]
        );

        assert!(orders_query(None, None).is_empty());
        assert_eq!(
            orders_query(Some("open"), Some(5)),
            vec![
                ("status".to_string(), "open".to_string()),
                ("limit".to_string(), "5".to_string())
            ]
        );
    }

    #[test]
    fn test_capped_batch() {
        let batch = MappedBatch {
            items: vec![1, 2, 3],
            total: 3,
        };
        assert_eq!(batch.clone().capped(None).items.len(), 3);
        let capped = batch.capped(Some(2));
        assert_eq!(capped.items, vec![1, 2]);
        assert_eq!(capped.skipped(), 1);
    }

    #[tokio::test]
    async fn test_single_item_not_found_is_none() {
        let connector: BoxedVendorConnector = Box::new(StaticConnector::new());
        assert!(connector.get_product("A").await.unwrap().is_some());
        assert!(connector.get_product("Z").await.unwrap().is_none());
    }
}
