//! Universal connector implementation.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use supplylink_connector::context::OperationContext;
use supplylink_connector::error::{ConnectorError, ConnectorResult};
use supplylink_connector::model::{
    Capabilities, ConnectorMetadata, NewOrder, VendorConnectionTest, VendorOrderData,
    VendorProductData,
};
use supplylink_connector::traits::{
    orders_query, sku_query, DomainSnapshot, InventoryLevels, MappedFetch, PriceList,
    VendorConnector,
};
use supplylink_connector::transform::{records_of, FieldMapper, MappedBatch};
use supplylink_connector::types::DataDomain;

use crate::config::UniversalConnectorConfig;
use crate::strategy::{ProtocolStrategy, SftpTransport, SshSftpTransport};

const DATA_DOMAINS: [&str; 4] = ["products", "inventory", "pricing", "orders"];

/// Connector driven entirely by a [`UniversalConnectorConfig`].
pub struct UniversalConnector {
    config: UniversalConnectorConfig,
    mapper: FieldMapper,
    strategy: ProtocolStrategy,
}

impl std::fmt::Debug for UniversalConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UniversalConnector")
            .field("vendor_id", &self.config.vendor_id)
            .field("protocol", &self.strategy.protocol())
            .finish_non_exhaustive()
    }
}

impl UniversalConnector {
    /// Validate `config` and build the connector.
    pub fn new(config: UniversalConnectorConfig) -> ConnectorResult<Self> {
        Self::with_sftp_transport(config, Arc::new(SshSftpTransport))
    }

    /// Build with a specific SFTP transport.
    pub fn with_sftp_transport(
        config: UniversalConnectorConfig,
        sftp_transport: Arc<dyn SftpTransport>,
    ) -> ConnectorResult<Self> {
        config.validate()?;
        let strategy = ProtocolStrategy::for_config(&config, sftp_transport)?;
        let mapper = FieldMapper::new(config.field_mapping.clone())
            .with_transforms(config.transforms.clone());

        debug!(
            vendor_id = %config.vendor_id,
            protocol = %strategy.protocol(),
            "Universal connector created"
        );

        Ok(Self {
            config,
            mapper,
            strategy,
        })
    }

    pub fn config(&self) -> &UniversalConnectorConfig {
        &self.config
    }

    pub fn strategy(&self) -> &ProtocolStrategy {
        &self.strategy
    }

    /// Validate credentials under a caller context.
    pub async fn validate_credentials_in(&self, ctx: &OperationContext) -> ConnectorResult<bool> {
        self.strategy.validate(ctx).await
    }

    /// Check authentication and every data domain.
    pub async fn test_connection(&self) -> VendorConnectionTest {
        self.test_connection_in(&OperationContext::new()).await
    }

    /// Authenticate, then check each domain independently. A failing step
    /// is recorded and the remaining steps still run.
    #[instrument(skip(self, ctx), fields(vendor_id = %self.config.vendor_id))]
    pub async fn test_connection_in(&self, ctx: &OperationContext) -> VendorConnectionTest {
        let mut test = VendorConnectionTest::new();

        let auth = match self.strategy.validate(ctx).await {
            Ok(true) => Ok(()),
            Ok(false) => Err("credentials rejected".to_string()),
            Err(e) => Err(e.to_string()),
        };
        test.record_authentication(auth);

        for domain in DataDomain::all() {
            let outcome = self.check_domain(*domain, ctx).await.map_err(|e| e.to_string());
            test.record_domain(*domain, outcome);
        }

        if test.success {
            info!(
                vendor_id = %self.config.vendor_id,
                details = ?test.details,
                "Connection test passed"
            );
        } else {
            warn!(
                vendor_id = %self.config.vendor_id,
                errors = ?test.errors,
                "Connection test failed"
            );
        }
        test
    }

    async fn check_domain(&self, domain: DataDomain, ctx: &OperationContext) -> ConnectorResult<()> {
        match domain {
            DataDomain::Products => self.products_in(None, ctx).await.map(|_| ()),
            DataDomain::Inventory => self.inventory_in(None, ctx).await.map(|_| ()),
            DataDomain::Pricing => self.pricing_in(None, ctx).await.map(|_| ()),
            DataDomain::Orders => self.orders_in(None, Some(1), ctx).await.map(|_| ()),
        }
    }

    fn path(&self, domain: DataDomain) -> &str {
        self.config.config.endpoints.path_for(domain)
    }

    fn item_path(&self, domain: DataDomain, id: &str) -> String {
        format!("{}/{}", self.path(domain).trim_end_matches('/'), id)
    }

    async fn fetch_collection(
        &self,
        operation: &'static str,
        domain: DataDomain,
        query: &[(String, String)],
        ctx: &OperationContext,
    ) -> ConnectorResult<Value> {
        // A 404 on a collection means there is nothing to return.
        Ok(self
            .strategy
            .fetch(operation, self.path(domain), query, ctx)
            .await?
            .unwrap_or(Value::Null))
    }

    async fn single(
        &self,
        operation: &'static str,
        domain: DataDomain,
        id: &str,
        ctx: &OperationContext,
    ) -> ConnectorResult<Option<Value>> {
        let path = self.item_path(domain, id);
        let Some(payload) = self.strategy.fetch(operation, &path, &[], ctx).await? else {
            return Ok(None);
        };
        Ok(records_of(domain, &payload).into_iter().next().cloned())
    }
}

#[async_trait]
impl MappedFetch for UniversalConnector {
    async fn products_in(
        &self,
        skus: Option<&[String]>,
        ctx: &OperationContext,
    ) -> ConnectorResult<MappedBatch<VendorProductData>> {
        let payload = self
            .fetch_collection("get_products", DataDomain::Products, &sku_query(skus), ctx)
            .await?;
        self.mapper.products(&payload)
    }

    async fn inventory_in(
        &self,
        skus: Option<&[String]>,
        ctx: &OperationContext,
    ) -> ConnectorResult<MappedBatch<(String, i64)>> {
        let payload = self
            .fetch_collection("get_inventory", DataDomain::Inventory, &sku_query(skus), ctx)
            .await?;
        self.mapper.inventory(&payload)
    }

    async fn pricing_in(
        &self,
        skus: Option<&[String]>,
        ctx: &OperationContext,
    ) -> ConnectorResult<MappedBatch<(String, Decimal)>> {
        let payload = self
            .fetch_collection("get_pricing", DataDomain::Pricing, &sku_query(skus), ctx)
            .await?;
        self.mapper.pricing(&payload)
    }

    async fn orders_in(
        &self,
        status: Option<&str>,
        limit: Option<usize>,
        ctx: &OperationContext,
    ) -> ConnectorResult<MappedBatch<VendorOrderData>> {
        let payload = self
            .fetch_collection("get_orders", DataDomain::Orders, &orders_query(status, limit), ctx)
            .await?;
        Ok(self.mapper.orders(&payload)?.capped(limit))
    }
}

#[async_trait]
impl VendorConnector for UniversalConnector {
    fn metadata(&self) -> ConnectorMetadata {
        ConnectorMetadata {
            vendor_id: self.config.vendor_id.clone(),
            vendor_name: self.config.vendor_name.clone(),
            protocol: self.config.config.protocol,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    fn capabilities(&self) -> Capabilities {
        let mut capabilities = self.config.config.features.capabilities();
        if !self.strategy.moves_data() {
            for domain in DATA_DOMAINS {
                capabilities.insert(domain.to_string(), false);
            }
        }
        capabilities
    }

    async fn validate_credentials(&self) -> ConnectorResult<bool> {
        self.validate_credentials_in(&OperationContext::new()).await
    }

    async fn get_products(&self, skus: Option<&[String]>) -> ConnectorResult<Vec<VendorProductData>> {
        Ok(self.products_in(skus, &OperationContext::new()).await?.items)
    }

    async fn get_product(&self, sku: &str) -> ConnectorResult<Option<VendorProductData>> {
        let ctx = OperationContext::new();
        match self.single("get_product", DataDomain::Products, sku, &ctx).await? {
            Some(raw) => self.mapper.to_product(&raw),
            None => Ok(None),
        }
    }

    async fn get_inventory(&self, skus: Option<&[String]>) -> ConnectorResult<InventoryLevels> {
        let batch = self.inventory_in(skus, &OperationContext::new()).await?;
        Ok(batch.items.into_iter().collect())
    }

    async fn get_pricing(&self, skus: Option<&[String]>) -> ConnectorResult<PriceList> {
        let batch = self.pricing_in(skus, &OperationContext::new()).await?;
        Ok(batch.items.into_iter().collect())
    }

    #[instrument(skip(self, order), fields(vendor_id = %self.config.vendor_id, lines = order.items.len()))]
    async fn create_order(&self, order: &NewOrder) -> ConnectorResult<VendorOrderData> {
        let payload = self.mapper.order_payload(order)?;
        let response = self
            .strategy
            .submit(
                "create_order",
                self.path(DataDomain::Orders),
                &payload,
                &OperationContext::new(),
            )
            .await?;

        let created = records_of(DataDomain::Orders, &response)
            .into_iter()
            .next()
            .map(|raw| self.mapper.to_order(raw))
            .transpose()?
            .flatten();
        created.ok_or_else(|| ConnectorError::invalid_data("order response is missing an order id"))
    }

    async fn get_order(&self, order_id: &str) -> ConnectorResult<Option<VendorOrderData>> {
        let ctx = OperationContext::new();
        match self.single("get_order", DataDomain::Orders, order_id, &ctx).await? {
            Some(raw) => self.mapper.to_order(&raw),
            None => Ok(None),
        }
    }

    async fn get_orders(
        &self,
        status: Option<&str>,
        limit: Option<usize>,
    ) -> ConnectorResult<Vec<VendorOrderData>> {
        Ok(self
            .orders_in(status, limit, &OperationContext::new())
            .await?
            .items)
    }

    async fn fetch_domain(
        &self,
        domain: DataDomain,
        ctx: &OperationContext,
    ) -> ConnectorResult<DomainSnapshot> {
        self.snapshot(domain, ctx).await
    }
}
