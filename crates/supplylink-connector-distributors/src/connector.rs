//! REST connector shared by the named distributors.
//!
//! Each distributor contributes a [`DistributorProfile`]; this type turns
//! it into a [`VendorConnector`]. Failures always propagate; demo data is
//! only available through [`FixtureConnector`](crate::FixtureConnector).

use async_trait::async_trait;
use reqwest::Method;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use std::sync::Arc;

use supplylink_connector::config::{ConnectorSettings, VendorEndpoints};
use supplylink_connector::context::OperationContext;
use supplylink_connector::credentials::{CredentialBundle, VendorCredentials};
use supplylink_connector::error::{ConnectorError, ConnectorResult};
use supplylink_connector::ids::VendorId;
use supplylink_connector::model::{
    Capabilities, ConnectorMetadata, NewOrder, VendorOrderData, VendorProductData,
};
use supplylink_connector::traits::{
    orders_query, sku_query, DomainSnapshot, InventoryLevels, MappedFetch, PriceList,
    VendorConnector,
};
use supplylink_connector::transform::{records_of, FieldMapper, MappedBatch};
use supplylink_connector::types::{DataDomain, ProtocolType};
use supplylink_connector_universal::{ApiClient, ApiResponse, RateLimiter, TokenCache};

use crate::profile::DistributorProfile;

/// Connector for one named distributor.
pub struct DistributorConnector {
    profile: &'static DistributorProfile,
    vendor_id: VendorId,
    endpoints: VendorEndpoints,
    client: ApiClient,
    mapper: FieldMapper,
}

impl std::fmt::Debug for DistributorConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistributorConnector")
            .field("distributor", &self.profile.vendor_type)
            .field("vendor_id", &self.vendor_id)
            .field("base_url", &self.client.base_url())
            .finish_non_exhaustive()
    }
}

impl DistributorConnector {
    /// Build a connector for `profile`.
    ///
    /// The credentials must use the distributor's authentication mode. The
    /// bundle's endpoint override replaces the distributor's default base URL.
    /// Requests are paced by the profile's rate limits.
    pub fn new(
        profile: &'static DistributorProfile,
        vendor_id: impl Into<VendorId>,
        bundle: CredentialBundle,
        settings: ConnectorSettings,
    ) -> ConnectorResult<Self> {
        let mode = bundle.credentials.mode();
        if mode != profile.authentication {
            return Err(ConnectorError::invalid_config(format!(
                "{} requires {} credentials, got {mode}",
                profile.name, profile.authentication
            )));
        }
        bundle.credentials.validate_for(ProtocolType::Api)?;

        let base_url = bundle
            .endpoint_override
            .clone()
            .unwrap_or_else(|| profile.default_base_url.to_string());

        let mut endpoints = profile.endpoints();
        endpoints.base_url = Some(base_url.clone());

        let mut client = ApiClient::new(
            &base_url,
            &bundle,
            &settings,
            Arc::new(RateLimiter::new(&profile.rate_limits)),
        )?;
        if let VendorCredentials::OAuth2 { .. } = &bundle.credentials {
            let default_url = endpoints.token_url().unwrap_or_default();
            client = client.with_token_cache(Arc::new(TokenCache::from_credentials(
                &bundle.credentials,
                &default_url,
            )?));
        }
        let vendor_id = vendor_id.into();

        debug!(
            vendor_id = %vendor_id,
            distributor = %profile.vendor_type,
            base_url = %base_url,
            "Distributor connector created"
        );

        Ok(Self {
            profile,
            vendor_id,
            endpoints,
            client,
            mapper: FieldMapper::new((profile.field_mapping)()),
        })
    }

    pub fn profile(&self) -> &'static DistributorProfile {
        self.profile
    }

    async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
        ctx: &OperationContext,
    ) -> ConnectorResult<Option<Value>> {
        let response = self
            .client
            .retry_policy()
            .execute_in(ctx, || self.client.send(Method::GET, path, query, None))
            .await?;
        Ok(response.into_option())
    }

    async fn collection(
        &self,
        domain: DataDomain,
        query: &[(String, String)],
        ctx: &OperationContext,
    ) -> ConnectorResult<Value> {
        Ok(self
            .get(self.endpoints.path_for(domain), query, ctx)
            .await?
            .unwrap_or(Value::Null))
    }

    async fn single(&self, domain: DataDomain, id: &str) -> ConnectorResult<Option<Value>> {
        let path = format!(
            "{}/{}",
            self.endpoints.path_for(domain).trim_end_matches('/'),
            id
        );
        let payload = self.get(&path, &[], &OperationContext::new()).await?;
        Ok(payload.and_then(|p| records_of(domain, &p).into_iter().next().cloned()))
    }
}

#[async_trait]
impl MappedFetch for DistributorConnector {
    async fn products_in(
        &self,
        skus: Option<&[String]>,
        ctx: &OperationContext,
    ) -> ConnectorResult<MappedBatch<VendorProductData>> {
        let payload = self
            .collection(DataDomain::Products, &sku_query(skus), ctx)
            .await?;
        self.mapper.products(&payload)
    }

    async fn inventory_in(
        &self,
        skus: Option<&[String]>,
        ctx: &OperationContext,
    ) -> ConnectorResult<MappedBatch<(String, i64)>> {
        let payload = self
            .collection(DataDomain::Inventory, &sku_query(skus), ctx)
            .await?;
        self.mapper.inventory(&payload)
    }

    async fn pricing_in(
        &self,
        skus: Option<&[String]>,
        ctx: &OperationContext,
    ) -> ConnectorResult<MappedBatch<(String, Decimal)>> {
        let payload = self
            .collection(DataDomain::Pricing, &sku_query(skus), ctx)
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
            .collection(DataDomain::Orders, &orders_query(status, limit), ctx)
            .await?;
        Ok(self.mapper.orders(&payload)?.capped(limit))
    }
}

#[async_trait]
impl VendorConnector for DistributorConnector {
    fn metadata(&self) -> ConnectorMetadata {
        ConnectorMetadata {
            vendor_id: self.vendor_id.clone(),
            vendor_name: self.profile.name.to_string(),
            protocol: ProtocolType::Api,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    fn capabilities(&self) -> Capabilities {
        self.profile.capabilities()
    }

    #[instrument(skip(self), fields(vendor_id = %self.vendor_id))]
    async fn validate_credentials(&self) -> ConnectorResult<bool> {
        let ctx = OperationContext::new();
        match self.get(&self.endpoints.auth, &[], &ctx).await {
            Ok(Some(_)) => {
                info!(distributor = %self.profile.vendor_type, "Distributor credentials accepted");
                Ok(true)
            }
            Ok(None) => {
                warn!(auth_path = %self.endpoints.auth, "Auth check endpoint not found");
                Ok(false)
            }
            Err(e) if e.is_authentication() || matches!(e, ConnectorError::VendorRejected { .. }) => {
                warn!(error = %e, "Distributor rejected credentials");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn get_products(&self, skus: Option<&[String]>) -> ConnectorResult<Vec<VendorProductData>> {
        Ok(self.products_in(skus, &OperationContext::new()).await?.items)
    }

    async fn get_product(&self, sku: &str) -> ConnectorResult<Option<VendorProductData>> {
        match self.single(DataDomain::Products, sku).await? {
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

    #[instrument(skip(self, order), fields(vendor_id = %self.vendor_id, lines = order.items.len()))]
    async fn create_order(&self, order: &NewOrder) -> ConnectorResult<VendorOrderData> {
        let payload = self.mapper.order_payload(order)?;
        let ctx = OperationContext::new();
        let response = ctx
            .run(self
                .client
                .send(Method::POST, &self.endpoints.orders, &[], Some(&payload)))
            .await?;

        let ApiResponse::Data(body) = response else {
            return Err(ConnectorError::UnexpectedStatus {
                status: 404,
                message: format!("{} not found", self.endpoints.orders),
            });
        };
        records_of(DataDomain::Orders, &body)
            .into_iter()
            .next()
            .map(|raw| self.mapper.to_order(raw))
            .transpose()?
            .flatten()
            .ok_or_else(|| ConnectorError::invalid_data("order response is missing an order number"))
    }

    async fn get_order(&self, order_id: &str) -> ConnectorResult<Option<VendorOrderData>> {
        match self.single(DataDomain::Orders, order_id).await? {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{essendant, sp_richards};
    use std::time::Duration;

    fn essendant_connector() -> DistributorConnector {
        essendant::connector(
            "ess",
            VendorCredentials::api_key("k").into(),
            ConnectorSettings::default(),
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_paced_by_profile_budget() {
        let connector = essendant_connector();
        let limiter = connector.client.rate_limiter();

        for _ in 0..60 {
            limiter.acquire().await;
        }
        let start = tokio::time::Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(900));
    }

    #[tokio::test]
    async fn test_oauth_profile_gets_token_cache() {
        let connector = sp_richards::connector(
            "spr",
            CredentialBundle::new(VendorCredentials::oauth2("cid", "secret"))
                .with_endpoint_override("http://127.0.0.1:9000"),
            ConnectorSettings::default(),
        )
        .unwrap();

        let tokens = connector.client.token_cache().unwrap();
        assert_eq!(tokens.token_url(), "http://127.0.0.1:9000/oauth/token");
        assert!(!connector.client.rate_limiter().is_unlimited().await);

        assert!(essendant_connector().client.token_cache().is_none());
    }
}
