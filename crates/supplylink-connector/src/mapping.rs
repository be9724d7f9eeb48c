//! Field mapping types.
//!
//! Defines how vendor field paths map onto canonical field names, per data
//! domain.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ConnectorResult;
use crate::types::DataDomain;

/// Canonical field names for each domain.
pub mod fields {
    pub const SKU: &str = "sku";
    pub const NAME: &str = "name";
    pub const PRICE: &str = "price";
    pub const COST: &str = "cost";
    pub const QUANTITY: &str = "quantity";
    pub const DESCRIPTION: &str = "description";

    pub const ORDER_ID: &str = "order_id";
    pub const STATUS: &str = "status";
    pub const ITEMS: &str = "items";
    pub const TOTAL_AMOUNT: &str = "total_amount";
    pub const CREATED_AT: &str = "created_at";
    pub const REFERENCE: &str = "reference";
    pub const SHIP_TO: &str = "ship_to";
    pub const NOTES: &str = "notes";

    /// Order line fields, resolved relative to each element of `items`.
    pub const LINE_SKU: &str = "line_sku";
    pub const LINE_NAME: &str = "line_name";
    pub const LINE_QUANTITY: &str = "line_quantity";
    pub const LINE_PRICE: &str = "line_price";
    pub const LINE_TOTAL: &str = "line_total";

    pub const PRODUCT: &[&str] = &[SKU, NAME, PRICE, COST, QUANTITY, DESCRIPTION];
    pub const INVENTORY: &[&str] = &[SKU, QUANTITY];
    pub const PRICING: &[&str] = &[SKU, PRICE];
    pub const ORDER: &[&str] = &[
        ORDER_ID,
        STATUS,
        ITEMS,
        TOTAL_AMOUNT,
        CREATED_AT,
        REFERENCE,
        SHIP_TO,
        NOTES,
        LINE_SKU,
        LINE_NAME,
        LINE_QUANTITY,
        LINE_PRICE,
        LINE_TOTAL,
    ];
}

/// Canonical field name to vendor field path (dot-separated), per domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    #[serde(default)]
    pub products: BTreeMap<String, String>,
    #[serde(default)]
    pub inventory: BTreeMap<String, String>,
    #[serde(default)]
    pub pricing: BTreeMap<String, String>,
    #[serde(default)]
    pub orders: BTreeMap<String, String>,
}

impl FieldMapping {
    /// Identity mapping for every canonical field.
    ///
    /// Orders map `order_id` to the vendor's `id` and `total_amount` to
    /// `total`, and line fields to their unprefixed names.
    #[must_use]
    pub fn standard() -> Self {
        fn identity(names: &[&str]) -> BTreeMap<String, String> {
            names
                .iter()
                .map(|n| ((*n).to_string(), (*n).to_string()))
                .collect()
        }

        let mut orders = identity(fields::ORDER);
        for (canonical, path) in [
            (fields::ORDER_ID, "id"),
            (fields::TOTAL_AMOUNT, "total"),
            (fields::LINE_SKU, "sku"),
            (fields::LINE_NAME, "name"),
            (fields::LINE_QUANTITY, "quantity"),
            (fields::LINE_PRICE, "price"),
            (fields::LINE_TOTAL, "total"),
        ] {
            orders.insert(canonical.to_string(), path.to_string());
        }

        Self {
            products: identity(fields::PRODUCT),
            inventory: identity(fields::INVENTORY),
            pricing: identity(fields::PRICING),
            orders,
        }
    }

    /// Dictionary for a domain.
    pub fn domain(&self, domain: DataDomain) -> &BTreeMap<String, String> {
        match domain {
            DataDomain::Products => &self.products,
            DataDomain::Inventory => &self.inventory,
            DataDomain::Pricing => &self.pricing,
            DataDomain::Orders => &self.orders,
        }
    }

    fn domain_mut(&mut self, domain: DataDomain) -> &mut BTreeMap<String, String> {
        match domain {
            DataDomain::Products => &mut self.products,
            DataDomain::Inventory => &mut self.inventory,
            DataDomain::Pricing => &mut self.pricing,
            DataDomain::Orders => &mut self.orders,
        }
    }

    /// Add or replace one entry.
    #[must_use]
    pub fn with(mut self, domain: DataDomain, canonical: &str, path: &str) -> Self {
        self.domain_mut(domain)
            .insert(canonical.to_string(), path.to_string());
        self
    }

    /// Layer `overrides` on top of `self`; entries in `overrides` win.
    #[must_use]
    pub fn merged_with(mut self, overrides: &FieldMapping) -> Self {
        for domain in DataDomain::all() {
            let target = self.domain_mut(*domain);
            for (canonical, path) in overrides.domain(*domain) {
                target.insert(canonical.clone(), path.clone());
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        DataDomain::all().iter().all(|d| self.domain(*d).is_empty())
    }
}

/// Converts one raw vendor record into a canonical-keyed JSON object.
pub type RecordTransform = Arc<dyn Fn(&Value) -> ConnectorResult<Value> + Send + Sync>;

/// Optional per-domain transforms. A transform fully replaces dictionary
/// mapping for its domain.
#[derive(Clone, Default)]
pub struct DomainTransforms {
    products: Option<RecordTransform>,
    inventory: Option<RecordTransform>,
    pricing: Option<RecordTransform>,
    orders: Option<RecordTransform>,
}

impl DomainTransforms {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with<F>(mut self, domain: DataDomain, transform: F) -> Self
    where
        F: Fn(&Value) -> ConnectorResult<Value> + Send + Sync + 'static,
    {
        let transform: RecordTransform = Arc::new(transform);
        match domain {
            DataDomain::Products => self.products = Some(transform),
            DataDomain::Inventory => self.inventory = Some(transform),
            DataDomain::Pricing => self.pricing = Some(transform),
            DataDomain::Orders => self.orders = Some(transform),
        }
        self
    }

    pub fn get(&self, domain: DataDomain) -> Option<&RecordTransform> {
        match domain {
            DataDomain::Products => self.products.as_ref(),
            DataDomain::Inventory => self.inventory.as_ref(),
            DataDomain::Pricing => self.pricing.as_ref(),
            DataDomain::Orders => self.orders.as_ref(),
        }
    }
}

impl fmt::Debug for DomainTransforms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = DataDomain::all()
            .iter()
            .filter(|d| self.get(**d).is_some())
            .map(DataDomain::as_str)
            .collect();
        f.debug_struct("DomainTransforms")
            .field("domains", &names)
            .finish()
    }
}
