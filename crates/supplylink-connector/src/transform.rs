//! Field mapping engine.
//!
//! Applies a [`FieldMapping`] (or a domain transform) to raw vendor records and
//! converts the result into canonical shapes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::warn;

use crate::error::{ConnectorError, ConnectorResult};
use crate::mapping::{fields, DomainTransforms, FieldMapping};
use crate::model::{NewOrder, OrderLineItem, VendorOrderData, VendorProductData};
use crate::traits::DomainSnapshot;
use crate::types::DataDomain;

/// Look up a dot-separated path. Numeric segments index into arrays.
///
/// Returns `None` for a missing path or an explicit `null`.
pub fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// Write `value` at a dot-separated path, creating intermediate objects.
pub fn set_path(target: &mut Map<String, Value>, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut current = target;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return;
        }
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        current = match entry {
            Value::Object(map) => map,
            _ => return,
        };
    }
}

/// Records contained in a domain payload.
///
/// Accepts a bare array, an object wrapping the array under the domain name
/// or `items`, or a single object.
pub fn records_of(domain: DataDomain, payload: &Value) -> Vec<&Value> {
    match payload {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => {
            for key in [domain.as_str(), "items", "data", "results"] {
                if let Some(Value::Array(items)) = map.get(key) {
                    return items.iter().collect();
                }
            }
            vec![payload]
        }
        Value::Null => Vec::new(),
        _ => vec![payload],
    }
}

/// Normalized records plus the number of raw records they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedBatch<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> MappedBatch<T> {
    pub fn skipped(&self) -> usize {
        self.total.saturating_sub(self.items.len())
    }

    /// Keep at most `limit` items.
    #[must_use]
    pub fn capped(mut self, limit: Option<usize>) -> Self {
        if let Some(limit) = limit {
            self.items.truncate(limit);
        }
        self
    }
}

impl<T: Serialize> MappedBatch<T> {
    /// Snapshot holding the items as a JSON array.
    pub fn into_snapshot(self) -> ConnectorResult<DomainSnapshot> {
        Ok(DomainSnapshot {
            data: serde_json::to_value(&self.items)?,
            processed: self.items.len(),
            total: self.total,
        })
    }
}

impl<V: Serialize> MappedBatch<(String, V)> {
    /// Snapshot holding the items as a JSON object keyed by SKU.
    pub fn into_keyed_snapshot(self) -> ConnectorResult<DomainSnapshot> {
        let processed = self.items.len();
        let keyed: HashMap<String, V> = self.items.into_iter().collect();
        Ok(DomainSnapshot {
            data: serde_json::to_value(&keyed)?,
            processed,
            total: self.total,
        })
    }
}

/// Maps vendor records to and from canonical fields.
#[derive(Debug, Clone, Default)]
pub struct FieldMapper {
    mapping: FieldMapping,
    transforms: DomainTransforms,
}

impl FieldMapper {
    pub fn new(mapping: FieldMapping) -> Self {
        Self {
            mapping,
            transforms: DomainTransforms::default(),
        }
    }

    #[must_use]
    pub fn with_transforms(mut self, transforms: DomainTransforms) -> Self {
        self.transforms = transforms;
        self
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    /// Produce a canonical-keyed object from one raw record.
    ///
    /// A domain transform, when present, replaces dictionary mapping. A
    /// missing vendor path leaves the canonical field absent.
    pub fn map_record(&self, domain: DataDomain, raw: &Value) -> ConnectorResult<Map<String, Value>> {
        if let Some(transform) = self.transforms.get(domain) {
            return match transform(raw)? {
                Value::Object(map) => Ok(map),
                other => Err(ConnectorError::MappingFailed {
                    field: domain.to_string(),
                    message: format!("transform must return an object, got {}", kind_of(&other)),
                }),
            };
        }

        let mut mapped = Map::new();
        for (canonical, path) in self.mapping.domain(domain) {
            if let Some(value) = lookup_path(raw, path) {
                mapped.insert(canonical.clone(), value.clone());
            }
        }
        Ok(mapped)
    }

    /// Build a vendor payload from canonical fields using the domain's
    /// dictionary in reverse. Unmapped canonical fields keep their name.
    pub fn unmap_record(&self, domain: DataDomain, canonical: &Map<String, Value>) -> Value {
        let dictionary = self.mapping.domain(domain);
        let mut payload = Map::new();
        for (name, value) in canonical {
            let path = dictionary.get(name).map_or(name.as_str(), String::as_str);
            set_path(&mut payload, path, value.clone());
        }
        Value::Object(payload)
    }

    /// Vendor payload for placing `order`.
    pub fn order_payload(&self, order: &NewOrder) -> ConnectorResult<Value> {
        let dictionary = self.mapping.domain(DataDomain::Orders);
        let line_path = |canonical: &str, fallback: &'static str| -> String {
            dictionary
                .get(canonical)
                .cloned()
                .unwrap_or_else(|| fallback.to_string())
        };

        let mut lines = Vec::with_capacity(order.items.len());
        for line in &order.items {
            let mut item = Map::new();
            set_path(&mut item, &line_path(fields::LINE_SKU, "sku"), Value::String(line.sku.clone()));
            set_path(
                &mut item,
                &line_path(fields::LINE_QUANTITY, "quantity"),
                Value::from(line.quantity),
            );
            if let Some(price) = line.price {
                set_path(
                    &mut item,
                    &line_path(fields::LINE_PRICE, "price"),
                    serde_json::to_value(price)?,
                );
            }
            lines.push(Value::Object(item));
        }

        let mut canonical = Map::new();
        canonical.insert(fields::ITEMS.to_string(), Value::Array(lines));
        if let Some(reference) = &order.reference {
            canonical.insert(fields::REFERENCE.to_string(), Value::String(reference.clone()));
        }
        if let Some(ship_to) = &order.ship_to {
            canonical.insert(fields::SHIP_TO.to_string(), ship_to.clone());
        }
        if let Some(notes) = &order.notes {
            canonical.insert(fields::NOTES.to_string(), Value::String(notes.clone()));
        }
        Ok(self.unmap_record(DataDomain::Orders, &canonical))
    }

    /// Normalize one product record. `None` when the record has no SKU.
    pub fn to_product(&self, raw: &Value) -> ConnectorResult<Option<VendorProductData>> {
        let mut mapped = self.map_record(DataDomain::Products, raw)?;
        let Some(sku) = mapped.remove(fields::SKU).and_then(|v| as_string(&v)) else {
            return Ok(None);
        };

        let mut product = VendorProductData::new(sku);
        product.name = mapped.remove(fields::NAME).and_then(|v| as_string(&v));
        product.price = take_decimal(&mut mapped, fields::PRICE)?;
        product.cost = take_decimal(&mut mapped, fields::COST)?;
        product.quantity = take_i64(&mut mapped, fields::QUANTITY)?;
        product.description = mapped.remove(fields::DESCRIPTION).and_then(|v| as_string(&v));
        product.attributes = mapped.into_iter().collect();
        Ok(Some(product))
    }

    /// Normalize one inventory record into `(sku, quantity)`.
    pub fn to_inventory(&self, raw: &Value) -> ConnectorResult<Option<(String, i64)>> {
        let mut mapped = self.map_record(DataDomain::Inventory, raw)?;
        let Some(sku) = mapped.remove(fields::SKU).and_then(|v| as_string(&v)) else {
            return Ok(None);
        };
        Ok(take_i64(&mut mapped, fields::QUANTITY)?.map(|qty| (sku, qty)))
    }

    /// Normalize one pricing record into `(sku, price)`.
    pub fn to_price(&self, raw: &Value) -> ConnectorResult<Option<(String, Decimal)>> {
        let mut mapped = self.map_record(DataDomain::Pricing, raw)?;
        let Some(sku) = mapped.remove(fields::SKU).and_then(|v| as_string(&v)) else {
            return Ok(None);
        };
        Ok(take_decimal(&mut mapped, fields::PRICE)?.map(|price| (sku, price)))
    }

    /// Normalize one order record. `None` when the record has no order id.
    pub fn to_order(&self, raw: &Value) -> ConnectorResult<Option<VendorOrderData>> {
        let mut mapped = self.map_record(DataDomain::Orders, raw)?;
        let Some(order_id) = mapped.remove(fields::ORDER_ID).and_then(|v| as_string(&v)) else {
            return Ok(None);
        };

        let items: Vec<OrderLineItem> = match mapped.remove(fields::ITEMS) {
            Some(Value::Array(lines)) => lines
                .iter()
                .map(|line| self.to_line_item(line))
                .collect::<ConnectorResult<Vec<_>>>()?
                .into_iter()
                .flatten()
                .collect(),
            _ => Vec::new(),
        };

        let total_amount = match take_decimal(&mut mapped, fields::TOTAL_AMOUNT)? {
            Some(total) => total,
            None => items.iter().map(|l| l.total).sum(),
        };

        let created_at = mapped
            .remove(fields::CREATED_AT)
            .and_then(|v| as_datetime(&v));

        Ok(Some(VendorOrderData {
            order_id,
            status: mapped.remove(fields::STATUS).and_then(|v| as_string(&v)),
            items,
            total_amount,
            created_at,
        }))
    }

    fn to_line_item(&self, raw: &Value) -> ConnectorResult<Option<OrderLineItem>> {
        let dictionary = self.mapping.domain(DataDomain::Orders);
        let get = |canonical: &str, fallback: &str| {
            let path = dictionary.get(canonical).map_or(fallback, String::as_str);
            lookup_path(raw, path)
        };

        let Some(sku) = get(fields::LINE_SKU, "sku").and_then(as_string) else {
            warn!("Skipping order line without SKU");
            return Ok(None);
        };
        let quantity = get(fields::LINE_QUANTITY, "quantity")
            .map(|v| to_i64(fields::LINE_QUANTITY, v))
            .transpose()?
            .unwrap_or(0);
        let price = get(fields::LINE_PRICE, "price")
            .map(|v| to_decimal(fields::LINE_PRICE, v))
            .transpose()?
            .unwrap_or(Decimal::ZERO);
        let total = get(fields::LINE_TOTAL, "total")
            .map(|v| to_decimal(fields::LINE_TOTAL, v))
            .transpose()?
            .unwrap_or_else(|| price * Decimal::from(quantity));

        Ok(Some(OrderLineItem {
            sku,
            name: get(fields::LINE_NAME, "name").and_then(as_string),
            quantity,
            price,
            total,
        }))
    }

    /// Normalize every product in a payload, skipping records without a SKU.
    pub fn products(&self, payload: &Value) -> ConnectorResult<MappedBatch<VendorProductData>> {
        self.batch(DataDomain::Products, payload, |raw| self.to_product(raw))
    }

    pub fn inventory(&self, payload: &Value) -> ConnectorResult<MappedBatch<(String, i64)>> {
        self.batch(DataDomain::Inventory, payload, |raw| self.to_inventory(raw))
    }

    pub fn pricing(&self, payload: &Value) -> ConnectorResult<MappedBatch<(String, Decimal)>> {
        self.batch(DataDomain::Pricing, payload, |raw| self.to_price(raw))
    }

    pub fn orders(&self, payload: &Value) -> ConnectorResult<MappedBatch<VendorOrderData>> {
        self.batch(DataDomain::Orders, payload, |raw| self.to_order(raw))
    }

    fn batch<T, F>(&self, domain: DataDomain, payload: &Value, mut convert: F) -> ConnectorResult<MappedBatch<T>>
    where
        F: FnMut(&Value) -> ConnectorResult<Option<T>>,
    {
        let records = records_of(domain, payload);
        let total = records.len();
        let mut items = Vec::with_capacity(total);
        for raw in records {
            match convert(raw)? {
                Some(item) => items.push(item),
                None => warn!(domain = %domain, "Skipping record missing its key field"),
            }
        }
        Ok(MappedBatch { items, total })
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_datetime(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn to_decimal(field: &str, value: &Value) -> ConnectorResult<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().trim_start_matches('$').to_string(),
        other => {
            return Err(ConnectorError::MappingFailed {
                field: field.to_string(),
                message: format!("expected a number, got {}", kind_of(other)),
            })
        }
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| ConnectorError::MappingFailed {
            field: field.to_string(),
            message: e.to_string(),
        })
}

fn to_i64(field: &str, value: &Value) -> ConnectorResult<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .ok_or_else(|| ConnectorError::MappingFailed {
                field: field.to_string(),
                message: format!("{n} is not an integer"),
            }),
        Value::String(s) => s.trim().parse().map_err(|_| ConnectorError::MappingFailed {
            field: field.to_string(),
            message: format!("'{s}' is not an integer"),
        }),
        other => Err(ConnectorError::MappingFailed {
            field: field.to_string(),
            message: format!("expected an integer, got {}", kind_of(other)),
        }),
    }
}

fn take_decimal(mapped: &mut Map<String, Value>, field: &str) -> ConnectorResult<Option<Decimal>> {
    mapped
        .remove(field)
        .map(|v| to_decimal(field, &v))
        .transpose()
}

fn take_i64(mapped: &mut Map<String, Value>, field: &str) -> ConnectorResult<Option<i64>> {
    mapped.remove(field).map(|v| to_i64(field, &v)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewOrderLine;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn standard() -> FieldMapper {
        FieldMapper::new(FieldMapping::standard())
    }

    #[test]
    fn test_nested_path_lookup() {
        let mapper = FieldMapper::new(FieldMapping::default().with(DataDomain::Products, "sku", "item.code"));
        let product = mapper
            .to_product(&json!({"item": {"code": "X1"}}))
            .unwrap()
            .unwrap();
        assert_eq!(product.sku, "X1");
        assert_eq!(product.name, None);
    }

    #[test]
    fn test_missing_path_is_absent_not_error() {
        let mapper = FieldMapper::new(
            FieldMapping::default()
                .with(DataDomain::Products, "sku", "item.code")
                .with(DataDomain::Products, "name", "item.title.en"),
        );
        let mapped = mapper
            .map_record(DataDomain::Products, &json!({"item": {"code": "X1"}}))
            .unwrap();
        assert!(mapped.get("name").is_none());

        let product = mapper.to_product(&json!({"other": 1})).unwrap();
        assert!(product.is_none());
    }

    #[test]
    fn test_lookup_path_indexes_arrays() {
        let value = json!({"prices": [{"amount": 1}, {"amount": 2}]});
        assert_eq!(lookup_path(&value, "prices.1.amount"), Some(&json!(2)));
        assert_eq!(lookup_path(&value, "prices.5.amount"), None);
        assert_eq!(lookup_path(&json!({"a": null}), "a"), None);
    }

    #[test]
    fn test_product_conversion() {
        let raw = json!({
            "sku": "PEN-01",
            "name": "Blue Pen",
            "price": "1.25",
            "cost": 0.8,
            "quantity": "140",
            "description": "Ballpoint"
        });
        let product = standard().to_product(&raw).unwrap().unwrap();
        assert_eq!(product.price, Some(dec!(1.25)));
        assert_eq!(product.cost, Some(dec!(0.8)));
        assert_eq!(product.quantity, Some(140));
        assert!(product.attributes.is_empty());
    }

    #[test]
    fn test_extra_mapped_fields_become_attributes() {
        let mapping = FieldMapping::standard().with(DataDomain::Products, "brand", "details.brand");
        let raw = json!({"sku": "A", "details": {"brand": "Acme"}});
        let product = FieldMapper::new(mapping).to_product(&raw).unwrap().unwrap();
        assert_eq!(product.attributes.get("brand"), Some(&json!("Acme")));
    }

    #[test]
    fn test_bad_number_is_mapping_error() {
        let err = standard()
            .to_product(&json!({"sku": "A", "price": "cheap"}))
            .unwrap_err();
        assert_eq!(err.error_code(), "MAPPING_FAILED");
    }

    #[test]
    fn test_transform_replaces_dictionary() {
        let transforms = DomainTransforms::new().with(DataDomain::Inventory, |raw| {
            Ok(json!({
                "sku": raw["ItemNo"],
                "quantity": raw["OnHand"]["Total"],
            }))
        });
        let mapper = FieldMapper::new(FieldMapping::standard()).with_transforms(transforms);
        let entry = mapper
            .to_inventory(&json!({"ItemNo": "Z9", "OnHand": {"Total": 7}, "sku": "ignored"}))
            .unwrap();
        assert_eq!(entry, Some(("Z9".to_string(), 7)));
    }

    #[test]
    fn test_transform_must_return_object() {
        let transforms = DomainTransforms::new().with(DataDomain::Pricing, |_| Ok(json!([1])));
        let mapper = FieldMapper::default().with_transforms(transforms);
        assert!(mapper.to_price(&json!({})).is_err());
    }

    #[test]
    fn test_batch_counts_skipped_records() {
        let payload = json!({"products": [{"sku": "A"}, {"name": "no sku"}, {"sku": "C"}]});
        let batch = standard().products(&payload).unwrap();
        assert_eq!(batch.total, 3);
        assert_eq!(batch.items.len(), 2);
        assert_eq!(batch.skipped(), 1);
    }

    #[test]
    fn test_order_conversion() {
        let raw = json!({
            "id": "SO-100",
            "status": "shipped",
            "items": [
                {"sku": "A", "quantity": 2, "price": "3.00"},
                {"quantity": 1}
            ],
            "created_at": "2024-03-01T10:00:00Z"
        });
        let order = standard().to_order(&raw).unwrap().unwrap();
        assert_eq!(order.order_id, "SO-100");
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].total, dec!(6.00));
        assert_eq!(order.total_amount, dec!(6.00));
        assert!(order.created_at.is_some());
    }

    #[test]
    fn test_order_payload_unmaps_nested_paths() {
        let mapping = FieldMapping::standard()
            .with(DataDomain::Orders, "reference", "header.po_number")
            .with(DataDomain::Orders, "items", "lines")
            .with(DataDomain::Orders, "line_sku", "product.code");
        let order = NewOrder::new(vec![NewOrderLine {
            sku: "A".to_string(),
            quantity: 3,
            price: None,
        }])
        .with_reference("PO-7");

        let payload = FieldMapper::new(mapping).order_payload(&order).unwrap();
        assert_eq!(payload["header"]["po_number"], "PO-7");
        assert_eq!(payload["lines"][0]["product"]["code"], "A");
        assert_eq!(payload["lines"][0]["quantity"], 3);
    }

    #[test]
    fn test_records_of_shapes() {
        assert_eq!(records_of(DataDomain::Orders, &json!([1, 2])).len(), 2);
        assert_eq!(records_of(DataDomain::Orders, &json!({"id": "x"})).len(), 1);
        assert_eq!(records_of(DataDomain::Pricing, &json!({"items": [{}, {}, {}]})).len(), 3);
        assert!(records_of(DataDomain::Pricing, &Value::Null).is_empty());
    }
}
