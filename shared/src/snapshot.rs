//! Snapshot normalization
//!
//! A snapshot is a whole-collection read: backend-assigned keys mapped to
//! record values, or nothing at all when the collection is empty. The
//! functions here turn one into typed entities:
//!
//! - the snapshot key becomes the entity id
//! - outfit `items` stored as a keyed map are flattened in key order, the
//!   keys themselves are dropped
//! - missing optional fields take their defaults, and so do optional fields
//!   holding an unexpected type; sizes stored as numbers or as a keyed map
//!   are read as strings in stored order
//! - records missing a required field (or not objects at all) are rejected
//!   at the boundary and skipped
//!
//! Normalization is pure: the same snapshot always yields equal output.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{Outfit, OutfitItem, Product};

/// Whole-collection read. `None` means the path holds no data.
pub type Snapshot = Option<Map<String, Value>>;

/// Build a snapshot from a raw JSON value
///
/// `null` is an empty snapshot. A non-object root cannot hold keyed records
/// and is treated as empty too.
pub fn snapshot_from_value(value: Value) -> Snapshot {
    match value {
        Value::Object(map) => Some(map),
        Value::Null => None,
        other => {
            tracing::warn!(kind = %json_kind(&other), "Snapshot root is not an object, treating as empty");
            None
        }
    }
}

/// Record rejected at the normalization boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("record {key} is not an object")]
    NotAnObject { key: String },

    #[error("record {key} is missing required field `{field}`")]
    MissingField { key: String, field: &'static str },

    #[error("record {key} is malformed: {message}")]
    Malformed { key: String, message: String },
}

/// Which collection a snapshot belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Product,
    Outfit,
}

impl EntityKind {
    /// Conventional collection path
    pub fn default_path(&self) -> &'static str {
        match self {
            Self::Product => "products",
            Self::Outfit => "outfits",
        }
    }
}

/// Normalized entity, tagged by kind
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Product(Product),
    Outfit(Outfit),
}

impl Entity {
    pub fn id(&self) -> &str {
        match self {
            Self::Product(p) => &p.id,
            Self::Outfit(o) => &o.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Product(_) => EntityKind::Product,
            Self::Outfit(_) => EntityKind::Outfit,
        }
    }
}

/// Normalize a snapshot with the normalizer for `kind`
pub fn normalize(kind: EntityKind, snapshot: &Snapshot) -> Vec<Entity> {
    match kind {
        EntityKind::Product => normalize_products(snapshot)
            .into_iter()
            .map(Entity::Product)
            .collect(),
        EntityKind::Outfit => normalize_outfits(snapshot)
            .into_iter()
            .map(Entity::Outfit)
            .collect(),
    }
}

/// Normalize a products snapshot, skipping rejected records
pub fn normalize_products(snapshot: &Snapshot) -> Vec<Product> {
    normalize_with(snapshot, try_normalize_product)
}

/// Normalize an outfits snapshot, skipping rejected records
pub fn normalize_outfits(snapshot: &Snapshot) -> Vec<Outfit> {
    normalize_with(snapshot, try_normalize_outfit)
}

fn normalize_with<T>(
    snapshot: &Snapshot,
    f: impl Fn(&str, &Value) -> Result<T, NormalizeError>,
) -> Vec<T> {
    let Some(records) = snapshot else {
        return Vec::new();
    };

    records
        .iter()
        .filter_map(|(key, value)| match f(key, value) {
            Ok(entity) => Some(entity),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Skipping malformed record");
                None
            }
        })
        .collect()
}

// ── Products ────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductRecord {
    name: Option<String>,
    #[serde(default, deserialize_with = "strict_price")]
    price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    category: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    image: Option<String>,
    #[serde(default, deserialize_with = "lenient_price")]
    original_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    is_new: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    is_sale: Option<bool>,
    #[serde(default, deserialize_with = "lenient_sizes")]
    sizes: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_string")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    affiliate_link: Option<String>,
}

/// Normalize a single product record
pub fn try_normalize_product(key: &str, value: &Value) -> Result<Product, NormalizeError> {
    let record: ProductRecord = decode(key, value)?;

    let name = record.name.ok_or_else(|| missing(key, "name"))?;
    let price = record.price.ok_or_else(|| missing(key, "price"))?;

    Ok(Product {
        id: key.to_string(),
        name,
        price,
        category: record.category.unwrap_or_default(),
        image: record.image.unwrap_or_default(),
        original_price: record.original_price,
        is_new: record.is_new.unwrap_or(false),
        is_sale: record.is_sale.unwrap_or(false),
        sizes: record.sizes.unwrap_or_default(),
        description: record.description.unwrap_or_default(),
        affiliate_link: record.affiliate_link.unwrap_or_default(),
    })
}

// ── Outfits ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutfitRecord {
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    image: Option<String>,
    items: Option<Value>,
    #[serde(default, deserialize_with = "lenient_price")]
    total_price: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    category: Option<String>,
    #[serde(default, deserialize_with = "lenient_price")]
    price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    image: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    affiliate_link: Option<String>,
}

/// Normalize a single outfit record
pub fn try_normalize_outfit(key: &str, value: &Value) -> Result<Outfit, NormalizeError> {
    let record: OutfitRecord = decode(key, value)?;

    let name = record.name.ok_or_else(|| missing(key, "name"))?;

    Ok(Outfit {
        id: key.to_string(),
        name,
        description: record.description.unwrap_or_default(),
        image: record.image.unwrap_or_default(),
        items: flatten_items(key, record.items),
        total_price: record.total_price,
    })
}

/// Flatten `items` into an ordered list
///
/// Accepts a keyed map (iterated in stored order, keys dropped), an array
/// (holes skipped) or nothing.
fn flatten_items(key: &str, items: Option<Value>) -> Vec<OutfitItem> {
    let values: Vec<Value> = match items {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Object(map)) => map.into_iter().map(|(_, v)| v).collect(),
        Some(Value::Array(list)) => list,
        Some(other) => {
            tracing::warn!(key = %key, kind = %json_kind(&other), "Outfit items is neither a map nor a list");
            return Vec::new();
        }
    };

    values
        .into_iter()
        .filter(|v| !v.is_null())
        .filter_map(|v| match serde_json::from_value::<ItemRecord>(v) {
            Ok(item) => Some(OutfitItem {
                name: item.name.unwrap_or_default(),
                category: item.category.unwrap_or_default(),
                price: item.price.unwrap_or(0.0),
                image: item.image.unwrap_or_default(),
                affiliate_link: item.affiliate_link.unwrap_or_default(),
            }),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Skipping malformed outfit item");
                None
            }
        })
        .collect()
}

// ── Decoding helpers ────────────────────────────────────────────────

fn decode<T: for<'de> Deserialize<'de>>(key: &str, value: &Value) -> Result<T, NormalizeError> {
    if !value.is_object() {
        return Err(NormalizeError::NotAnObject {
            key: key.to_string(),
        });
    }
    T::deserialize(value).map_err(|e| NormalizeError::Malformed {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn missing(key: &str, field: &'static str) -> NormalizeError {
    NormalizeError::MissingField {
        key: key.to_string(),
        field,
    }
}

/// Read a price stored as a number or a numeric string
fn parse_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|p| p.is_finite()),
        _ => None,
    }
}

fn strict_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    parse_price(&value)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid price: {value}")))
}

fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_price(&value))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_bool())
}

/// Sizes as a list or a keyed map (sparse array); numbers are stringified,
/// anything else is dropped
fn lenient_sizes<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Vec<Value> = match Value::deserialize(deserializer)? {
        Value::Array(list) => list,
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        _ => return Ok(None),
    };
    let sizes = values
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect();
    Ok(Some(sizes))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snap(value: Value) -> Snapshot {
        snapshot_from_value(value)
    }

    #[test]
    fn test_absent_snapshot_is_empty() {
        assert!(normalize_products(&None).is_empty());
        assert!(normalize_outfits(&None).is_empty());
        assert!(normalize_products(&snap(Value::Null)).is_empty());
    }

    #[test]
    fn test_product_scenario() {
        let snapshot = snap(json!({"k1": {"name": "Tee", "price": 10, "category": "Tops"}}));
        let products = normalize_products(&snapshot);

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, "k1");
        assert_eq!(products[0].price, 10.0);
        assert_eq!(products[0].category, "Tops");
        assert!(products[0].sizes.is_empty());
        assert!(!products[0].is_new);
    }

    #[test]
    fn test_one_entity_per_key_in_order() {
        let snapshot = snap(json!({
            "-b": {"name": "B", "price": 2},
            "-a": {"name": "A", "price": 1},
            "-c": {"name": "C", "price": 3, "sizes": ["S", "M"], "isNew": true}
        }));
        let ids: Vec<_> = normalize_products(&snapshot)
            .into_iter()
            .map(|p| p.id)
            .collect();

        assert_eq!(ids, vec!["-b", "-a", "-c"]);
    }

    #[test]
    fn test_price_as_string_accepted() {
        let snapshot = snap(json!({"k": {"name": "Scarf", "price": "24.50", "originalPrice": "oops"}}));
        let products = normalize_products(&snapshot);

        assert_eq!(products[0].price, 24.5);
        assert_eq!(products[0].original_price, None);
    }

    #[test]
    fn test_rejects_missing_required_fields() {
        let err = try_normalize_product("k", &json!({"price": 3})).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::MissingField {
                key: "k".to_string(),
                field: "name"
            }
        );

        let err = try_normalize_product("k", &json!({"name": "x", "price": "abc"})).unwrap_err();
        assert!(matches!(err, NormalizeError::Malformed { .. }));

        let err = try_normalize_outfit("k", &json!("just a string")).unwrap_err();
        assert!(matches!(err, NormalizeError::NotAnObject { .. }));
    }

    #[test]
    fn test_optional_fields_with_unexpected_types_are_kept() {
        let snapshot = snap(json!({
            "shoe": {"name": "Loafer", "price": 90, "sizes": [38, 39, 40]},
            "sparse": {"name": "Tee", "price": 12, "sizes": {"0": "S", "2": "L"}},
            "flag": {"name": "Cap", "price": 8, "isNew": "true", "isSale": 1},
            "odd": {"name": "Belt", "price": 15, "category": 7, "description": ["x"], "sizes": "M"}
        }));
        let products = normalize_products(&snapshot);

        let ids: Vec<_> = products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["shoe", "sparse", "flag", "odd"]);
        assert_eq!(products[0].sizes, vec!["38", "39", "40"]);
        assert_eq!(products[1].sizes, vec!["S", "L"]);
        assert!(!products[2].is_new);
        assert!(!products[2].is_sale);
        assert_eq!(products[3].category, "");
        assert_eq!(products[3].description, "");
        assert!(products[3].sizes.is_empty());
    }

    #[test]
    fn test_outfit_item_with_odd_fields_is_kept() {
        let snapshot = snap(json!({
            "o1": {"name": "Look", "image": 3, "items": [{"name": "Tee", "price": 10, "image": false}]}
        }));
        let outfits = normalize_outfits(&snapshot);

        assert_eq!(outfits[0].image, "");
        assert_eq!(outfits[0].items.len(), 1);
        assert_eq!(outfits[0].items[0].image, "");
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let snapshot = snap(json!({
            "good": {"name": "Belt", "price": 15},
            "bad": 42
        }));
        let products = normalize_products(&snapshot);

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, "good");
    }

    #[test]
    fn test_outfit_keyed_items_flattened() {
        let snapshot = snap(json!({
            "o1": {
                "name": "City",
                "image": "city.jpg",
                "items": {
                    "b": {"name": "Coat", "price": 120, "image": "coat.jpg"},
                    "a": {"name": "Boots", "price": 80, "image": "boots.jpg"}
                },
                "totalPrice": 200
            }
        }));
        let outfits = normalize_outfits(&snapshot);

        assert_eq!(outfits.len(), 1);
        let items = &outfits[0].items;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Coat");
        assert_eq!(items[1].name, "Boots");
        assert_eq!(outfits[0].total_price, Some(200.0));
    }

    #[test]
    fn test_outfit_items_list_and_missing() {
        let snapshot = snap(json!({
            "o1": {"name": "Listed", "items": [{"name": "Tee", "price": 10}, null]},
            "o2": {"name": "Bare"}
        }));
        let outfits = normalize_outfits(&snapshot);

        assert_eq!(outfits[0].items.len(), 1);
        assert!(outfits[1].items.is_empty());
        assert_eq!(outfits[1].total_price, None);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let snapshot = snap(json!({
            "p1": {"name": "Tee", "price": 10, "category": "Tops"},
            "p2": {"name": "Jeans", "price": 40, "category": "Bottoms"}
        }));

        assert_eq!(normalize_products(&snapshot), normalize_products(&snapshot));
        assert_eq!(
            normalize(EntityKind::Product, &snapshot),
            normalize(EntityKind::Product, &snapshot)
        );
    }

    #[test]
    fn test_tagged_entities() {
        let snapshot = snap(json!({"o": {"name": "Look"}}));
        let entities = normalize(EntityKind::Outfit, &snapshot);

        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].id(), "o");
        assert_eq!(entities[0].kind(), EntityKind::Outfit);
    }
}
