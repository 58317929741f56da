//! Outfit Model

use serde::{Deserialize, Serialize};

use crate::models::Product;
use crate::money;

/// Denormalized copy of a product embedded in an outfit
///
/// Carries no reference back to the source product, so later product edits
/// are not reflected here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutfitItem {
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub price: f64,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub affiliate_link: String,
}

impl From<&Product> for OutfitItem {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            category: product.category.clone(),
            price: product.price,
            image: product.image.clone(),
            affiliate_link: product.affiliate_link.clone(),
        }
    }
}

/// Outfit entity (curated bundle of products)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outfit {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Main image URI
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub items: Vec<OutfitItem>,
    /// Sum of item prices, stored at write time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
}

impl Outfit {
    /// Write payload carrying this outfit's current fields
    pub fn to_input(&self) -> OutfitInput {
        OutfitInput {
            name: self.name.clone(),
            description: self.description.clone(),
            image: self.image.clone(),
            items: self.items.clone(),
        }
    }
}

/// Create / update outfit payload
///
/// Has no total: [`OutfitInput::to_record`] computes it from the items on
/// every write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutfitInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub image: String,
    #[serde(default)]
    pub items: Vec<OutfitItem>,
}

/// Stored outfit record (what actually goes over the wire)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutfitRecord<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub image: &'a str,
    pub items: &'a [OutfitItem],
    pub total_price: f64,
}

impl OutfitInput {
    /// Sum of item prices
    pub fn total_price(&self) -> f64 {
        money::sum_prices(self.items.iter().map(|i| i.price))
    }

    /// Record to persist, with `totalPrice` recomputed
    pub fn to_record(&self) -> OutfitRecord<'_> {
        OutfitRecord {
            name: &self.name,
            description: &self.description,
            image: &self.image,
            items: &self.items,
            total_price: self.total_price(),
        }
    }
}
