//! Product Model

use serde::{Deserialize, Serialize};

/// Product entity
///
/// `id` is the key the remote store assigned at creation. Every other field
/// is copied verbatim from the stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    /// Category name as stored (usually one of [`super::Category`])
    pub category: String,
    /// Image URI
    pub image: String,
    /// Price before sale, shown struck through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_sale: bool,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub description: String,
    /// Affiliate URI the storefront links out to
    #[serde(default)]
    pub affiliate_link: String,
}

impl Product {
    /// Write payload carrying this product's current fields
    pub fn to_input(&self) -> ProductInput {
        ProductInput {
            name: self.name.clone(),
            price: self.price,
            category: self.category.clone(),
            image: self.image.clone(),
            original_price: self.original_price,
            is_new: self.is_new,
            is_sale: self.is_sale,
            sizes: self.sizes.clone(),
            description: self.description.clone(),
            affiliate_link: self.affiliate_link.clone(),
        }
    }
}

/// Create / update product payload
///
/// Updates are full-record overwrites, so the same payload serves both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub price: f64,
    pub category: String,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_sale: bool,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub affiliate_link: String,
}

impl ProductInput {
    /// Attach the store-assigned key
    pub fn into_product(self, id: impl Into<String>) -> Product {
        Product {
            id: id.into(),
            name: self.name,
            price: self.price,
            category: self.category,
            image: self.image,
            original_price: self.original_price,
            is_new: self.is_new,
            is_sale: self.is_sale,
            sizes: self.sizes,
            description: self.description,
            affiliate_link: self.affiliate_link,
        }
    }
}
