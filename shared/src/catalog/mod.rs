//! Catalog aggregation
//!
//! Pure functions deriving display data from normalized entity lists:
//! category sets, counts, outfit totals, filtering, search and sorting.
//! Nothing here is memoized; callers recompute on every snapshot.

mod view;

pub use view::{CollectionState, CollectionStatus, ViewModel};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{Outfit, Product};
use crate::money;

// ── Aggregates ──────────────────────────────────────────────────────

/// Distinct product categories, in first-seen order
pub fn categories(products: &[Product]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for product in products {
        if !seen.iter().any(|c| c == &product.category) {
            seen.push(product.category.clone());
        }
    }
    seen
}

/// Collection cardinalities shown on the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub products: usize,
    pub outfits: usize,
    pub categories: usize,
}

impl Counts {
    pub fn of(products: &[Product], outfits: &[Outfit]) -> Self {
        Self {
            products: products.len(),
            outfits: outfits.len(),
            categories: categories(products).len(),
        }
    }
}

/// Price shown for an outfit
///
/// The stored `totalPrice` when present, else the item prices summed now.
/// Both agree for any outfit written through the admin commands.
pub fn outfit_display_total(outfit: &Outfit) -> f64 {
    outfit
        .total_price
        .unwrap_or_else(|| money::sum_prices(outfit.items.iter().map(|i| i.price)))
}

// ── Filtering ───────────────────────────────────────────────────────

/// Category selector value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    /// The distinguished "all" selector
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    pub fn only(category: impl Into<String>) -> Self {
        Self::Only(category.into())
    }
}

impl FromStr for CategoryFilter {
    type Err = std::convert::Infallible;

    /// `"all"` (any case) or an empty selector means no filtering
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            Ok(Self::Only(s.to_string()))
        }
    }
}

/// Admin table filter: exact, case-sensitive category match
pub fn filter_admin(products: &[Product], filter: &CategoryFilter) -> Vec<Product> {
    match filter {
        CategoryFilter::All => products.to_vec(),
        CategoryFilter::Only(category) => products
            .iter()
            .filter(|p| &p.category == category)
            .cloned()
            .collect(),
    }
}

/// Storefront filter: case-insensitive category match
pub fn filter_public(products: &[Product], filter: &CategoryFilter) -> Vec<Product> {
    match filter {
        CategoryFilter::All => products.to_vec(),
        CategoryFilter::Only(category) => {
            let wanted = category.to_lowercase();
            products
                .iter()
                .filter(|p| p.category.to_lowercase() == wanted)
                .cloned()
                .collect()
        }
    }
}

/// Storefront search over name, description and category
///
/// Case-insensitive substring match. A blank query returns everything.
pub fn search(products: &[Product], query: &str) -> Vec<Product> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return products.to_vec();
    }
    products
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle)
                || p.description.to_lowercase().contains(&needle)
                || p.category.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

// ── Sorting ─────────────────────────────────────────────────────────

/// Storefront sort order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Stored order, untouched
    #[default]
    Featured,
    /// New arrivals first (no timestamps are modeled)
    Newest,
    PriceLow,
    PriceHigh,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::Newest => "newest",
            Self::PriceLow => "price_low",
            Self::PriceHigh => "price_high",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown sort key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown sort key: {0}")]
pub struct UnknownSortKey(pub String);

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "featured" => Ok(Self::Featured),
            "newest" => Ok(Self::Newest),
            "price_low" => Ok(Self::PriceLow),
            "price_high" => Ok(Self::PriceHigh),
            other => Err(UnknownSortKey(other.to_string())),
        }
    }
}

/// Anything the storefront can sort
pub trait Sortable {
    fn sort_price(&self) -> f64;
    fn sort_is_new(&self) -> bool;
}

impl Sortable for Product {
    fn sort_price(&self) -> f64 {
        self.price
    }

    fn sort_is_new(&self) -> bool {
        self.is_new
    }
}

/// Return a sorted copy. All orders are stable.
pub fn sort_by<T: Sortable + Clone>(items: &[T], key: SortKey) -> Vec<T> {
    let mut sorted = items.to_vec();
    match key {
        SortKey::Featured => {}
        SortKey::Newest => sorted.sort_by_key(|item| !item.sort_is_new()),
        SortKey::PriceLow => sorted.sort_by(|a, b| a.sort_price().total_cmp(&b.sort_price())),
        SortKey::PriceHigh => sorted.sort_by(|a, b| b.sort_price().total_cmp(&a.sort_price())),
    }
    sorted
}

/// Sorted copy of a product list
pub fn sort_products(products: &[Product], key: SortKey) -> Vec<Product> {
    sort_by(products, key)
}

// ── Catalog cards ───────────────────────────────────────────────────

/// What a catalog card was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Product,
    Outfit,
}

/// One tile in the storefront grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogCard {
    pub id: String,
    pub kind: CardKind,
    pub name: String,
    pub image: String,
    pub price: f64,
    pub original_price: Option<f64>,
    pub category: Option<String>,
    pub is_new: bool,
    pub is_sale: bool,
    /// Number of products bundled (outfits only)
    pub item_count: usize,
}

impl From<&Product> for CatalogCard {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id.clone(),
            kind: CardKind::Product,
            name: p.name.clone(),
            image: p.image.clone(),
            price: p.price,
            original_price: p.original_price,
            category: Some(p.category.clone()),
            is_new: p.is_new,
            is_sale: p.is_sale,
            item_count: 0,
        }
    }
}

impl From<&Outfit> for CatalogCard {
    fn from(o: &Outfit) -> Self {
        Self {
            id: o.id.clone(),
            kind: CardKind::Outfit,
            name: o.name.clone(),
            image: o.image.clone(),
            price: outfit_display_total(o),
            original_price: None,
            category: None,
            is_new: false,
            is_sale: false,
            item_count: o.items.len(),
        }
    }
}

impl Sortable for CatalogCard {
    fn sort_price(&self) -> f64 {
        self.price
    }

    fn sort_is_new(&self) -> bool {
        self.is_new
    }
}

/// Storefront grid: products first, then outfits, each in stored order
pub fn catalog_cards(products: &[Product], outfits: &[Outfit]) -> Vec<CatalogCard> {
    products
        .iter()
        .map(CatalogCard::from)
        .chain(outfits.iter().map(CatalogCard::from))
        .collect()
}
