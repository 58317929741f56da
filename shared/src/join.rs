//! Product to outfit join
//!
//! Outfit items are denormalized copies of products. Selecting a product for
//! an outfit looks it up by id among the loaded products and copies its
//! display fields; items carry no back-reference, so "already in this outfit"
//! is decided by matching name and image.

use crate::models::{Outfit, OutfitInput, OutfitItem, Product};
use crate::money;

/// Copy the product with `product_id` into an outfit item
///
/// `None` when the id is not among `products` (stale selection).
pub fn join_item(product_id: &str, products: &[Product]) -> Option<OutfitItem> {
    let item = products
        .iter()
        .find(|p| p.id == product_id)
        .map(OutfitItem::from);
    if item.is_none() {
        tracing::debug!(product_id = %product_id, "Join miss: product not loaded");
    }
    item
}

/// Same product by the name + image heuristic
pub fn same_item(a: &OutfitItem, b: &OutfitItem) -> bool {
    a.name == b.name && a.image == b.image
}

/// Result of adding a product to a draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Added,
    AlreadyPresent,
    /// The id matched no loaded product; the draft is unchanged
    Missing,
}

/// Outfit being assembled in the admin form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutfitDraft {
    pub name: String,
    pub description: String,
    pub image: String,
    items: Vec<OutfitItem>,
}

impl OutfitDraft {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            ..Default::default()
        }
    }

    /// Draft pre-filled from an existing outfit, for editing
    pub fn from_outfit(outfit: &Outfit) -> Self {
        Self {
            name: outfit.name.clone(),
            description: outfit.description.clone(),
            image: outfit.image.clone(),
            items: outfit.items.clone(),
        }
    }

    pub fn items(&self) -> &[OutfitItem] {
        &self.items
    }

    /// Join the product with `product_id` and append it
    pub fn add_product(&mut self, product_id: &str, products: &[Product]) -> JoinOutcome {
        match join_item(product_id, products) {
            Some(item) => self.add_item(item),
            None => JoinOutcome::Missing,
        }
    }

    /// Append an item unless an equivalent one is present
    pub fn add_item(&mut self, item: OutfitItem) -> JoinOutcome {
        if self.contains(&item) {
            return JoinOutcome::AlreadyPresent;
        }
        self.items.push(item);
        JoinOutcome::Added
    }

    /// Remove the item at `index`, if any
    pub fn remove_item(&mut self, index: usize) -> Option<OutfitItem> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn contains(&self, item: &OutfitItem) -> bool {
        self.items.iter().any(|existing| same_item(existing, item))
    }

    /// Products that can still be added (not present by name + image)
    pub fn selectable<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products
            .iter()
            .filter(|p| !self.contains(&OutfitItem::from(*p)))
            .collect()
    }

    /// Running total of the items
    pub fn total(&self) -> f64 {
        money::sum_prices(self.items.iter().map(|i| i.price))
    }

    pub fn to_input(&self) -> OutfitInput {
        self.clone().into_input()
    }

    pub fn into_input(self) -> OutfitInput {
        OutfitInput {
            name: self.name,
            description: self.description,
            image: self.image,
            items: self.items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, name: &str, price: f64) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            price,
            category: "Tops".to_string(),
            image: format!("https://img.example/{id}.jpg"),
            original_price: None,
            is_new: false,
            is_sale: false,
            sizes: vec![],
            description: String::new(),
            affiliate_link: format!("https://shop.example/{id}"),
        }
    }

    #[test]
    fn test_join_copies_display_fields() {
        let products = vec![product("p1", "Linen Shirt", 39.9)];
        let item = join_item("p1", &products).unwrap();

        assert_eq!(item.name, "Linen Shirt");
        assert_eq!(item.price, 39.9);
        assert_eq!(item.image, "https://img.example/p1.jpg");
        assert_eq!(item.affiliate_link, "https://shop.example/p1");
        assert_eq!(item.category, "Tops");
    }

    #[test]
    fn test_join_miss() {
        let products = vec![product("p1", "Linen Shirt", 39.9)];
        assert!(join_item("gone", &products).is_none());

        let mut draft = OutfitDraft::new("Look", "https://img.example/look.jpg");
        assert_eq!(draft.add_product("gone", &products), JoinOutcome::Missing);
        assert!(draft.items().is_empty());
    }

    #[test]
    fn test_draft_rejects_duplicates_and_totals() {
        let products = vec![product("p1", "Jeans", 20.0), product("p2", "Jacket", 30.0)];
        let mut draft = OutfitDraft::new("Weekend", "https://img.example/weekend.jpg");

        assert_eq!(draft.add_product("p1", &products), JoinOutcome::Added);
        assert_eq!(draft.add_product("p2", &products), JoinOutcome::Added);
        assert_eq!(draft.add_product("p1", &products), JoinOutcome::AlreadyPresent);

        assert_eq!(draft.items().len(), 2);
        assert_eq!(draft.total(), 50.0);
        assert!(draft.selectable(&products).is_empty());
    }

    #[test]
    fn test_selectable_and_remove() {
        let products = vec![product("p1", "Jeans", 20.0), product("p2", "Jacket", 30.0)];
        let mut draft = OutfitDraft::new("Weekend", "https://img.example/weekend.jpg");
        draft.add_product("p1", &products);

        let ids: Vec<_> = draft.selectable(&products).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p2"]);

        assert_eq!(draft.remove_item(5), None);
        assert_eq!(draft.remove_item(0).map(|i| i.name), Some("Jeans".to_string()));
        assert_eq!(draft.selectable(&products).len(), 2);
    }

    #[test]
    fn test_edited_product_no_longer_matches() {
        // Items keep the values they were copied with
        let mut products = vec![product("p1", "Jeans", 20.0)];
        let mut draft = OutfitDraft::new("Weekend", "https://img.example/weekend.jpg");
        draft.add_product("p1", &products);

        products[0].name = "Slim Jeans".to_string();
        assert_eq!(draft.items()[0].name, "Jeans");
        assert_eq!(draft.add_product("p1", &products), JoinOutcome::Added);
    }

    #[test]
    fn test_round_trip_through_outfit() {
        let products = vec![product("p1", "Jeans", 20.0), product("p2", "Jacket", 30.0)];
        let mut draft = OutfitDraft::new("Weekend", "https://img.example/weekend.jpg");
        draft.description = "Casual".to_string();
        draft.add_product("p1", &products);
        draft.add_product("p2", &products);

        let input = draft.to_input();
        assert_eq!(input.total_price(), 50.0);

        let outfit = Outfit {
            id: "o1".to_string(),
            name: input.name.clone(),
            description: input.description.clone(),
            image: input.image.clone(),
            items: input.items.clone(),
            total_price: Some(input.total_price()),
        };
        assert_eq!(OutfitDraft::from_outfit(&outfit), draft);
    }
}
