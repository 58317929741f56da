//! View model rebuilt on every snapshot

use crate::error::SyncError;
use crate::models::{Outfit, Product};

use super::{CatalogCard, Counts, catalog_cards, categories};

/// Lifecycle of one collection inside a view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CollectionStatus {
    /// The view does not watch this collection
    Unwatched,
    /// Subscribed, no snapshot yet
    #[default]
    Loading,
    /// At least one snapshot applied
    Ready,
    /// Subscription reported an error; entities keep their last value
    Failed(SyncError),
    /// Stream ended without an error
    Closed,
}

/// Entities of one collection plus its status
///
/// Until the first snapshot arrives the list is empty, so a view with one
/// collection loaded and another pending still renders.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionState<T> {
    pub entities: Vec<T>,
    pub status: CollectionStatus,
}

impl<T> Default for CollectionState<T> {
    fn default() -> Self {
        Self::loading()
    }
}

impl<T> CollectionState<T> {
    pub fn loading() -> Self {
        Self {
            entities: Vec::new(),
            status: CollectionStatus::Loading,
        }
    }

    pub fn unwatched() -> Self {
        Self {
            entities: Vec::new(),
            status: CollectionStatus::Unwatched,
        }
    }

    /// Replace the whole list (snapshots are whole-collection reads)
    pub fn replace(&mut self, entities: Vec<T>) {
        self.entities = entities;
        self.status = CollectionStatus::Ready;
    }

    pub fn fail(&mut self, error: SyncError) {
        self.status = CollectionStatus::Failed(error);
    }

    pub fn close(&mut self) {
        if !matches!(self.status, CollectionStatus::Failed(_)) {
            self.status = CollectionStatus::Closed;
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == CollectionStatus::Ready
    }

    pub fn error(&self) -> Option<&SyncError> {
        match &self.status {
            CollectionStatus::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Everything a catalog or admin view renders
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub products: CollectionState<Product>,
    pub outfits: CollectionState<Outfit>,
    /// Distinct product categories, first-seen order
    pub categories: Vec<String>,
    pub counts: Counts,
}

impl Default for ViewModel {
    fn default() -> Self {
        Self::rebuild(CollectionState::loading(), CollectionState::loading())
    }
}

impl ViewModel {
    /// Derive aggregates from the two collections
    pub fn rebuild(products: CollectionState<Product>, outfits: CollectionState<Outfit>) -> Self {
        let categories = categories(&products.entities);
        let counts = Counts::of(&products.entities, &outfits.entities);
        Self {
            products,
            outfits,
            categories,
            counts,
        }
    }

    /// Copy with the product list replaced
    pub fn with_products(&self, products: Vec<Product>) -> Self {
        let mut state = self.products.clone();
        state.replace(products);
        Self::rebuild(state, self.outfits.clone())
    }

    /// Copy with the outfit list replaced
    pub fn with_outfits(&self, outfits: Vec<Outfit>) -> Self {
        let mut state = self.outfits.clone();
        state.replace(outfits);
        Self::rebuild(self.products.clone(), state)
    }

    /// Storefront grid for the current data
    pub fn cards(&self) -> Vec<CatalogCard> {
        catalog_cards(&self.products.entities, &self.outfits.entities)
    }

    /// Every collection that has either loaded or is not watched
    pub fn is_settled(&self) -> bool {
        [&self.products.status, &self.outfits.status]
            .iter()
            .all(|s| !matches!(s, CollectionStatus::Loading))
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.entities.iter().find(|p| p.id == id)
    }

    pub fn outfit(&self, id: &str) -> Option<&Outfit> {
        self.outfits.entities.iter().find(|o| o.id == id)
    }
}
