//! Shared types for Lookbook
//!
//! Domain models, snapshot normalization, catalog aggregation and the
//! product-to-outfit join. Everything here is synchronous and free of I/O,
//! so both the client runtime and any renderer can depend on it.

pub mod catalog;
pub mod error;
pub mod join;
pub mod models;
pub mod money;
pub mod snapshot;
pub mod validation;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use catalog::{CategoryFilter, Counts, SortKey, ViewModel};
pub use error::SyncError;
pub use join::{JoinOutcome, OutfitDraft};
pub use models::{Category, Outfit, OutfitInput, OutfitItem, Product, ProductInput};
pub use snapshot::{Entity, EntityKind, NormalizeError, Snapshot};
pub use validation::ValidationError;
