//! Lookbook Client - realtime catalog sync for the storefront and admin dashboard
//!
//! - [`store`]: remote collection client trait with in-memory and REST backends
//! - [`sync`]: live views that keep a [`ViewModel`](shared::ViewModel) in step with the store
//! - [`commands`]: validated admin create / update / delete
//! - [`auth`]: admin sign-in

pub mod auth;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod store;
pub mod sync;

pub use auth::{AuthError, AuthProvider, Credential, MemoryAuth, PasswordAuth, Session};
pub use commands::{CatalogCommands, ConfirmedDelete, DeleteRequest, DeleteTarget};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use logger::init_logger;
pub use store::{
    MemoryStore, ReconnectPolicy, RemoteCollectionClient, RestStore, SnapshotEvent, Subscription,
};
pub use sync::{LiveView, LiveViewBuilder};

// Re-export shared types for convenience
pub use shared::{
    Category, CategoryFilter, Counts, Entity, EntityKind, JoinOutcome, Outfit, OutfitDraft,
    OutfitInput, OutfitItem, Product, ProductInput, Snapshot, SortKey, SyncError, ViewModel,
};
