//! Admin write commands
//!
//! Create, update and delete for products and outfits. Every payload is
//! validated before anything is sent; a rejected payload never reaches the
//! store. Commands do not touch any view: the store echoes the write back
//! through each view's subscription.
//!
//! Deletes need an explicit confirmation step: build a [`DeleteRequest`],
//! show its [`prompt`](DeleteRequest::prompt), and only a
//! [`ConfirmedDelete`] obtained from [`DeleteRequest::confirm`] can be
//! issued. The entity kind is part of the type, so a confirmed product
//! delete cannot be passed to the outfit command.

use serde::Serialize;
use shared::validation::{validate_outfit, validate_product};
use shared::{EntityKind, Outfit, OutfitInput, Product, ProductInput};
use std::marker::PhantomData;

use crate::store::{RemoteCollectionClient, child_path, validate_key};
use crate::{ClientConfig, ClientResult};

/// Entity kinds that can be deleted through [`CatalogCommands`]
pub trait DeleteTarget {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    /// Name shown in the confirmation prompt
    fn label(&self) -> &str;
}

impl DeleteTarget for Product {
    const KIND: EntityKind = EntityKind::Product;

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.name
    }
}

impl DeleteTarget for Outfit {
    const KIND: EntityKind = EntityKind::Outfit;

    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.name
    }
}

/// Delete awaiting confirmation
#[derive(Debug, Clone)]
pub struct DeleteRequest<T> {
    id: String,
    label: Option<String>,
    _kind: PhantomData<fn() -> T>,
}

impl<T: DeleteTarget> DeleteRequest<T> {
    /// Request by id alone
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            _kind: PhantomData,
        }
    }

    /// Request for a loaded entity (prompt shows its name)
    pub fn of(entity: &T) -> Self {
        Self {
            id: entity.id().to_string(),
            label: Some(entity.label().to_string()),
            _kind: PhantomData,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Confirmation text for the user
    pub fn prompt(&self) -> String {
        let noun = match T::KIND {
            EntityKind::Product => "product",
            EntityKind::Outfit => "outfit",
        };
        match &self.label {
            Some(label) => format!("Delete {noun} \"{label}\"? This cannot be undone."),
            None => format!("Delete {noun} {}? This cannot be undone.", self.id),
        }
    }

    /// The user accepted the prompt
    pub fn confirm(self) -> ConfirmedDelete<T> {
        ConfirmedDelete {
            id: self.id,
            _kind: PhantomData,
        }
    }
}

/// Delete the user has confirmed; only [`DeleteRequest::confirm`] builds one
#[derive(Debug, Clone)]
pub struct ConfirmedDelete<T> {
    id: String,
    _kind: PhantomData<fn() -> T>,
}

impl<T> ConfirmedDelete<T> {
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Admin CRUD commands over an injected store
#[derive(Debug, Clone)]
pub struct CatalogCommands<S> {
    store: S,
    products_path: String,
    outfits_path: String,
}

impl<S: RemoteCollectionClient> CatalogCommands<S> {
    pub fn new(store: S, config: &ClientConfig) -> Self {
        Self {
            store,
            products_path: config.products_path.clone(),
            outfits_path: config.outfits_path.clone(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn collection(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Product => &self.products_path,
            EntityKind::Outfit => &self.outfits_path,
        }
    }

    fn entity_path(&self, kind: EntityKind, id: &str) -> ClientResult<String> {
        validate_key(id)?;
        Ok(child_path(self.collection(kind), id))
    }

    // ========== Products ==========

    /// Create a product, returning its new id
    pub async fn create_product(&self, input: &ProductInput) -> ClientResult<String> {
        validate_product(input).inspect_err(|e| {
            tracing::warn!(field = %e.field, "Product rejected: {}", e.message);
        })?;
        self.create(EntityKind::Product, input).await
    }

    /// Overwrite product `id` with `input`
    pub async fn update_product(&self, id: &str, input: &ProductInput) -> ClientResult<()> {
        validate_product(input).inspect_err(|e| {
            tracing::warn!(id = %id, field = %e.field, "Product update rejected: {}", e.message);
        })?;
        self.update(EntityKind::Product, id, input).await
    }

    pub async fn delete_product(&self, confirmed: ConfirmedDelete<Product>) -> ClientResult<()> {
        self.delete(confirmed).await
    }

    // ========== Outfits ==========

    /// Create an outfit; `totalPrice` is computed from the items
    pub async fn create_outfit(&self, input: &OutfitInput) -> ClientResult<String> {
        validate_outfit(input).inspect_err(|e| {
            tracing::warn!(field = %e.field, "Outfit rejected: {}", e.message);
        })?;
        self.create(EntityKind::Outfit, &input.to_record()).await
    }

    /// Overwrite outfit `id`; `totalPrice` is recomputed from the items
    pub async fn update_outfit(&self, id: &str, input: &OutfitInput) -> ClientResult<()> {
        validate_outfit(input).inspect_err(|e| {
            tracing::warn!(id = %id, field = %e.field, "Outfit update rejected: {}", e.message);
        })?;
        self.update(EntityKind::Outfit, id, &input.to_record()).await
    }

    pub async fn delete_outfit(&self, confirmed: ConfirmedDelete<Outfit>) -> ClientResult<()> {
        self.delete(confirmed).await
    }

    // ========== Shared ==========

    async fn create<B: Serialize + Sync>(&self, kind: EntityKind, body: &B) -> ClientResult<String> {
        let collection = self.collection(kind);
        let value = serde_json::to_value(body)?;
        match self.store.create(collection, value).await {
            Ok(id) => {
                tracing::info!(kind = ?kind, id = %id, "Created");
                Ok(id)
            }
            Err(e) => {
                tracing::error!(kind = ?kind, path = %collection, "Create failed: {e}");
                Err(e)
            }
        }
    }

    async fn update<B: Serialize + Sync>(&self, kind: EntityKind, id: &str, body: &B) -> ClientResult<()> {
        let path = self.entity_path(kind, id)?;
        let value = serde_json::to_value(body)?;
        self.store
            .update(&path, value)
            .await
            .inspect(|_| tracing::info!(kind = ?kind, id = %id, "Updated"))
            .inspect_err(|e| tracing::error!(kind = ?kind, path = %path, "Update failed: {e}"))
    }

    async fn delete<T: DeleteTarget>(&self, confirmed: ConfirmedDelete<T>) -> ClientResult<()> {
        let path = self.entity_path(T::KIND, confirmed.id())?;
        self.store
            .delete(&path)
            .await
            .inspect(|_| tracing::info!(kind = ?T::KIND, id = %confirmed.id(), "Deleted"))
            .inspect_err(|e| tracing::error!(kind = ?T::KIND, path = %path, "Delete failed: {e}"))
    }
}
