//! Remote collection client
//!
//! The realtime store is injected everywhere as a [`RemoteCollectionClient`];
//! nothing in this crate reaches for a global handle. Two backends ship:
//!
//! - [`MemoryStore`] - in-process store, used by tests and local runs
//! - [`RestStore`] - realtime database REST API with server-sent events
//!
//! Subscriptions are streams of whole-collection [`SnapshotEvent`]s. Dropping
//! a [`Subscription`] (or calling [`Subscription::unsubscribe`]) cancels it;
//! the backend task feeding it stops on its next wakeup.

mod memory;
mod push_key;
mod rest;
pub mod sse;
pub mod tree;

pub use memory::MemoryStore;
pub use push_key::PushKeyGenerator;
pub use rest::{ReconnectPolicy, RestStore};

use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;
use shared::{Snapshot, SyncError};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::{ClientError, ClientResult};

/// Per-subscription channel capacity
const SUBSCRIPTION_BUFFER: usize = 16;

/// One delivery on a subscription
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotEvent {
    /// Current contents of the whole path
    Snapshot(Snapshot),
    /// The store rejected or lost the subscription; no more events follow
    Error(SyncError),
}

/// Realtime store operations
#[async_trait]
pub trait RemoteCollectionClient: Send + Sync {
    /// Open a snapshot stream on `path`
    ///
    /// Transport and permission failures arrive on the stream as
    /// [`SnapshotEvent::Error`]; only an unusable path fails here.
    async fn subscribe(&self, path: &str) -> ClientResult<Subscription>;

    /// Append `value` under a fresh key of `collection_path`, returning the key
    async fn create(&self, collection_path: &str, value: Value) -> ClientResult<String>;

    /// Overwrite the record at `entity_path`
    async fn update(&self, entity_path: &str, value: Value) -> ClientResult<()>;

    /// Remove `entity_path` entirely
    async fn delete(&self, entity_path: &str) -> ClientResult<()>;
}

#[async_trait]
impl<T: RemoteCollectionClient + ?Sized> RemoteCollectionClient for Arc<T> {
    async fn subscribe(&self, path: &str) -> ClientResult<Subscription> {
        (**self).subscribe(path).await
    }

    async fn create(&self, collection_path: &str, value: Value) -> ClientResult<String> {
        (**self).create(collection_path, value).await
    }

    async fn update(&self, entity_path: &str, value: Value) -> ClientResult<()> {
        (**self).update(entity_path, value).await
    }

    async fn delete(&self, entity_path: &str) -> ClientResult<()> {
        (**self).delete(entity_path).await
    }
}

// ============================================================================
// Subscription
// ============================================================================

/// Cancellable snapshot stream for one path
#[derive(Debug)]
pub struct Subscription {
    path: String,
    rx: mpsc::Receiver<SnapshotEvent>,
    cancel: CancellationToken,
}

impl Subscription {
    /// Create a connected sink / subscription pair for a backend
    pub fn channel(path: impl Into<String>) -> (SubscriptionSink, Subscription) {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let cancel = CancellationToken::new();
        let sink = SubscriptionSink {
            tx,
            cancel: cancel.clone(),
        };
        let subscription = Subscription {
            path: path.into(),
            rx,
            cancel,
        };
        (sink, subscription)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Next event, `None` once the stream ended or was cancelled
    pub async fn recv(&mut self) -> Option<SnapshotEvent> {
        if self.cancel.is_cancelled() {
            return None;
        }
        self.rx.recv().await
    }

    /// Stop receiving and release the backend listener
    pub fn unsubscribe(self) {
        drop(self);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Stream for Subscription {
    type Item = SnapshotEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.cancel.is_cancelled() {
            return Poll::Ready(None);
        }
        this.rx.poll_recv(cx)
    }
}

/// Backend half of a [`Subscription`]
#[derive(Debug, Clone)]
pub struct SubscriptionSink {
    tx: mpsc::Sender<SnapshotEvent>,
    cancel: CancellationToken,
}

impl SubscriptionSink {
    /// Deliver an event. Returns `false` once the subscriber is gone.
    pub async fn send(&self, event: SnapshotEvent) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        self.tx.send(event).await.is_ok()
    }

    /// Resolves when the subscriber cancels
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.tx.is_closed()
    }
}

// ============================================================================
// Paths
// ============================================================================

/// Trim surrounding slashes and collapse empty segments
pub fn normalize_path(path: &str) -> String {
    segments(path).join("/")
}

/// Non-empty segments of a path
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// `collection/key`
pub fn child_path(collection: &str, key: &str) -> String {
    let collection = normalize_path(collection);
    if collection.is_empty() {
        key.to_string()
    } else {
        format!("{collection}/{key}")
    }
}

/// `ancestor` equals `path` or contains it
pub fn is_ancestor_or_self(ancestor: &str, path: &str) -> bool {
    ancestor.is_empty()
        || ancestor == path
        || (path.starts_with(ancestor) && path.as_bytes().get(ancestor.len()) == Some(&b'/'))
}

/// A write at one path changes what a subscriber at the other sees
pub fn paths_overlap(a: &str, b: &str) -> bool {
    is_ancestor_or_self(a, b) || is_ancestor_or_self(b, a)
}

/// Characters the realtime database forbids in keys
const FORBIDDEN_KEY_CHARS: &[char] = &['.', '$', '#', '[', ']', '/'];

/// Validate one path segment (an entity id)
pub fn validate_key(key: &str) -> ClientResult<()> {
    if key.trim().is_empty() {
        return Err(ClientError::Validation(shared::ValidationError::new(
            "id",
            "must not be empty",
        )));
    }
    if let Some(c) = key.chars().find(|c| FORBIDDEN_KEY_CHARS.contains(c) || c.is_control()) {
        return Err(ClientError::Validation(shared::ValidationError::new(
            "id",
            format!("contains forbidden character {c:?}"),
        )));
    }
    Ok(())
}

/// Validate a path used for subscribe / write
pub(crate) fn validate_path(path: &str) -> ClientResult<String> {
    let normalized = normalize_path(path);
    for segment in segments(&normalized) {
        validate_key(segment)?;
    }
    Ok(normalized)
}
