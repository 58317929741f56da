//! Live views
//!
//! A [`LiveView`] keeps one consumer's [`ViewModel`] in step with the remote
//! store. It opens one subscription per watched path and runs a single
//! listener task that:
//!
//! 1. normalizes each snapshot into entities
//! 2. rebuilds the whole view model (no incremental patching)
//! 3. publishes it on a `watch` channel
//!
//! A failed subscription marks only its own collection `Failed`; the other
//! collection keeps loading. Closing the view (or dropping it) cancels every
//! subscription, and nothing is published afterwards.

use futures::stream::{self, BoxStream, SelectAll, StreamExt};
use shared::catalog::{CollectionState, CollectionStatus};
use shared::snapshot::{normalize_outfits, normalize_products};
use shared::{EntityKind, Outfit, Product, ViewModel};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::store::{RemoteCollectionClient, SnapshotEvent};
use crate::{ClientConfig, ClientError, ClientResult};

/// How long `close` waits for the listener before aborting it
const CLOSE_TIMEOUT: Duration = Duration::from_secs(3);

/// One subscription's events tagged with its route index; `None` marks the end
type Tagged = (usize, Option<SnapshotEvent>);

/// Builder for [`LiveView`]
pub struct LiveViewBuilder<'a, S: ?Sized> {
    store: &'a S,
    name: String,
    products: Option<String>,
    outfits: Option<String>,
}

impl<'a, S: RemoteCollectionClient + ?Sized> LiveViewBuilder<'a, S> {
    /// Label used in logs
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Watch the products collection at `path`
    pub fn products(mut self, path: impl Into<String>) -> Self {
        self.products = Some(path.into());
        self
    }

    /// Watch the outfits collection at `path`
    pub fn outfits(mut self, path: impl Into<String>) -> Self {
        self.outfits = Some(path.into());
        self
    }

    /// Watch both collections at their configured paths
    pub fn from_config(self, config: &ClientConfig) -> Self {
        self.products(config.products_path.clone())
            .outfits(config.outfits_path.clone())
    }

    /// Subscribe and start the listener task
    pub async fn spawn(self) -> ClientResult<LiveView> {
        let mut routes: Vec<(String, Vec<EntityKind>)> = Vec::new();
        for (kind, path) in [
            (EntityKind::Product, self.products.as_deref()),
            (EntityKind::Outfit, self.outfits.as_deref()),
        ] {
            let Some(path) = path else { continue };
            let path = crate::store::normalize_path(path);
            match routes.iter_mut().find(|(p, _)| *p == path) {
                Some((_, kinds)) => kinds.push(kind),
                None => routes.push((path, vec![kind])),
            }
        }
        if routes.is_empty() {
            return Err(ClientError::Config(format!(
                "view '{}' watches no collection",
                self.name
            )));
        }

        let mut streams: SelectAll<BoxStream<'static, Tagged>> = SelectAll::new();
        for (idx, (path, _)) in routes.iter().enumerate() {
            let subscription = self.store.subscribe(path).await?;
            tracing::debug!(view = %self.name, path = %path, "Subscribed");
            streams.push(
                subscription
                    .map(move |event| (idx, Some(event)))
                    .chain(stream::once(async move { (idx, None) }))
                    .boxed(),
            );
        }

        let state = ViewState {
            products: if self.products.is_some() {
                CollectionState::loading()
            } else {
                CollectionState::unwatched()
            },
            outfits: if self.outfits.is_some() {
                CollectionState::loading()
            } else {
                CollectionState::unwatched()
            },
        };
        let (tx, rx) = watch::channel(Arc::new(state.model()));
        let cancel = CancellationToken::new();

        let listener = Listener {
            name: self.name.clone(),
            routes: routes.into_iter().map(|(path, kinds)| Route { path, kinds }).collect(),
            state,
            tx,
        };
        let task = tokio::spawn(listener.run(streams, cancel.clone()));
        tracing::info!(view = %self.name, "Live view started");

        Ok(LiveView {
            name: self.name,
            model: rx,
            cancel,
            task: Some(task),
        })
    }
}

struct Route {
    path: String,
    kinds: Vec<EntityKind>,
}

struct ViewState {
    products: CollectionState<Product>,
    outfits: CollectionState<Outfit>,
}

impl ViewState {
    fn model(&self) -> ViewModel {
        ViewModel::rebuild(self.products.clone(), self.outfits.clone())
    }

    fn apply(&mut self, kind: EntityKind, event: Option<&SnapshotEvent>) {
        match (kind, event) {
            (EntityKind::Product, Some(SnapshotEvent::Snapshot(s))) => {
                self.products.replace(normalize_products(s))
            }
            (EntityKind::Outfit, Some(SnapshotEvent::Snapshot(s))) => {
                self.outfits.replace(normalize_outfits(s))
            }
            (EntityKind::Product, Some(SnapshotEvent::Error(e))) => self.products.fail(e.clone()),
            (EntityKind::Outfit, Some(SnapshotEvent::Error(e))) => self.outfits.fail(e.clone()),
            (EntityKind::Product, None) => self.products.close(),
            (EntityKind::Outfit, None) => self.outfits.close(),
        }
    }
}

/// The per-view listener task
struct Listener {
    name: String,
    routes: Vec<Route>,
    state: ViewState,
    tx: watch::Sender<Arc<ViewModel>>,
}

impl Listener {
    async fn run(mut self, mut streams: SelectAll<BoxStream<'static, Tagged>>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(view = %self.name, "Live view listener shutdown");
                    break;
                }
                next = streams.next() => {
                    let Some((idx, event)) = next else {
                        tracing::debug!(view = %self.name, "All subscriptions ended");
                        break;
                    };
                    self.handle(idx, event);
                }
            }
        }
    }

    fn handle(&mut self, idx: usize, event: Option<SnapshotEvent>) {
        let Some(route) = self.routes.get(idx) else {
            return;
        };
        match &event {
            Some(SnapshotEvent::Snapshot(s)) => {
                tracing::trace!(view = %self.name, path = %route.path, records = s.as_ref().map_or(0, |m| m.len()), "Snapshot");
            }
            Some(SnapshotEvent::Error(e)) => {
                tracing::warn!(view = %self.name, path = %route.path, "Subscription failed: {e}");
            }
            None => {
                tracing::debug!(view = %self.name, path = %route.path, "Subscription ended");
            }
        }
        for kind in &route.kinds {
            self.state.apply(*kind, event.as_ref());
        }
        self.tx.send_replace(Arc::new(self.state.model()));
    }
}

/// Live view model for one consumer
///
/// ```ignore
/// let mut view = LiveView::builder(&store).from_config(&config).spawn().await?;
/// let model = view.wait_for(|m| m.is_settled()).await;
/// view.close().await;
/// ```
pub struct LiveView {
    name: String,
    model: watch::Receiver<Arc<ViewModel>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl LiveView {
    pub fn builder<S: RemoteCollectionClient + ?Sized>(store: &S) -> LiveViewBuilder<'_, S> {
        LiveViewBuilder {
            store,
            name: "view".to_string(),
            products: None,
            outfits: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Latest published model
    pub fn model(&self) -> Arc<ViewModel> {
        self.model.borrow().clone()
    }

    /// Independent receiver for renderers
    pub fn watch(&self) -> watch::Receiver<Arc<ViewModel>> {
        self.model.clone()
    }

    /// Wait for the next publication; `None` once the view stopped
    pub async fn changed(&mut self) -> Option<Arc<ViewModel>> {
        self.model.changed().await.ok()?;
        Some(self.model.borrow_and_update().clone())
    }

    /// Wait until the model satisfies `predicate`; `None` if the view stops first
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&ViewModel) -> bool,
    ) -> Option<Arc<ViewModel>> {
        self.model
            .wait_for(|model| predicate(model))
            .await
            .ok()
            .map(|model| model.clone())
    }

    pub fn status(&self, kind: EntityKind) -> CollectionStatus {
        let model = self.model.borrow();
        match kind {
            EntityKind::Product => model.products.status.clone(),
            EntityKind::Outfit => model.outfits.status.clone(),
        }
    }

    /// Listener still running
    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled() && self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel every subscription and wait for the listener to stop
    pub async fn close(mut self) {
        self.cancel.cancel();
        let Some(mut task) = self.task.take() else {
            return;
        };
        match tokio::time::timeout(CLOSE_TIMEOUT, &mut task).await {
            Ok(Ok(())) => tracing::info!(view = %self.name, "Live view closed"),
            Ok(Err(e)) if e.is_cancelled() => tracing::debug!(view = %self.name, "Live view task cancelled"),
            Ok(Err(e)) => tracing::error!(view = %self.name, "Live view task panicked: {e}"),
            Err(_) => {
                tracing::warn!(view = %self.name, "Live view shutdown timed out (3s), aborting");
                task.abort();
            }
        }
    }
}

impl Drop for LiveView {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for LiveView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveView")
            .field("name", &self.name)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use shared::SyncError;

    async fn settled(view: &mut LiveView) -> Arc<ViewModel> {
        tokio::time::timeout(Duration::from_secs(2), view.wait_for(|m| m.is_settled()))
            .await
            .expect("view did not settle")
            .expect("view stopped")
    }

    #[tokio::test]
    async fn test_starts_loading_then_ready() {
        let store = MemoryStore::with_data(json!({
            "products": {"k1": {"name": "Tee", "price": 10, "category": "Tops", "image": "i"}}
        }));
        let mut view = LiveView::builder(&store)
            .products("products")
            .outfits("outfits")
            .spawn()
            .await
            .unwrap();

        let model = settled(&mut view).await;
        assert!(model.products.is_ready());
        assert!(model.outfits.is_ready());
        assert_eq!(model.counts.products, 1);
        assert_eq!(model.counts.outfits, 0);
        assert_eq!(model.categories, vec!["Tops"]);

        view.close().await;
    }

    #[tokio::test]
    async fn test_unwatched_collection() {
        let store = MemoryStore::new();
        let mut view = LiveView::builder(&store).products("products").spawn().await.unwrap();

        let model = settled(&mut view).await;
        assert_eq!(model.outfits.status, CollectionStatus::Unwatched);
        assert_eq!(view.status(EntityKind::Product), CollectionStatus::Ready);
    }

    #[tokio::test]
    async fn test_watching_nothing_is_an_error() {
        let store = MemoryStore::new();
        let err = LiveView::builder(&store).spawn().await.unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let store = MemoryStore::new();
        store.deny("outfits");
        let mut view = LiveView::builder(&store)
            .name("dashboard")
            .products("products")
            .outfits("outfits")
            .spawn()
            .await
            .unwrap();

        let model = settled(&mut view).await;
        assert_eq!(
            model.outfits.error(),
            Some(&SyncError::PermissionDenied("outfits".to_string()))
        );

        store
            .create("products", json!({"name": "Cap", "price": 5, "image": "i"}))
            .await
            .unwrap();
        let model = view.wait_for(|m| m.counts.products == 1).await.unwrap();
        assert!(model.products.is_ready());
        assert!(model.outfits.error().is_some());
    }

    #[tokio::test]
    async fn test_shared_path_feeds_both_kinds() {
        let store = MemoryStore::with_data(json!({
            "catalog": {"k1": {"name": "Tee", "price": 10, "image": "i"}}
        }));
        let mut view = LiveView::builder(&store)
            .products("catalog")
            .outfits("/catalog/")
            .spawn()
            .await
            .unwrap();

        let model = settled(&mut view).await;
        assert_eq!(model.counts.products, 1);
        assert_eq!(model.counts.outfits, 1);
        assert_eq!(store.active_subscriptions(), 1);
    }

    #[tokio::test]
    async fn test_close_releases_subscriptions() {
        let store = MemoryStore::new();
        let mut view = LiveView::builder(&store)
            .products("products")
            .outfits("outfits")
            .spawn()
            .await
            .unwrap();
        settled(&mut view).await;
        assert!(view.is_active());
        let mut rx = view.watch();

        view.close().await;

        tokio::time::timeout(Duration::from_secs(1), async {
            while store.active_subscriptions() > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("subscriptions still open after close");

        // Writes after close are not published
        store.create("products", json!({"name": "Late", "price": 1, "image": "i"})).await.unwrap();
        assert!(rx.changed().await.is_err());
        assert_eq!(rx.borrow().counts.products, 0);
    }
}
