//! In-process realtime store
//!
//! Holds one ordered JSON tree. Every write broadcasts the changed path; each
//! subscription task re-reads its own path when the change overlaps it and
//! pushes a fresh whole-path snapshot.
//!
//! Access rules are simulated with [`MemoryStore::deny`]: reads and writes
//! under a denied path fail with a permission error, and live subscriptions
//! under it receive the error and end.

use async_trait::async_trait;
use serde_json::Value;
use shared::SyncError;
use shared::snapshot::snapshot_from_value;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use super::{
    PushKeyGenerator, RemoteCollectionClient, SnapshotEvent, Subscription, SubscriptionSink,
    child_path, is_ancestor_or_self, paths_overlap, segments, tree, validate_path,
};
use crate::{ClientError, ClientResult};

/// Change notification capacity; lagging subscribers just re-read
const CHANGE_BUFFER: usize = 256;

#[derive(Debug, Clone)]
enum Change {
    Written(String),
    Denied(String),
}

#[derive(Debug, Default)]
struct State {
    root: Value,
    denied: BTreeSet<String>,
}

/// In-memory [`RemoteCollectionClient`]
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    changes: broadcast::Sender<Change>,
    keys: Arc<PushKeyGenerator>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            state: Arc::new(Mutex::new(State::default())),
            changes,
            keys: Arc::new(PushKeyGenerator::new()),
        }
    }

    /// Store seeded with an initial tree
    pub fn with_data(root: Value) -> Self {
        let store = Self::new();
        store.lock().root = root;
        store
    }

    /// Current value at `path` (`null` when absent)
    pub fn get(&self, path: &str) -> Value {
        let state = self.lock();
        tree::get(&state.root, &segments(path))
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Reject reads and writes at or below `path`
    pub fn deny(&self, path: &str) {
        let path = super::normalize_path(path);
        self.lock().denied.insert(path.clone());
        tracing::debug!(path = %path, "Access denied for path");
        let _ = self.changes.send(Change::Denied(path));
    }

    /// Lift a previous [`MemoryStore::deny`]
    pub fn allow(&self, path: &str) {
        self.lock().denied.remove(&super::normalize_path(path));
    }

    /// Number of live subscription tasks
    pub fn active_subscriptions(&self) -> usize {
        self.changes.receiver_count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_denied(&self, path: &str) -> bool {
        self.lock()
            .denied
            .iter()
            .any(|denied| is_ancestor_or_self(denied, path))
    }

    fn check_access(&self, path: &str) -> ClientResult<()> {
        if self.is_denied(path) {
            return Err(ClientError::PermissionDenied(path.to_string()));
        }
        Ok(())
    }

    fn snapshot(&self, path: &str) -> SnapshotEvent {
        SnapshotEvent::Snapshot(snapshot_from_value(self.get(path)))
    }

    fn write(&self, path: &str, value: Value) {
        {
            let mut state = self.lock();
            tree::set(&mut state.root, &segments(path), value);
        }
        let _ = self.changes.send(Change::Written(path.to_string()));
    }

    /// Subscription task: initial snapshot, then one per overlapping write
    async fn run_subscription(
        self,
        path: String,
        sink: SubscriptionSink,
        mut changes: broadcast::Receiver<Change>,
    ) {
        if self.is_denied(&path) {
            let _ = sink
                .send(SnapshotEvent::Error(SyncError::PermissionDenied(path)))
                .await;
            return;
        }
        if !sink.send(self.snapshot(&path)).await {
            return;
        }

        loop {
            tokio::select! {
                _ = sink.cancelled() => {
                    tracing::debug!(path = %path, "Memory subscription cancelled");
                    break;
                }
                change = changes.recv() => {
                    let event = match change {
                        Ok(Change::Written(written)) if paths_overlap(&written, &path) => {
                            self.snapshot(&path)
                        }
                        Ok(Change::Denied(denied)) if is_ancestor_or_self(&denied, &path) => {
                            let _ = sink
                                .send(SnapshotEvent::Error(SyncError::PermissionDenied(path.clone())))
                                .await;
                            break;
                        }
                        Ok(_) => continue,
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(path = %path, skipped = n, "Memory subscription lagged, re-reading");
                            self.snapshot(&path)
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    };
                    if !sink.send(event).await {
                        break;
                    }
                }
            }
        }
    }
}

#[async_trait]
impl RemoteCollectionClient for MemoryStore {
    async fn subscribe(&self, path: &str) -> ClientResult<Subscription> {
        let path = validate_path(path)?;
        let (sink, subscription) = Subscription::channel(path.clone());
        // Register for changes before the first read so no write slips between
        let changes = self.changes.subscribe();
        tokio::spawn(self.clone().run_subscription(path, sink, changes));
        Ok(subscription)
    }

    async fn create(&self, collection_path: &str, value: Value) -> ClientResult<String> {
        let collection = validate_path(collection_path)?;
        self.check_access(&collection)?;
        let key = self.keys.next_key();
        self.write(&child_path(&collection, &key), value);
        Ok(key)
    }

    async fn update(&self, entity_path: &str, value: Value) -> ClientResult<()> {
        let path = validate_path(entity_path)?;
        self.check_access(&path)?;
        self.write(&path, value);
        Ok(())
    }

    async fn delete(&self, entity_path: &str) -> ClientResult<()> {
        let path = validate_path(entity_path)?;
        self.check_access(&path)?;
        self.write(&path, Value::Null);
        Ok(())
    }
}
