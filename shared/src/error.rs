//! Read-side error state
//!
//! A collection whose subscription failed carries one of these in its view
//! model. It is cloneable so the same error can sit in every published model
//! until the collection recovers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Subscription failure reported by the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum SyncError {
    /// Read rejected by the store's access rules
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Connection or protocol failure
    #[error("Transport error: {0}")]
    Transport(String),
}

impl SyncError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }
}
