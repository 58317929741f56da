//! Client error types

use shared::{SyncError, ValidationError};
use thiserror::Error;

use crate::auth::AuthError;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rejected by the store's access rules
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Pre-flight validation failed, nothing was sent
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Connection or stream failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Sign-in failed
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Read-side error state for a failed subscription
    pub fn to_sync_error(&self) -> SyncError {
        match self {
            Self::PermissionDenied(msg) => SyncError::PermissionDenied(msg.clone()),
            other => SyncError::Transport(other.to_string()),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
