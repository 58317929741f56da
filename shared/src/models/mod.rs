//! Data models
//!
//! Entities as read from the remote store, plus the write payloads the admin
//! commands send back. Field names on the wire are camelCase.

pub mod category;
pub mod outfit;
pub mod product;

// Re-exports
pub use category::*;
pub use outfit::*;
pub use product::*;
