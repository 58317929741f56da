//! Input validation helpers
//!
//! Centralized text length constants and validation functions used before
//! any write is sent to the remote store.

use thiserror::Error;

use crate::models::{OutfitInput, ProductInput};
use crate::money;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: product, outfit, item
pub const MAX_NAME_LEN: usize = 200;

/// Descriptions
pub const MAX_NOTE_LEN: usize = 2000;

/// Image and affiliate URIs
pub const MAX_URL_LEN: usize = 2048;

/// Items per outfit
pub const MAX_OUTFIT_ITEMS: usize = 50;

/// Pre-flight validation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ── Field helpers ───────────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    validate_optional_text(value, field, max_len)
}

/// Validate that a string, possibly empty, is within the length limit.
pub fn validate_optional_text(value: &str, field: &str, max_len: usize) -> Result<(), ValidationError> {
    if value.len() > max_len {
        return Err(ValidationError::new(
            field,
            format!("is too long ({} chars, max {max_len})", value.len()),
        ));
    }
    Ok(())
}

/// Validate a price slot: in range and in whole cents.
pub fn validate_price(value: f64, field: &str) -> Result<(), ValidationError> {
    if !money::is_valid_price(value) {
        return Err(ValidationError::new(
            field,
            format!("must be between 0 and {}, got {value}", money::MAX_PRICE),
        ));
    }
    if !money::is_whole_cents(value) {
        return Err(ValidationError::new(
            field,
            format!("must have at most 2 decimal places, got {value}"),
        ));
    }
    Ok(())
}

// ── Entity payloads ─────────────────────────────────────────────────

/// Validate a product payload. Name and image are required.
pub fn validate_product(input: &ProductInput) -> Result<(), ValidationError> {
    validate_required_text(&input.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&input.image, "image", MAX_URL_LEN)?;
    validate_price(input.price, "price")?;
    if let Some(original) = input.original_price {
        validate_price(original, "originalPrice")?;
    }
    validate_optional_text(&input.category, "category", MAX_NAME_LEN)?;
    validate_optional_text(&input.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&input.affiliate_link, "affiliateLink", MAX_URL_LEN)?;
    Ok(())
}

/// Validate an outfit payload. Name and image are required, items may be empty.
pub fn validate_outfit(input: &OutfitInput) -> Result<(), ValidationError> {
    validate_required_text(&input.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&input.image, "image", MAX_URL_LEN)?;
    validate_optional_text(&input.description, "description", MAX_NOTE_LEN)?;
    if input.items.len() > MAX_OUTFIT_ITEMS {
        return Err(ValidationError::new(
            "items",
            format!("too many items ({}, max {MAX_OUTFIT_ITEMS})", input.items.len()),
        ));
    }
    for (index, item) in input.items.iter().enumerate() {
        validate_price(item.price, &format!("items[{index}].price"))?;
    }
    Ok(())
}
