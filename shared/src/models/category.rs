//! Category Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Catalog category
///
/// Products store their category as a plain string; this enum is the fixed
/// set offered by the admin form and the storefront selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Tops,
    Bottoms,
    Dresses,
    Outerwear,
    Shoes,
    Accessories,
    Bags,
}

impl Category {
    /// All categories in display order
    pub const ALL: [Category; 7] = [
        Category::Tops,
        Category::Bottoms,
        Category::Dresses,
        Category::Outerwear,
        Category::Shoes,
        Category::Accessories,
        Category::Bags,
    ];

    /// Canonical stored name (e.g. "Tops")
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tops => "Tops",
            Self::Bottoms => "Bottoms",
            Self::Dresses => "Dresses",
            Self::Outerwear => "Outerwear",
            Self::Shoes => "Shoes",
            Self::Accessories => "Accessories",
            Self::Bags => "Bags",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown category name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    /// Case-insensitive parse, surrounding whitespace ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}
