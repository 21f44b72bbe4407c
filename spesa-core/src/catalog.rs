//! The product catalog and its identifiers.

use serde::{Deserialize, Serialize};

/// Stable identifier of a catalog product.
///
/// When a ledger row carries one, it is the authoritative join key; string
/// matching on names is the fallback for unlinked legacy rows.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Wrap a raw identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of the product catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stable product identifier.
    pub product_id: ProductId,
    /// Normalized product name.
    pub normalized_name: String,
    /// Brand, when known.
    #[serde(default)]
    pub brand: Option<String>,
    /// Category, when known.
    #[serde(default)]
    pub category: Option<String>,
    /// Package size, free text.
    #[serde(default)]
    pub package_size: Option<String>,
    /// Unit of sale, free text.
    #[serde(default)]
    pub unit: Option<String>,
}
