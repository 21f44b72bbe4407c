//! Stores and the directory of known shop locations.

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::normalize::{addresses_match, normalize_label};

/// Identity of a physical shop location.
///
/// Combines the normalized store name with the normalized address recorded
/// on the receipt. Keys order lexicographically by name, then address, which
/// gives every store-keyed map a deterministic iteration order.
///
/// # Examples
/// ```
/// use spesa_core::StoreKey;
///
/// let key = StoreKey::new(" esselunga ", "Via  Roma 1");
/// assert_eq!(key.name(), "ESSELUNGA");
/// assert_eq!(key.address(), "VIA ROMA 1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StoreKey {
    name: String,
    address: String,
}

impl StoreKey {
    /// Build a key from a raw store name and address.
    #[must_use]
    pub fn new(name: &str, address: &str) -> Self {
        Self {
            name: normalize_label(name),
            address: normalize_label(address),
        }
    }

    /// Normalized store name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized street address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl std::fmt::Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.address)
    }
}

/// A row of the store directory.
///
/// `location` is `None` when the source row had missing or non-numeric
/// coordinates; distance resolution degrades that store to a sentinel rather
/// than failing the whole computation.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRecord {
    /// Canonical shop name.
    pub standard_name: String,
    /// VAT number printed on receipts.
    pub vat_number: String,
    /// Address as it appears on receipts.
    pub raw_address: String,
    /// Cleaned, canonical address.
    pub clean_address: String,
    /// WGS84 position, `x = longitude`, `y = latitude`.
    pub location: Option<Coord<f64>>,
}

impl StoreRecord {
    /// Key identifying this directory row.
    #[must_use]
    pub fn key(&self) -> StoreKey {
        StoreKey::new(&self.standard_name, &self.clean_address)
    }
}

/// Read-only collection of known stores.
///
/// Lookup is by address fingerprint against the clean-address field; rows
/// without a usable clean address are unreachable by design.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreDirectory {
    records: Vec<StoreRecord>,
}

impl StoreDirectory {
    /// Wrap a list of directory rows.
    #[must_use]
    pub fn new(records: Vec<StoreRecord>) -> Self {
        Self { records }
    }

    /// Find the row whose clean address matches `address`.
    ///
    /// Matching uses [`addresses_match`]; the first matching row wins.
    #[must_use]
    pub fn find_by_address(&self, address: &str) -> Option<&StoreRecord> {
        self.records
            .iter()
            .find(|record| addresses_match(&record.clean_address, address))
    }

    /// Number of directory rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the directory holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over directory rows.
    pub fn iter(&self) -> impl Iterator<Item = &StoreRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record(name: &str, clean_address: &str) -> StoreRecord {
        StoreRecord {
            standard_name: name.to_owned(),
            vat_number: String::new(),
            raw_address: clean_address.to_owned(),
            clean_address: clean_address.to_owned(),
            location: Some(Coord { x: 9.19, y: 45.46 }),
        }
    }

    #[rstest]
    fn key_normalizes_name_and_address() {
        let key = StoreKey::new("conad  city", " via Verdi,3 ");
        assert_eq!(key.name(), "CONAD CITY");
        assert_eq!(key.address(), "VIA VERDI,3");
    }

    #[rstest]
    fn keys_order_by_name_then_address() {
        let a = StoreKey::new("A", "Z");
        let b = StoreKey::new("B", "A");
        assert!(a < b);
    }

    #[rstest]
    fn directory_matches_by_fingerprint() {
        let directory = StoreDirectory::new(vec![record("Conad", "Via Verdi, 3")]);
        let hit = directory.find_by_address("VIA VERDI 3");
        assert_eq!(hit.map(|r| r.standard_name.as_str()), Some("Conad"));
        assert!(directory.find_by_address("Via Rossini 9").is_none());
    }
}
