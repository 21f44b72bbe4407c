//! Text normalization for item queries and store addresses.
//!
//! Matching across the ledger is deliberately approximate: item queries match
//! by substring and store addresses match by a punctuation-insensitive
//! fingerprint. Persisted product and store identifiers remain the
//! authoritative join keys; these functions cover the unlinked legacy rows.

/// Normalize a free-text item query or product name for matching.
///
/// Uppercases and trims the input; interior whitespace is preserved because
/// matching is substring-based.
///
/// # Examples
/// ```
/// use spesa_core::normalize::normalize_item;
///
/// assert_eq!(normalize_item("  latte intero "), "LATTE INTERO");
/// ```
#[must_use]
pub fn normalize_item(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Normalize a store name or address into its display form.
///
/// Uppercases, trims, and collapses runs of whitespace.
#[must_use]
pub fn normalize_label(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Reduce an address to a matching fingerprint.
///
/// Case-folds and strips everything but letters and digits, so that
/// `"Via Roma, 1"` and `"VIA ROMA 1"` compare equal.
#[must_use]
pub fn address_fingerprint(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Equality predicate for store addresses.
///
/// Two addresses refer to the same location when their fingerprints are
/// equal and non-empty. This is approximate by design; directory rows with a
/// stable store identity should be joined on that instead.
#[must_use]
pub fn addresses_match(left: &str, right: &str) -> bool {
    let left = address_fingerprint(left);
    !left.is_empty() && left == address_fingerprint(right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("  latte ", "LATTE")]
    #[case("Pane  Integrale", "PANE  INTEGRALE")]
    fn normalize_item_uppercases_and_trims(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_item(raw), expected);
    }

    #[rstest]
    fn normalize_label_collapses_whitespace() {
        assert_eq!(normalize_label("  Esselunga   Centro  "), "ESSELUNGA CENTRO");
    }

    #[rstest]
    #[case("Via Roma, 1", "VIA ROMA 1", true)]
    #[case("C.so Buenos Aires 33", "CSO BUENOS AIRES 33", true)]
    #[case("Via Roma 1", "Via Roma 2", false)]
    #[case("", "", false)]
    fn address_matching(#[case] left: &str, #[case] right: &str, #[case] expected: bool) {
        assert_eq!(addresses_match(left, right), expected);
    }
}
