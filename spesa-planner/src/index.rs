//! Best observed price per (item query, store).
//!
//! The matrix is derived and ephemeral: it is rebuilt for every optimization
//! call from the frozen ledger snapshot and never persisted. Matching is
//! substring-based against normalized names and categories; a query may
//! therefore match unrelated products sharing a word. That is an accepted
//! property of the matching strategy, not something later stages correct.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use spesa_core::normalize::normalize_item;
use spesa_core::{CatalogEntry, LedgerSnapshot, Price, ProductId, StoreKey, Transaction};

/// Cheapest observed offer for one (query, store) cell.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    /// Lowest unit price seen at the store.
    pub price: Price,
    /// Normalized name of the product that set the price.
    pub product: String,
}

/// Lookup table of the cheapest price per item query and store.
///
/// Cells always hold the *minimum* unit price among matching transactions at
/// a store, never an average or the most recent value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceMatrix {
    queries: Vec<String>,
    entries: BTreeMap<String, BTreeMap<StoreKey, PriceQuote>>,
}

impl PriceMatrix {
    /// Scan the ledger and index the cheapest offer per query and store.
    ///
    /// Queries are normalized and deduplicated, preserving request order.
    /// A transaction matches a query when the query is a substring of the
    /// normalized item name or category; rows linked to the catalog by
    /// `product_id` also match through the catalog's name and category (the
    /// identifier is the authoritative join, string matching the legacy
    /// fallback).
    #[must_use]
    pub fn build(items: &[String], ledger: &LedgerSnapshot, catalog: &[CatalogEntry]) -> Self {
        let mut queries: Vec<String> = Vec::new();
        for raw in items {
            let query = normalize_item(raw);
            if !query.is_empty() && !queries.contains(&query) {
                queries.push(query);
            }
        }

        let by_id: HashMap<&ProductId, &CatalogEntry> = catalog
            .iter()
            .map(|entry| (&entry.product_id, entry))
            .collect();

        let mut entries: BTreeMap<String, BTreeMap<StoreKey, PriceQuote>> = queries
            .iter()
            .map(|query| (query.clone(), BTreeMap::new()))
            .collect();

        for tx in ledger.iter() {
            let haystacks = match_targets(tx, &by_id);
            let store = tx.store_key();
            for query in &queries {
                if !haystacks.iter().any(|h| h.contains(query.as_str())) {
                    continue;
                }
                let Some(cells) = entries.get_mut(query) else {
                    continue;
                };
                match cells.get_mut(&store) {
                    // Strictly-lower replaces; equal keeps the first row seen,
                    // so ledger order settles price ties within one store.
                    Some(quote) if tx.unit_price < quote.price => {
                        quote.price = tx.unit_price;
                        quote.product = normalize_item(&tx.item_name_normalized);
                    }
                    Some(_) => {}
                    None => {
                        cells.insert(
                            store.clone(),
                            PriceQuote {
                                price: tx.unit_price,
                                product: normalize_item(&tx.item_name_normalized),
                            },
                        );
                    }
                }
            }
        }

        Self { queries, entries }
    }

    /// Normalized queries in request order.
    #[must_use]
    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    /// The cheapest offer for `query` at `store`, when one exists.
    #[must_use]
    pub fn quote(&self, query: &str, store: &StoreKey) -> Option<&PriceQuote> {
        self.entries.get(query).and_then(|cells| cells.get(store))
    }

    /// Stores holding at least one matched item, in key order.
    #[must_use]
    pub fn stores(&self) -> BTreeSet<StoreKey> {
        self.entries
            .values()
            .flat_map(|cells| cells.keys().cloned())
            .collect()
    }

    /// Number of queries `store` can satisfy.
    #[must_use]
    pub fn coverage(&self, store: &StoreKey) -> usize {
        self.entries
            .values()
            .filter(|cells| cells.contains_key(store))
            .count()
    }

    /// Queries with no match at any store, in request order.
    #[must_use]
    pub fn globally_missing(&self) -> Vec<String> {
        self.queries
            .iter()
            .filter(|query| {
                self.entries
                    .get(query.as_str())
                    .is_none_or(BTreeMap::is_empty)
            })
            .cloned()
            .collect()
    }
}

fn match_targets(
    tx: &Transaction,
    catalog: &HashMap<&ProductId, &CatalogEntry>,
) -> Vec<String> {
    let mut targets = vec![normalize_item(&tx.item_name_normalized)];
    if let Some(category) = &tx.category {
        targets.push(normalize_item(category));
    }
    if let Some(entry) = tx.product_id.as_ref().and_then(|id| catalog.get(id)) {
        targets.push(normalize_item(&entry.normalized_name));
        if let Some(category) = &entry.category {
            targets.push(normalize_item(category));
        }
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use spesa_core::test_support::{linked_transaction, transaction};

    fn queries(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[rstest]
    fn keeps_minimum_price_per_store() {
        let ledger = LedgerSnapshot::new(vec![
            transaction("Conad", "Via Roma 1", "LATTE INTERO", 130),
            transaction("Conad", "Via Roma 1", "LATTE INTERO", 110),
            transaction("Conad", "Via Roma 1", "LATTE INTERO", 125),
        ]);
        let matrix = PriceMatrix::build(&queries(&["latte"]), &ledger, &[]);
        let store = StoreKey::new("Conad", "Via Roma 1");
        let quote = matrix.quote("LATTE", &store).expect("matched");
        assert_eq!(quote.price, Price::from_cents(110));
    }

    #[rstest]
    fn substring_matches_across_products() {
        let ledger = LedgerSnapshot::new(vec![
            transaction("Conad", "Via Roma 1", "LATTE INTERO", 120),
            transaction("Conad", "Via Roma 1", "CIOCCOLATO AL LATTE", 250),
        ]);
        let matrix = PriceMatrix::build(&queries(&["LATTE"]), &ledger, &[]);
        let store = StoreKey::new("Conad", "Via Roma 1");
        // Both products contain the query; the cheaper one sets the cell.
        let quote = matrix.quote("LATTE", &store).expect("matched");
        assert_eq!(quote.price, Price::from_cents(120));
        assert_eq!(quote.product, "LATTE INTERO");
    }

    #[rstest]
    fn matches_through_category() {
        let mut tx = transaction("Aldi", "Via Po 2", "GRANA 500G", 799);
        tx.category = Some("formaggi".to_owned());
        let ledger = LedgerSnapshot::new(vec![tx]);
        let matrix = PriceMatrix::build(&queries(&["formaggi"]), &ledger, &[]);
        assert_eq!(matrix.coverage(&StoreKey::new("Aldi", "Via Po 2")), 1);
    }

    #[rstest]
    fn catalog_join_matches_when_names_do_not() {
        let ledger = LedgerSnapshot::new(vec![linked_transaction(
            "Aldi",
            "Via Po 2",
            "YGR BIANCO 2X125",
            99,
            "P-042",
        )]);
        let catalog = vec![CatalogEntry {
            product_id: ProductId::new("P-042"),
            normalized_name: "YOGURT BIANCO".to_owned(),
            brand: None,
            category: Some("LATTICINI".to_owned()),
            package_size: None,
            unit: None,
        }];
        let matrix = PriceMatrix::build(&queries(&["yogurt"]), &ledger, &catalog);
        let store = StoreKey::new("Aldi", "Via Po 2");
        let quote = matrix.quote("YOGURT", &store).expect("catalog join matched");
        assert_eq!(quote.product, "YGR BIANCO 2X125");
    }

    #[rstest]
    fn records_globally_missing_queries() {
        let ledger = LedgerSnapshot::new(vec![transaction("Conad", "Via Roma 1", "PANE", 90)]);
        let matrix = PriceMatrix::build(&queries(&["pane", "tonno"]), &ledger, &[]);
        assert_eq!(matrix.globally_missing(), vec!["TONNO".to_owned()]);
    }

    #[rstest]
    fn deduplicates_queries_preserving_order() {
        let ledger = LedgerSnapshot::new(vec![transaction("Conad", "Via Roma 1", "PANE", 90)]);
        let matrix = PriceMatrix::build(
            &queries(&["pane", " PANE ", "latte", ""]),
            &ledger,
            &[],
        );
        assert_eq!(matrix.queries(), ["PANE", "LATTE"]);
    }
}
