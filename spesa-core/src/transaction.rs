//! Historical purchase records and the frozen ledger snapshot.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::ProductId;
use crate::price::Price;
use crate::store::StoreKey;

/// One line of a processed receipt.
///
/// Transactions are immutable historical facts: they are appended when a
/// receipt is ingested and never mutated or deleted by the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Purchase date.
    pub purchase_date: NaiveDate,
    /// Store name as recorded at ingest.
    pub store_name: String,
    /// Store address as recorded at ingest.
    pub store_address: String,
    /// Product name exactly as printed on the receipt.
    pub item_name_raw: String,
    /// Normalized product name used for matching.
    pub item_name_normalized: String,
    /// Optional product category.
    #[serde(default)]
    pub category: Option<String>,
    /// Total paid for the line.
    pub line_total: Price,
    /// Discount already subtracted from the line.
    #[serde(default)]
    pub discount: Price,
    /// Price per unit, after discounts.
    pub unit_price: Price,
    /// Whether the receipt flagged the line as a promotion.
    #[serde(default)]
    pub on_offer: bool,
    /// Units bought; fractional for weighed goods.
    pub quantity: f64,
    /// Catalog join key, when the ingest pipeline could link one.
    #[serde(default)]
    pub product_id: Option<ProductId>,
}

impl Transaction {
    /// Key of the store this line was bought at.
    #[must_use]
    pub fn store_key(&self) -> StoreKey {
        StoreKey::new(&self.store_name, &self.store_address)
    }
}

/// A consistent point-in-time view of the transaction table.
///
/// One optimization call works over exactly one snapshot; no concurrent
/// writer can change it mid-computation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerSnapshot {
    transactions: Vec<Transaction>,
}

impl LedgerSnapshot {
    /// Freeze a list of transactions into a snapshot.
    #[must_use]
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    /// Whether the snapshot holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Number of rows in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Iterate over the rows in ledger order.
    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter()
    }

    /// Distinct stores appearing in the snapshot, in key order.
    #[must_use]
    pub fn store_keys(&self) -> BTreeSet<StoreKey> {
        self.transactions.iter().map(Transaction::store_key).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn line(store: &str, item: &str, cents: u64) -> Transaction {
        Transaction {
            purchase_date: NaiveDate::from_ymd_opt(2026, 1, 5).expect("valid date"),
            store_name: store.to_owned(),
            store_address: "Via Roma 1".to_owned(),
            item_name_raw: item.to_owned(),
            item_name_normalized: item.to_uppercase(),
            category: None,
            line_total: Price::from_cents(cents),
            discount: Price::ZERO,
            unit_price: Price::from_cents(cents),
            on_offer: false,
            quantity: 1.0,
            product_id: None,
        }
    }

    #[rstest]
    fn store_keys_are_deduplicated_and_ordered() {
        let snapshot = LedgerSnapshot::new(vec![
            line("Conad", "LATTE", 120),
            line("Aldi", "PANE", 90),
            line("Conad", "PANE", 95),
        ]);
        let keys: Vec<_> = snapshot.store_keys().into_iter().collect();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].name(), "ALDI");
        assert_eq!(keys[1].name(), "CONAD");
    }
}
