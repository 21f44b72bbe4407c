//! SQLite-backed persistence for the ledger, catalog, and store directory.
//!
//! The planner works over frozen snapshots; this store materialises them.
//! Loads are lenient: a malformed row (negative price, unparseable date,
//! non-numeric coordinates) is skipped with a warning and never aborts the
//! load, so one bad receipt cannot take the optimizer down.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use geo::Coord;
use log::warn;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, Row, params};
use thiserror::Error;

use spesa_core::{
    CatalogEntry, LedgerSnapshot, Price, ProductId, StoreDirectory, StoreRecord, Transaction,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS transactions (
    id                   INTEGER PRIMARY KEY,
    purchase_date        TEXT    NOT NULL,
    store_name           TEXT    NOT NULL,
    store_address        TEXT    NOT NULL,
    item_name_raw        TEXT    NOT NULL,
    item_name_normalized TEXT    NOT NULL,
    category             TEXT,
    line_total_cents     INTEGER NOT NULL,
    discount_cents       INTEGER NOT NULL DEFAULT 0,
    unit_price_cents     INTEGER NOT NULL,
    on_offer             INTEGER NOT NULL DEFAULT 0,
    quantity             REAL    NOT NULL DEFAULT 1.0,
    product_id           TEXT
);
CREATE TABLE IF NOT EXISTS catalog (
    product_id      TEXT PRIMARY KEY,
    normalized_name TEXT NOT NULL,
    brand           TEXT,
    category        TEXT,
    package_size    TEXT,
    unit            TEXT
);
CREATE TABLE IF NOT EXISTS stores (
    standard_name TEXT NOT NULL,
    vat_number    TEXT NOT NULL DEFAULT '',
    raw_address   TEXT NOT NULL DEFAULT '',
    clean_address TEXT NOT NULL,
    latitude,
    longitude,
    UNIQUE (standard_name, clean_address)
);
";

/// Errors raised while reading or writing the SQLite store.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Opening the `SQLite` database failed.
    #[error("failed to open SQLite database at {path}")]
    OpenDatabase {
        /// Requested database path.
        path: Utf8PathBuf,
        /// Source error from `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Creating the schema failed.
    #[error("failed to initialise the database schema")]
    Initialize {
        /// Source error from `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Preparing or executing a query failed.
    #[error("failed to {operation}")]
    Query {
        /// Description of the failed operation.
        operation: &'static str,
        /// Source error from `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
}

/// Tabular store for transactions, catalog rows, and the store directory.
///
/// Transactions are append-only: nothing here mutates or deletes history.
pub struct SqlitePriceStore {
    connection: Connection,
}

impl std::fmt::Debug for SqlitePriceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlitePriceStore").finish_non_exhaustive()
    }
}

impl SqlitePriceStore {
    /// Open (creating when absent) a database at `path`.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError`] when the file cannot be opened or the
    /// schema cannot be created.
    pub fn open(path: &Utf8Path) -> Result<Self, SqliteStoreError> {
        let connection = Connection::open(path.as_std_path()).map_err(|source| {
            SqliteStoreError::OpenDatabase {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::with_connection(connection)
    }

    /// Open an in-memory database, mainly for tests and dry runs.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError`] when the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        let connection = Connection::open_in_memory().map_err(|source| {
            SqliteStoreError::OpenDatabase {
                path: Utf8PathBuf::from(":memory:"),
                source,
            }
        })?;
        Self::with_connection(connection)
    }

    fn with_connection(connection: Connection) -> Result<Self, SqliteStoreError> {
        connection
            .execute_batch(SCHEMA)
            .map_err(|source| SqliteStoreError::Initialize { source })?;
        Ok(Self { connection })
    }

    /// Load every transaction row into a frozen snapshot.
    ///
    /// Malformed rows are skipped with a warning.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError`] on query failures.
    pub fn load_ledger(&self) -> Result<LedgerSnapshot, SqliteStoreError> {
        let mut statement = self
            .connection
            .prepare(
                "SELECT purchase_date, store_name, store_address, item_name_raw,
                        item_name_normalized, category, line_total_cents, discount_cents,
                        unit_price_cents, on_offer, quantity, product_id
                 FROM transactions ORDER BY id",
            )
            .map_err(|source| SqliteStoreError::Query {
                operation: "prepare transaction selection",
                source,
            })?;

        let mut rows = statement
            .query([])
            .map_err(|source| SqliteStoreError::Query {
                operation: "query transactions",
                source,
            })?;

        let mut transactions = Vec::new();
        let mut skipped = 0usize;
        while let Some(row) = rows.next().map_err(|source| SqliteStoreError::Query {
            operation: "read transaction row",
            source,
        })? {
            match decode_transaction(row) {
                Ok(Some(tx)) => transactions.push(tx),
                Ok(None) => skipped += 1,
                Err(source) => {
                    return Err(SqliteStoreError::Query {
                        operation: "decode transaction row",
                        source,
                    });
                }
            }
        }
        if skipped > 0 {
            warn!("skipped {skipped} malformed transaction row(s)");
        }
        Ok(LedgerSnapshot::new(transactions))
    }

    /// Append receipt lines to the ledger.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError`] when the insert fails; the batch is
    /// atomic.
    pub fn append_transactions(
        &mut self,
        transactions: &[Transaction],
    ) -> Result<(), SqliteStoreError> {
        let tx = self
            .connection
            .transaction()
            .map_err(|source| SqliteStoreError::Query {
                operation: "begin append transaction",
                source,
            })?;
        for record in transactions {
            tx.execute(
                "INSERT INTO transactions (
                    purchase_date, store_name, store_address, item_name_raw,
                    item_name_normalized, category, line_total_cents, discount_cents,
                    unit_price_cents, on_offer, quantity, product_id
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    record.purchase_date.format("%Y-%m-%d").to_string(),
                    record.store_name,
                    record.store_address,
                    record.item_name_raw,
                    record.item_name_normalized,
                    record.category,
                    record.line_total.cents() as i64,
                    record.discount.cents() as i64,
                    record.unit_price.cents() as i64,
                    record.on_offer,
                    record.quantity,
                    record.product_id.as_ref().map(ProductId::as_str),
                ],
            )
            .map_err(|source| SqliteStoreError::Query {
                operation: "insert transaction",
                source,
            })?;
        }
        tx.commit().map_err(|source| SqliteStoreError::Query {
            operation: "commit append transaction",
            source,
        })
    }

    /// Load the product catalog.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError`] on query failures.
    pub fn load_catalog(&self) -> Result<Vec<CatalogEntry>, SqliteStoreError> {
        let mut statement = self
            .connection
            .prepare(
                "SELECT product_id, normalized_name, brand, category, package_size, unit
                 FROM catalog ORDER BY product_id",
            )
            .map_err(|source| SqliteStoreError::Query {
                operation: "prepare catalog selection",
                source,
            })?;
        let entries = statement
            .query_map([], |row| {
                Ok(CatalogEntry {
                    product_id: ProductId::new(row.get::<_, String>(0)?),
                    normalized_name: row.get(1)?,
                    brand: row.get(2)?,
                    category: row.get(3)?,
                    package_size: row.get(4)?,
                    unit: row.get(5)?,
                })
            })
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
            .map_err(|source| SqliteStoreError::Query {
                operation: "read catalog rows",
                source,
            })?;
        Ok(entries)
    }

    /// Insert or replace catalog rows.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError`] when an insert fails.
    pub fn upsert_catalog(&mut self, entries: &[CatalogEntry]) -> Result<(), SqliteStoreError> {
        for entry in entries {
            self.connection
                .execute(
                    "INSERT OR REPLACE INTO catalog
                        (product_id, normalized_name, brand, category, package_size, unit)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        entry.product_id.as_str(),
                        entry.normalized_name,
                        entry.brand,
                        entry.category,
                        entry.package_size,
                        entry.unit,
                    ],
                )
                .map_err(|source| SqliteStoreError::Query {
                    operation: "insert catalog row",
                    source,
                })?;
        }
        Ok(())
    }

    /// Load the store directory.
    ///
    /// Rows with missing or non-numeric coordinates load with
    /// `location = None`; distance resolution degrades them to a sentinel.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError`] on query failures.
    pub fn load_directory(&self) -> Result<StoreDirectory, SqliteStoreError> {
        let mut statement = self
            .connection
            .prepare(
                "SELECT standard_name, vat_number, raw_address, clean_address,
                        latitude, longitude
                 FROM stores ORDER BY standard_name, clean_address",
            )
            .map_err(|source| SqliteStoreError::Query {
                operation: "prepare store selection",
                source,
            })?;

        let mut rows = statement
            .query([])
            .map_err(|source| SqliteStoreError::Query {
                operation: "query stores",
                source,
            })?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().map_err(|source| SqliteStoreError::Query {
            operation: "read store row",
            source,
        })? {
            match decode_store(row) {
                Ok(record) => records.push(record),
                Err(source) => {
                    return Err(SqliteStoreError::Query {
                        operation: "decode store row",
                        source,
                    });
                }
            }
        }
        Ok(StoreDirectory::new(records))
    }

    /// Insert or replace directory rows.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError`] when an insert fails.
    pub fn upsert_stores(&mut self, records: &[StoreRecord]) -> Result<(), SqliteStoreError> {
        for record in records {
            self.connection
                .execute(
                    "INSERT OR REPLACE INTO stores
                        (standard_name, vat_number, raw_address, clean_address,
                         latitude, longitude)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        record.standard_name,
                        record.vat_number,
                        record.raw_address,
                        record.clean_address,
                        record.location.map(|c| c.y),
                        record.location.map(|c| c.x),
                    ],
                )
                .map_err(|source| SqliteStoreError::Query {
                    operation: "insert store row",
                    source,
                })?;
        }
        Ok(())
    }
}

/// Decode one transaction row, or `None` when the row is unusable.
fn decode_transaction(row: &Row<'_>) -> Result<Option<Transaction>, rusqlite::Error> {
    let date_text: String = row.get(0)?;
    let Some(purchase_date) = parse_date(&date_text) else {
        warn!("transaction row has unparseable date {date_text:?}");
        return Ok(None);
    };

    let line_total: i64 = row.get(6)?;
    let discount: i64 = row.get(7)?;
    let unit_price: i64 = row.get(8)?;
    let (Ok(line_total), Ok(discount), Ok(unit_price)) = (
        u64::try_from(line_total),
        u64::try_from(discount),
        u64::try_from(unit_price),
    ) else {
        warn!("transaction row has a negative amount; skipping");
        return Ok(None);
    };

    Ok(Some(Transaction {
        purchase_date,
        store_name: row.get(1)?,
        store_address: row.get(2)?,
        item_name_raw: row.get(3)?,
        item_name_normalized: row.get(4)?,
        category: row.get(5)?,
        line_total: Price::from_cents(line_total),
        discount: Price::from_cents(discount),
        unit_price: Price::from_cents(unit_price),
        on_offer: row.get(9)?,
        quantity: row.get(10)?,
        product_id: row.get::<_, Option<String>>(11)?.map(ProductId::new),
    }))
}

fn decode_store(row: &Row<'_>) -> Result<StoreRecord, rusqlite::Error> {
    let standard_name: String = row.get(0)?;
    let latitude = lenient_f64(row, 4)?;
    let longitude = lenient_f64(row, 5)?;
    let location = match (latitude, longitude) {
        (Some(lat), Some(lon)) => Some(Coord { x: lon, y: lat }),
        _ => {
            warn!("store {standard_name:?} has missing or non-numeric coordinates");
            None
        }
    };
    Ok(StoreRecord {
        standard_name,
        vat_number: row.get(1)?,
        raw_address: row.get(2)?,
        clean_address: row.get(3)?,
        location,
    })
}

/// Read a column that should be numeric but may hold anything.
///
/// SQLite columns are dynamically typed; legacy imports stored coordinates
/// as text, so text that parses as a float is accepted.
fn lenient_f64(row: &Row<'_>, index: usize) -> Result<Option<f64>, rusqlite::Error> {
    Ok(match row.get_ref(index)? {
        ValueRef::Integer(value) => Some(value as f64),
        ValueRef::Real(value) => Some(value),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .ok()
            .and_then(|text| text.trim().parse().ok()),
        ValueRef::Null | ValueRef::Blob(_) => None,
    })
}

/// Dates arrive as ISO `YYYY-MM-DD`; legacy rows used `DD/MM/YYYY`.
fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%d/%m/%Y"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use spesa_core::test_support::{store_record, transaction, unmapped_store_record};
    use tempfile::TempDir;

    #[rstest]
    fn round_trips_transactions() {
        let dir = TempDir::new().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("prices.db")).expect("utf-8 path");
        let mut store = SqlitePriceStore::open(&path).expect("open");

        let rows = vec![
            transaction("Conad", "Via Roma 1", "LATTE", 120),
            transaction("Aldi", "Via Po 2", "PANE", 90),
        ];
        store.append_transactions(&rows).expect("append");

        let snapshot = store.load_ledger().expect("load");
        assert_eq!(snapshot.len(), 2);
        let loaded: Vec<_> = snapshot.iter().cloned().collect();
        assert_eq!(loaded, rows);
    }

    #[rstest]
    fn round_trips_directory_and_catalog() {
        let mut store = SqlitePriceStore::open_in_memory().expect("open");
        let records = vec![
            store_record("Conad", "Via Roma 1", 9.2, 45.5),
            unmapped_store_record("Aldi", "Via Po 2"),
        ];
        store.upsert_stores(&records).expect("stores");
        store
            .upsert_catalog(&[CatalogEntry {
                product_id: ProductId::new("P-001"),
                normalized_name: "LATTE INTERO".to_owned(),
                brand: Some("Granarolo".to_owned()),
                category: Some("LATTICINI".to_owned()),
                package_size: Some("1L".to_owned()),
                unit: None,
            }])
            .expect("catalog");

        let directory = store.load_directory().expect("directory");
        assert_eq!(directory.len(), 2);
        let aldi = directory.find_by_address("Via Po 2").expect("aldi row");
        assert_eq!(aldi.location, None);
        let conad = directory.find_by_address("VIA ROMA 1").expect("conad row");
        assert_eq!(conad.location, Some(Coord { x: 9.2, y: 45.5 }));

        let catalog = store.load_catalog().expect("catalog");
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].normalized_name, "LATTE INTERO");
    }

    #[rstest]
    fn malformed_rows_are_skipped_not_fatal() {
        let store = SqlitePriceStore::open_in_memory().expect("open");
        store
            .connection
            .execute_batch(
                "INSERT INTO transactions
                    (purchase_date, store_name, store_address, item_name_raw,
                     item_name_normalized, line_total_cents, discount_cents,
                     unit_price_cents, quantity)
                 VALUES
                    ('2026-01-05', 'Conad', 'Via Roma 1', 'latte', 'LATTE', 120, 0, 120, 1.0),
                    ('not a date', 'Conad', 'Via Roma 1', 'pane', 'PANE', 90, 0, 90, 1.0),
                    ('2026-01-06', 'Conad', 'Via Roma 1', 'uova', 'UOVA', -10, 0, -10, 1.0);",
            )
            .expect("seed rows");

        let snapshot = store.load_ledger().expect("load");
        assert_eq!(snapshot.len(), 1);
        let only = snapshot.iter().next().expect("one row");
        assert_eq!(only.item_name_normalized, "LATTE");
    }

    #[rstest]
    fn text_coordinates_still_parse() {
        let store = SqlitePriceStore::open_in_memory().expect("open");
        store
            .connection
            .execute_batch(
                "INSERT INTO stores (standard_name, clean_address, latitude, longitude)
                 VALUES ('Conad', 'Via Roma 1', '45.46', '9.19'),
                        ('Aldi', 'Via Po 2', 'n/a', '9.10');",
            )
            .expect("seed rows");

        let directory = store.load_directory().expect("directory");
        let conad = directory.find_by_address("Via Roma 1").expect("conad");
        assert_eq!(conad.location, Some(Coord { x: 9.19, y: 45.46 }));
        let aldi = directory.find_by_address("Via Po 2").expect("aldi");
        assert_eq!(aldi.location, None);
    }

    #[rstest]
    #[case("2026-01-05")]
    #[case("05/01/2026")]
    fn accepts_both_date_formats(#[case] text: &str) {
        let parsed = parse_date(text).expect("parse");
        assert_eq!(parsed, NaiveDate::from_ymd_opt(2026, 1, 5).expect("date"));
    }
}
