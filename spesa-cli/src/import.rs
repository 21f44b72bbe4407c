//! Import command implementation for the Spesa CLI.
//!
//! Receipt understanding happens upstream; this command takes the extracted
//! rows as JSON and appends them to the price database. The payload may
//! carry any subset of `stores`, `catalog`, and `transactions`.

use std::io::BufReader;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use clap::Parser;
use geo::Coord;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use spesa_core::normalize::normalize_item;
use spesa_core::{CatalogEntry, Price, ProductId, StoreRecord, Transaction};
use spesa_data::SqlitePriceStore;

use crate::plan::require_existing;
use crate::{ARG_IMPORT_DB, ARG_IMPORT_PAYLOAD, CliError, ENV_IMPORT_DB, ENV_IMPORT_PAYLOAD};

/// CLI arguments for the `import` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Append extracted receipt data to the price database. The \
                 payload is a JSON document with optional \"stores\", \
                 \"catalog\", and \"transactions\" arrays. Transactions are \
                 append-only; stores and catalog rows are upserted.",
    about = "Append extracted receipt data to the price database"
)]
#[ortho_config(prefix = "SPESA")]
pub(crate) struct ImportArgs {
    /// Path to the JSON payload.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) payload_path: Option<Utf8PathBuf>,
    /// Path to the SQLite price database (created when absent).
    #[arg(long = ARG_IMPORT_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) db: Option<Utf8PathBuf>,
}

impl ImportArgs {
    fn into_config(self) -> Result<ImportConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ImportConfig::try_from(merged)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ImportConfig {
    payload_path: Utf8PathBuf,
    db: Utf8PathBuf,
}

impl TryFrom<ImportArgs> for ImportConfig {
    type Error = CliError;

    fn try_from(args: ImportArgs) -> Result<Self, Self::Error> {
        let payload_path = args.payload_path.ok_or(CliError::MissingArgument {
            field: ARG_IMPORT_PAYLOAD,
            env: ENV_IMPORT_PAYLOAD,
        })?;
        let db = args.db.ok_or(CliError::MissingArgument {
            field: ARG_IMPORT_DB,
            env: ENV_IMPORT_DB,
        })?;
        Ok(Self { payload_path, db })
    }
}

/// On-disk shape of the import payload.
#[derive(Debug, Clone, Default, Deserialize)]
struct ImportDocument {
    #[serde(default)]
    stores: Vec<ImportStore>,
    #[serde(default)]
    catalog: Vec<CatalogEntry>,
    #[serde(default)]
    transactions: Vec<ImportRow>,
}

#[derive(Debug, Clone, Deserialize)]
struct ImportStore {
    standard_name: String,
    #[serde(default)]
    vat_number: String,
    #[serde(default)]
    raw_address: String,
    clean_address: String,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
}

impl From<ImportStore> for StoreRecord {
    fn from(row: ImportStore) -> Self {
        let location = match (row.latitude, row.longitude) {
            (Some(lat), Some(lon)) => Some(Coord { x: lon, y: lat }),
            _ => None,
        };
        Self {
            standard_name: row.standard_name,
            vat_number: row.vat_number,
            raw_address: row.raw_address,
            clean_address: row.clean_address,
            location,
        }
    }
}

/// One extracted receipt line as the ingestion pipeline emits it.
#[derive(Debug, Clone, Deserialize)]
struct ImportRow {
    /// `YYYY-MM-DD`, or the legacy `DD/MM/YYYY`.
    purchase_date: String,
    store_name: String,
    store_address: String,
    item_name_raw: String,
    #[serde(default)]
    item_name_normalized: Option<String>,
    #[serde(default)]
    category: Option<String>,
    unit_price: Price,
    #[serde(default)]
    line_total: Option<Price>,
    #[serde(default)]
    discount: Option<Price>,
    #[serde(default)]
    on_offer: bool,
    #[serde(default = "default_quantity")]
    quantity: f64,
    #[serde(default)]
    product_id: Option<String>,
}

fn default_quantity() -> f64 {
    1.0
}

impl ImportRow {
    fn into_transaction(self, index: usize) -> Result<Transaction, CliError> {
        let purchase_date = parse_date(&self.purchase_date).ok_or_else(|| {
            CliError::InvalidImportRow {
                index,
                reason: format!("unparseable date {:?}", self.purchase_date),
            }
        })?;
        let line_total = match self.line_total {
            Some(total) => total,
            None => self.unit_price.scale_by(self.quantity).ok_or_else(|| {
                CliError::InvalidImportRow {
                    index,
                    reason: format!("invalid quantity {}", self.quantity),
                }
            })?,
        };
        let item_name_normalized = self
            .item_name_normalized
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .map_or_else(|| normalize_item(&self.item_name_raw), normalize_item);

        Ok(Transaction {
            purchase_date,
            store_name: self.store_name,
            store_address: self.store_address,
            item_name_raw: self.item_name_raw,
            item_name_normalized,
            category: self.category.map(|c| normalize_item(&c)),
            line_total,
            discount: self.discount.unwrap_or(Price::ZERO),
            unit_price: self.unit_price,
            on_offer: self.on_offer,
            quantity: self.quantity,
            product_id: self.product_id.map(ProductId::new),
        })
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%d/%m/%Y"))
        .ok()
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    execute_import(&config)
}

fn execute_import(config: &ImportConfig) -> Result<(), CliError> {
    require_existing(&config.payload_path, ARG_IMPORT_PAYLOAD)?;

    let document = read_payload(&config.payload_path)?;
    let transactions: Vec<Transaction> = document
        .transactions
        .into_iter()
        .enumerate()
        .map(|(index, row)| row.into_transaction(index))
        .collect::<Result<_, _>>()?;
    let stores: Vec<StoreRecord> = document.stores.into_iter().map(Into::into).collect();

    let mut store = SqlitePriceStore::open(&config.db)?;
    if !stores.is_empty() {
        store.upsert_stores(&stores)?;
    }
    if !document.catalog.is_empty() {
        store.upsert_catalog(&document.catalog)?;
    }
    if !transactions.is_empty() {
        store.append_transactions(&transactions)?;
    }

    info!(
        "imported {} transaction(s), {} store(s), {} catalog row(s) into {}",
        transactions.len(),
        stores.len(),
        document.catalog.len(),
        config.db
    );
    Ok(())
}

fn read_payload(path: &Utf8Path) -> Result<ImportDocument, CliError> {
    let file = std::fs::File::open(path.as_std_path()).map_err(|source| CliError::OpenInput {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::ParseInput {
        path: path.to_path_buf(),
        source,
    })
}
