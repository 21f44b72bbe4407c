//! Test-only fixtures shared by unit and behaviour tests.

use chrono::NaiveDate;
use geo::Coord;

use crate::catalog::ProductId;
use crate::distance::{Meters, RoutingError, RoutingProvider};
use crate::price::Price;
use crate::store::StoreRecord;
use crate::transaction::Transaction;

/// Routing provider that answers from a fixed destination table.
///
/// Distances are keyed by the destination coordinate; unknown destinations
/// yield [`RoutingError::NoRoute`].
#[derive(Debug, Clone, Default)]
pub struct FixedRoutingProvider {
    routes: Vec<(Coord<f64>, Meters)>,
}

impl FixedRoutingProvider {
    /// Provider with no known routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the distance to a destination coordinate.
    #[must_use]
    pub fn with_route(mut self, to: Coord<f64>, distance: Meters) -> Self {
        self.routes.push((to, distance));
        self
    }
}

impl RoutingProvider for FixedRoutingProvider {
    fn road_distance(&self, _from: Coord<f64>, to: Coord<f64>) -> Result<Meters, RoutingError> {
        self.routes
            .iter()
            .find(|(dest, _)| (dest.x - to.x).abs() < 1e-9 && (dest.y - to.y).abs() < 1e-9)
            .map(|(_, distance)| *distance)
            .ok_or(RoutingError::NoRoute)
    }
}

/// Routing provider that fails every call, for degradation tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingRoutingProvider;

impl RoutingProvider for FailingRoutingProvider {
    fn road_distance(&self, _from: Coord<f64>, _to: Coord<f64>) -> Result<Meters, RoutingError> {
        Err(RoutingError::Service {
            code: "NoTable".to_owned(),
            message: "synthetic failure".to_owned(),
        })
    }
}

/// Build a one-unit transaction for tests.
#[must_use]
pub fn transaction(store: &str, address: &str, item: &str, cents: u64) -> Transaction {
    Transaction {
        purchase_date: NaiveDate::from_ymd_opt(2026, 1, 5).expect("valid fixture date"),
        store_name: store.to_owned(),
        store_address: address.to_owned(),
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

/// Build a transaction carrying a catalog join key.
#[must_use]
pub fn linked_transaction(
    store: &str,
    address: &str,
    item: &str,
    cents: u64,
    product_id: &str,
) -> Transaction {
    Transaction {
        product_id: Some(ProductId::new(product_id)),
        ..transaction(store, address, item, cents)
    }
}

/// Build a directory row with coordinates.
#[must_use]
pub fn store_record(name: &str, address: &str, lon: f64, lat: f64) -> StoreRecord {
    StoreRecord {
        standard_name: name.to_owned(),
        vat_number: format!("IT{:011}", name.len()),
        raw_address: address.to_owned(),
        clean_address: address.to_owned(),
        location: Some(Coord { x: lon, y: lat }),
    }
}

/// Build a directory row whose coordinates are missing.
#[must_use]
pub fn unmapped_store_record(name: &str, address: &str) -> StoreRecord {
    StoreRecord {
        location: None,
        ..store_record(name, address, 0.0, 0.0)
    }
}
