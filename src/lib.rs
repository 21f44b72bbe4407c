//! Facade crate for the Spesa shopping-plan engine.
//!
//! This crate re-exports the core domain types and exposes the planner and
//! the data-access implementations behind feature flags.

#![forbid(unsafe_code)]

pub use spesa_core::{
    CatalogEntry, Geocoder, LedgerSnapshot, Meters, Plan, PlanError, PlanRequest, PlanSession,
    Planner, Price, ProductId, RouteDistance, RoutingError, RoutingProvider, StopLimit,
    StoreDirectory, StoreKey, StoreRecord, Transaction,
};

#[cfg(feature = "planner")]
pub use spesa_planner::ShoppingPlanner;

#[cfg(feature = "data")]
pub use spesa_data::{
    HttpRoutingProvider, NominatimGeocoder, SqlitePriceStore, SqliteStoreError,
};
