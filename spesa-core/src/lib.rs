//! Core domain types for the Spesa shopping-plan engine.
//!
//! The crate models the facts the planner works over: historical purchase
//! [`Transaction`]s frozen into a [`LedgerSnapshot`], the [`StoreDirectory`]
//! of known shops, exact [`Price`] amounts, and travel [`Meters`]. The
//! routing and geocoding collaborators are traits so the planner stays
//! independent of any HTTP provider, and the [`Planner`] trait is the single
//! entry point outer layers call.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod catalog;
pub mod distance;
pub mod normalize;
pub mod plan;
pub mod price;
pub mod session;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;
pub mod transaction;

pub use catalog::{CatalogEntry, ProductId};
pub use distance::{
    GeocodeError, Geocoder, Meters, RouteDistance, RoutingError, RoutingProvider,
};
pub use plan::{
    ItemAssignment, Plan, PlanError, PlanRequest, PlannedStop, Planner, SingleStopSummary,
    StopLimit, StopLimitParseError,
};
pub use price::{Price, PriceParseError};
pub use session::PlanSession;
pub use store::{StoreDirectory, StoreKey, StoreRecord};
pub use transaction::{LedgerSnapshot, Transaction};
