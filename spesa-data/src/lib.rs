//! Data access for the Spesa engine.
//!
//! Two concerns live here: SQLite-backed persistence for the price ledger,
//! product catalog, and store directory ([`SqlitePriceStore`]), and HTTP
//! implementations of the core routing and geocoding traits
//! ([`HttpRoutingProvider`] against an OSRM instance, [`NominatimGeocoder`]
//! against a Nominatim instance).

#![forbid(unsafe_code)]

pub mod routing;
pub mod store;

pub use routing::{
    HttpRoutingProvider, HttpRoutingProviderConfig, NominatimGeocoder, NominatimGeocoderConfig,
    ProviderBuildError,
};
pub use store::{SqlitePriceStore, SqliteStoreError};
