//! HTTP implementations of the routing and geocoding contracts.
//!
//! [`HttpRoutingProvider`] queries an OSRM route service for road distances;
//! [`NominatimGeocoder`] resolves free-text addresses. Both keep the core
//! traits synchronous by blocking on an internally owned Tokio runtime, and
//! both apply a short per-request timeout so that one slow provider call
//! degrades a single store rather than stalling the whole plan.

mod nominatim;
mod osrm;
mod provider;

use std::future::Future;

use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};

pub use nominatim::{NominatimGeocoder, NominatimGeocoderConfig};
pub use provider::{HttpRoutingProvider, HttpRoutingProviderConfig};

/// Error type for provider construction failures.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Build the current-thread runtime a provider blocks on.
pub(crate) fn build_runtime() -> Result<Runtime, ProviderBuildError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(ProviderBuildError::Runtime)
}

/// Drive `future` to completion from synchronous code.
///
/// When called inside a multi-threaded Tokio runtime, that runtime's handle
/// is used via `block_in_place` to avoid nested-runtime panics; otherwise
/// the provider's own runtime drives the future. Calling from inside a
/// `current_thread` runtime falls back to the stored runtime, which may
/// deadlock if the caller's runtime drives IO this request depends on.
pub(crate) fn run_blocking<F: Future>(runtime: &Runtime, future: F) -> F::Output {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| handle.block_on(future))
        }
        _ => runtime.block_on(future),
    }
}
