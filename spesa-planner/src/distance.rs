//! Travel-distance resolution and candidate selection.
//!
//! Distances are resolved once per distinct store address and memoized in
//! the session; a directory miss, a row without coordinates, or a provider
//! failure degrades that one store to a sentinel and never aborts the rest.

use std::collections::BTreeMap;

use log::warn;
use spesa_core::{
    Meters, PlanSession, RouteDistance, RoutingProvider, StoreDirectory, StoreKey,
};

use crate::index::PriceMatrix;

/// An in-radius store with at least one matched item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// The store's identity.
    pub key: StoreKey,
    /// Resolved travel distance from the user.
    pub distance: Meters,
}

/// Resolve travel distances for every store appearing in the matrix.
///
/// With no user location in the session, every store resolves to zero
/// metres: the radius filter is deliberately disabled so search works
/// without location permission. Outcomes are cached in the session for the
/// lifetime of the current location.
pub fn resolve_distances<R: RoutingProvider>(
    matrix: &PriceMatrix,
    directory: &StoreDirectory,
    session: &mut PlanSession,
    routing: &R,
) -> BTreeMap<StoreKey, RouteDistance> {
    let mut distances = BTreeMap::new();
    for store in matrix.stores() {
        if let Some(cached) = session.cached_distance(&store) {
            distances.insert(store, cached);
            continue;
        }
        let outcome = resolve_one(&store, directory, session, routing);
        session.record_distance(store.clone(), outcome);
        distances.insert(store, outcome);
    }
    distances
}

fn resolve_one<R: RoutingProvider>(
    store: &StoreKey,
    directory: &StoreDirectory,
    session: &PlanSession,
    routing: &R,
) -> RouteDistance {
    let Some(origin) = session.location() else {
        return RouteDistance::Resolved(Meters::ZERO);
    };
    let Some(record) = directory.find_by_address(store.address()) else {
        warn!("store {store} has no directory match; distance unresolved");
        return RouteDistance::Unresolved;
    };
    let Some(destination) = record.location else {
        warn!("store {store} has no usable coordinates in the directory");
        return RouteDistance::ProviderError;
    };
    match routing.road_distance(origin, destination) {
        Ok(distance) => RouteDistance::Resolved(distance),
        Err(err) => {
            warn!("distance lookup for {store} failed: {err}");
            RouteDistance::ProviderError
        }
    }
}

/// Stores with a resolved distance within `radius`, nearest first.
///
/// The returned order (distance, then store key) is the fixed iteration
/// order every later tie-break refers to.
#[must_use]
pub fn candidate_stores(
    distances: &BTreeMap<StoreKey, RouteDistance>,
    radius: Meters,
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = distances
        .iter()
        .filter_map(|(key, outcome)| {
            let distance = outcome.resolved()?;
            outcome.is_within(radius).then(|| Candidate {
                key: key.clone(),
                distance,
            })
        })
        .collect();
    candidates.sort_by(|a, b| a.distance.cmp(&b.distance).then_with(|| a.key.cmp(&b.key)));
    candidates
}
