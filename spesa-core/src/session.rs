//! Per-session planning context.
//!
//! The original application kept the user's location and the last analysis in
//! process-wide mutable state; here the same data travels in an explicit
//! [`PlanSession`] value passed into the planner.

use std::collections::HashMap;

use geo::Coord;

use crate::distance::RouteDistance;
use crate::store::StoreKey;

/// Mutable context for one user session.
///
/// Holds the optional user location and memoizes resolved distances, which
/// depend only on (location, store coordinates) and are therefore valid for
/// as long as the location stands. Changing the location drops the cache.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanSession {
    location: Option<Coord<f64>>,
    distances: HashMap<StoreKey, RouteDistance>,
}

impl PlanSession {
    /// Session without a known user location.
    ///
    /// Every store then resolves to a zero distance and the radius filter is
    /// effectively disabled, so search stays usable without location
    /// permission.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Session anchored at a user location (`x = longitude, y = latitude`).
    #[must_use]
    pub fn with_location(location: Coord<f64>) -> Self {
        Self {
            location: Some(location),
            distances: HashMap::new(),
        }
    }

    /// The user location, when set.
    #[must_use]
    pub fn location(&self) -> Option<Coord<f64>> {
        self.location
    }

    /// Replace the user location, dropping cached distances when it changes.
    pub fn set_location(&mut self, location: Option<Coord<f64>>) {
        if self.location != location {
            self.distances.clear();
        }
        self.location = location;
    }

    /// Cached distance for `store`, when resolved earlier this session.
    #[must_use]
    pub fn cached_distance(&self, store: &StoreKey) -> Option<RouteDistance> {
        self.distances.get(store).copied()
    }

    /// Memoize the distance outcome for `store`.
    pub fn record_distance(&mut self, store: StoreKey, distance: RouteDistance) {
        self.distances.insert(store, distance);
    }

    /// Drop all cached distances.
    pub fn clear_distances(&mut self) {
        self.distances.clear();
    }
}
