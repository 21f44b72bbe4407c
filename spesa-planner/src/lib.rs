//! Multi-store shopping-list optimizer.
//!
//! Given a frozen ledger snapshot, a store directory, and a routing
//! collaborator, [`ShoppingPlanner`] turns a list of item queries into a
//! cost-minimizing plan under a travel-radius and stop-count constraint.
//!
//! The pipeline has five stages: the price index
//! ([`index::PriceMatrix`]) and the distance resolver
//! ([`distance::resolve_distances`]) run independently; the single-stop
//! ranker ([`rank::rank_single_stop`]) and the combinatorial search consume
//! both; the presenter folds the winner into a [`Plan`]. Completeness
//! strictly dominates cost throughout: a plan covering more items always
//! beats a cheaper plan covering fewer.
//!
//! # Examples
//! ```
//! use spesa_core::{
//!     LedgerSnapshot, Meters, PlanRequest, PlanSession, Planner, RoutingError,
//!     RoutingProvider, StopLimit, StoreDirectory,
//! };
//! use spesa_planner::ShoppingPlanner;
//!
//! struct OfflineRouting;
//!
//! impl RoutingProvider for OfflineRouting {
//!     fn road_distance(
//!         &self,
//!         _from: geo::Coord<f64>,
//!         _to: geo::Coord<f64>,
//!     ) -> Result<Meters, RoutingError> {
//!         Err(RoutingError::NoRoute)
//!     }
//! }
//!
//! let planner = ShoppingPlanner::new(StoreDirectory::default(), OfflineRouting);
//! let request = PlanRequest {
//!     items: vec!["latte".into()],
//!     radius: Meters::from_km(10.0),
//!     stop_limit: StopLimit::One,
//! };
//! // An empty ledger is an explicit "no data" outcome, not a panic.
//! let mut session = PlanSession::new();
//! let outcome = planner.plan(&LedgerSnapshot::default(), &mut session, &request);
//! assert!(outcome.is_err());
//! ```

#![forbid(unsafe_code)]

pub mod distance;
pub mod index;
pub mod rank;

mod combo;
mod present;

use log::{debug, info};
use spesa_core::{
    CatalogEntry, LedgerSnapshot, Plan, PlanError, PlanRequest, PlanSession, Planner,
    RoutingProvider, StopLimit,
};

use crate::combo::Selection;
use crate::distance::{Candidate, candidate_stores, resolve_distances};
use crate::index::PriceMatrix;
use crate::rank::rank_single_stop;

/// Upper bound on the candidate set for combination search.
///
/// Enumerating k-subsets is `C(n, k)`; beyond this many in-radius stores the
/// planner refuses with [`PlanError::TooManyCandidates`] instead of silently
/// truncating, and the caller narrows the radius.
pub const MAX_COMBO_CANDIDATES: usize = 24;

/// The default [`Planner`] implementation.
///
/// Owns the read-only reference data (directory, optional catalog) and the
/// routing collaborator; per-call state lives in the [`PlanSession`] the
/// caller passes in.
pub struct ShoppingPlanner<R: RoutingProvider> {
    directory: spesa_core::StoreDirectory,
    catalog: Vec<CatalogEntry>,
    routing: R,
}

impl<R: RoutingProvider> ShoppingPlanner<R> {
    /// Build a planner over a store directory and a routing collaborator.
    pub fn new(directory: spesa_core::StoreDirectory, routing: R) -> Self {
        Self {
            directory,
            catalog: Vec::new(),
            routing,
        }
    }

    /// Attach a product catalog for identifier-based matching.
    #[must_use]
    pub fn with_catalog(mut self, catalog: Vec<CatalogEntry>) -> Self {
        self.catalog = catalog;
        self
    }

    fn bounded_selection(
        &self,
        matrix: &PriceMatrix,
        candidates: &[Candidate],
        stops: usize,
    ) -> Result<Selection, PlanError> {
        if candidates.len() > MAX_COMBO_CANDIDATES {
            return Err(PlanError::TooManyCandidates {
                count: candidates.len(),
                cap: MAX_COMBO_CANDIDATES,
            });
        }
        Ok(combo::best_combination(matrix, candidates, stops))
    }
}

impl<R: RoutingProvider> Planner for ShoppingPlanner<R> {
    fn plan(
        &self,
        ledger: &LedgerSnapshot,
        session: &mut PlanSession,
        request: &PlanRequest,
    ) -> Result<Plan, PlanError> {
        let matrix = PriceMatrix::build(&request.items, ledger, &self.catalog);
        if matrix.queries().is_empty() {
            return Err(PlanError::EmptyItemList);
        }
        if ledger.is_empty() {
            return Err(PlanError::EmptyLedger);
        }
        let unmatched = matrix.globally_missing();
        if !unmatched.is_empty() {
            debug!("{} item(s) match no transaction anywhere: {unmatched:?}", unmatched.len());
        }

        let distances = resolve_distances(&matrix, &self.directory, session, &self.routing);
        let candidates = candidate_stores(&distances, request.radius);
        if candidates.is_empty() {
            return Err(PlanError::NoCandidateStores {
                radius: request.radius,
            });
        }
        debug!(
            "{} candidate store(s) within {} for {} item(s)",
            candidates.len(),
            request.radius,
            matrix.queries().len()
        );

        let ranked = rank_single_stop(&matrix, &candidates);
        let selection = match request.stop_limit {
            StopLimit::One => {
                let Some(head) = ranked.first() else {
                    return Err(PlanError::NoCandidateStores {
                        radius: request.radius,
                    });
                };
                let winner: Vec<&Candidate> = candidates
                    .iter()
                    .filter(|candidate| candidate.key == head.store)
                    .collect();
                combo::assign_within(&matrix, &winner)
            }
            StopLimit::Two => self.bounded_selection(&matrix, &candidates, 2)?,
            StopLimit::Three => self.bounded_selection(&matrix, &candidates, 3)?,
            StopLimit::Unbounded => combo::assign_unbounded(&matrix, &candidates),
        };

        let plan = present::compose(selection, &candidates, &ranked);
        info!(
            "planned {} item(s) across {} stop(s), total {}, {} missing",
            plan.assignments.len(),
            plan.stops.len(),
            plan.total,
            plan.missing_items.len()
        );
        Ok(plan)
    }
}
