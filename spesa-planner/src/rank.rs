//! Single-stop ranking of candidate stores.

use spesa_core::{Meters, Price, StoreKey};

use crate::distance::Candidate;
use crate::index::PriceMatrix;

/// A candidate store scored as the sole destination for the whole list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRanking {
    /// The store's identity.
    pub store: StoreKey,
    /// Travel distance from the user.
    pub distance: Meters,
    /// Cost of every available item bought here.
    pub total: Price,
    /// Queried items the store carries.
    pub covered: usize,
    /// Queried items the store lacks.
    pub missing: usize,
}

/// Score every candidate as a standalone destination, best first.
///
/// Ordering is ascending by `(missing, total, distance, store key)`:
/// completeness strictly dominates price, and the last two components are
/// the deterministic tie-break. The head of the list is the single-stop
/// winner.
#[must_use]
pub fn rank_single_stop(matrix: &PriceMatrix, candidates: &[Candidate]) -> Vec<StoreRanking> {
    let query_count = matrix.queries().len();
    let mut rankings: Vec<StoreRanking> = candidates
        .iter()
        .map(|candidate| {
            let mut total = Price::ZERO;
            let mut covered = 0usize;
            for query in matrix.queries() {
                if let Some(quote) = matrix.quote(query, &candidate.key) {
                    total = total.saturating_add(quote.price);
                    covered += 1;
                }
            }
            StoreRanking {
                store: candidate.key.clone(),
                distance: candidate.distance,
                total,
                covered,
                missing: query_count.saturating_sub(covered),
            }
        })
        .collect();

    rankings.sort_by(|a, b| {
        a.missing
            .cmp(&b.missing)
            .then_with(|| a.total.cmp(&b.total))
            .then_with(|| a.distance.cmp(&b.distance))
            .then_with(|| a.store.cmp(&b.store))
    });
    rankings
}
