//! Combinatorial search over store subsets.
//!
//! For a stop limit of `k`, every size-`k` combination of the candidate set
//! is scored by `(items missing in the combination, total cost)` compared
//! lexicographically, so completeness strictly dominates cost. Within a
//! combination each item goes to the cheapest member store; price ties fall
//! to the earlier store in the canonical candidate order (nearest, then
//! alphabetical key).

use spesa_core::{ItemAssignment, Price};

use crate::distance::Candidate;
use crate::index::PriceMatrix;

/// An item-to-store assignment with its cost and leftovers.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Selection {
    pub(crate) assignments: Vec<ItemAssignment>,
    pub(crate) missing: Vec<String>,
    pub(crate) total: Price,
}

impl Selection {
    fn score(&self) -> (usize, Price) {
        (self.missing.len(), self.total)
    }
}

/// Assign every query to the cheapest store among `stores`.
pub(crate) fn assign_within(matrix: &PriceMatrix, stores: &[&Candidate]) -> Selection {
    let mut assignments = Vec::new();
    let mut missing = Vec::new();
    let mut total = Price::ZERO;

    for query in matrix.queries() {
        let mut best: Option<(&Candidate, Price, &str)> = None;
        for candidate in stores {
            let Some(quote) = matrix.quote(query, &candidate.key) else {
                continue;
            };
            let better = best.is_none_or(|(_, price, _)| quote.price < price);
            if better {
                best = Some((candidate, quote.price, quote.product.as_str()));
            }
        }
        match best {
            Some((candidate, price, product)) => {
                total = total.saturating_add(price);
                assignments.push(ItemAssignment {
                    query: query.clone(),
                    store: candidate.key.clone(),
                    price,
                    product: product.to_owned(),
                });
            }
            None => missing.push(query.clone()),
        }
    }

    Selection {
        assignments,
        missing,
        total,
    }
}

/// Best assignment over all combinations of at most `k` candidates.
///
/// When fewer than `k` candidates exist the single all-store combination is
/// scored, so a two-stop search over one store degenerates to the
/// single-stop result. The first combination in enumeration order wins
/// score ties, which is deterministic because candidates arrive in canonical
/// order.
pub(crate) fn best_combination(
    matrix: &PriceMatrix,
    candidates: &[Candidate],
    k: usize,
) -> Selection {
    let size = k.min(candidates.len());
    if size == 0 {
        return assign_within(matrix, &[]);
    }

    let mut best: Option<Selection> = None;
    for combination in Combinations::new(candidates.len(), size) {
        let stores: Vec<&Candidate> = combination
            .iter()
            .filter_map(|&i| candidates.get(i))
            .collect();
        let selection = assign_within(matrix, &stores);
        let better = best
            .as_ref()
            .is_none_or(|current| selection.score() < current.score());
        if better {
            best = Some(selection);
        }
    }
    best.unwrap_or_else(|| assign_within(matrix, &[]))
}

/// Assign each item to its cheapest store across the whole candidate set.
pub(crate) fn assign_unbounded(matrix: &PriceMatrix, candidates: &[Candidate]) -> Selection {
    let stores: Vec<&Candidate> = candidates.iter().collect();
    assign_within(matrix, &stores)
}

/// Lexicographic k-combinations of `0..n`.
struct Combinations {
    n: usize,
    k: usize,
    indices: Vec<usize>,
    started: bool,
}

impl Combinations {
    fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            k,
            indices: (0..k).collect(),
            started: false,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.k > self.n || self.k == 0 {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.indices.clone());
        }
        let mut position = self.k;
        while position > 0 {
            position -= 1;
            let ceiling = self.n - self.k + position;
            let Some(value) = self.indices.get(position).copied() else {
                return None;
            };
            if value < ceiling {
                for (offset, slot) in self.indices.iter_mut().skip(position).enumerate() {
                    *slot = value + 1 + offset;
                }
                return Some(self.indices.clone());
            }
        }
        None
    }
}
