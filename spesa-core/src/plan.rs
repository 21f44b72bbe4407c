//! Plan requests, plan results, and the planner contract.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::distance::{Meters, RouteDistance};
use crate::price::Price;
use crate::session::PlanSession;
use crate::store::StoreKey;
use crate::transaction::LedgerSnapshot;

/// Maximum number of stores a plan may visit.
///
/// Serialized as `1`, `2`, `3`, or `"unbounded"`, matching the values the
/// optimizer entry point accepts.
///
/// # Examples
/// ```
/// use spesa_core::StopLimit;
///
/// assert_eq!("unbounded".parse(), Ok(StopLimit::Unbounded));
/// assert_eq!(StopLimit::Two.max_stops(), Some(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopLimit {
    /// A single store for the whole list.
    One,
    /// Up to two stores.
    Two,
    /// Up to three stores.
    Three,
    /// No limit; each item goes to its cheapest store.
    Unbounded,
}

impl StopLimit {
    /// The stop count as a number, or `None` for [`Self::Unbounded`].
    #[must_use]
    pub const fn max_stops(self) -> Option<usize> {
        match self {
            Self::One => Some(1),
            Self::Two => Some(2),
            Self::Three => Some(3),
            Self::Unbounded => None,
        }
    }
}

/// Error returned when parsing a [`StopLimit`] fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stop limit must be 1, 2, 3, or \"unbounded\", got {input:?}")]
pub struct StopLimitParseError {
    /// Offending input.
    pub input: String,
}

impl std::str::FromStr for StopLimit {
    type Err = StopLimitParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "one" => Ok(Self::One),
            "2" | "two" => Ok(Self::Two),
            "3" | "three" => Ok(Self::Three),
            "unbounded" => Ok(Self::Unbounded),
            _ => Err(StopLimitParseError {
                input: s.to_owned(),
            }),
        }
    }
}

impl std::fmt::Display for StopLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::One => f.write_str("1"),
            Self::Two => f.write_str("2"),
            Self::Three => f.write_str("3"),
            Self::Unbounded => f.write_str("unbounded"),
        }
    }
}

impl Serialize for StopLimit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::One => serializer.serialize_u8(1),
            Self::Two => serializer.serialize_u8(2),
            Self::Three => serializer.serialize_u8(3),
            Self::Unbounded => serializer.serialize_str("unbounded"),
        }
    }
}

impl<'de> Deserialize<'de> for StopLimit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Count(u8),
            Name(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Count(1) => Ok(Self::One),
            Raw::Count(2) => Ok(Self::Two),
            Raw::Count(3) => Ok(Self::Three),
            Raw::Count(other) => Err(de::Error::custom(format!(
                "stop limit must be 1, 2, 3, or \"unbounded\", got {other}"
            ))),
            Raw::Name(name) => name.parse().map_err(de::Error::custom),
        }
    }
}

/// Parameters for one optimization call.
///
/// The user location is not part of the request; it lives in the
/// [`PlanSession`] together with the distance cache it invalidates.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    /// Free-text item queries, normalized by the planner before matching.
    pub items: Vec<String>,
    /// Maximum travel distance for a candidate store.
    pub radius: Meters,
    /// Maximum number of stops in the plan.
    pub stop_limit: StopLimit,
}

/// One item assigned to the store that sells it cheapest within the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemAssignment {
    /// The normalized item query.
    pub query: String,
    /// Store to buy the item at.
    pub store: StoreKey,
    /// Best observed unit price at that store.
    pub price: Price,
    /// Product name the query matched.
    pub product: String,
}

/// Per-store sub-list of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedStop {
    /// The store to visit.
    pub store: StoreKey,
    /// Travel distance outcome for the store.
    pub distance: RouteDistance,
    /// Sum of the item prices bought here.
    pub subtotal: Price,
    /// Items to buy at this stop.
    pub items: Vec<ItemAssignment>,
}

/// The best single store for the whole list, kept for comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleStopSummary {
    /// The winning store.
    pub store: StoreKey,
    /// Cost of buying every available item there.
    pub total: Price,
    /// Queried items the store does not carry.
    pub missing_count: usize,
    /// Travel distance to the store.
    pub distance: Meters,
}

/// A cost-minimizing shopping plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Stops to make, nearest first.
    pub stops: Vec<PlannedStop>,
    /// Flat assignment in request order.
    pub assignments: Vec<ItemAssignment>,
    /// Total cost of all assigned items.
    pub total: Price,
    /// Queried items the plan could not place.
    pub missing_items: Vec<String>,
    /// The single-stop alternative, for comparison.
    pub single_stop: Option<SingleStopSummary>,
    /// Amount saved against the single-stop alternative; only when positive.
    pub savings: Option<Price>,
}

/// Errors returned by [`Planner::plan`].
///
/// These cover invalid or empty inputs and search-space policy; unresolved
/// stores, provider failures, and unmatched items are not errors. They
/// degrade to sentinels and are reported inside the [`Plan`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// No usable item queries were supplied.
    #[error("the shopping list is empty")]
    EmptyItemList,
    /// The transaction table holds no rows.
    #[error("the price ledger is empty")]
    EmptyLedger,
    /// No in-radius store matches any queried item.
    #[error("no store within {radius} matches any item on the list")]
    NoCandidateStores {
        /// Radius the search was confined to.
        radius: Meters,
    },
    /// Too many candidate stores for combination search.
    ///
    /// Enumerating k-subsets of a large candidate set is expensive; the
    /// caller must narrow the radius (or use an unbounded stop limit).
    #[error("{count} candidate stores exceed the search cap of {cap}; narrow the radius")]
    TooManyCandidates {
        /// Candidate stores after pruning.
        count: usize,
        /// Maximum the search accepts.
        cap: usize,
    },
}

/// Produce a shopping plan from a frozen ledger snapshot.
///
/// Implementations must be pure with respect to their inputs: an unchanged
/// (snapshot, session, request) triple yields an identical plan.
pub trait Planner {
    /// Compute the cost-minimizing plan for `request`.
    ///
    /// # Errors
    /// Returns [`PlanError`] for empty inputs, when no candidate store
    /// remains, or when the candidate set exceeds the combination cap.
    fn plan(
        &self,
        ledger: &LedgerSnapshot,
        session: &mut PlanSession,
        request: &PlanRequest,
    ) -> Result<Plan, PlanError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1", StopLimit::One)]
    #[case("3", StopLimit::Three)]
    #[case("unbounded", StopLimit::Unbounded)]
    #[case(" Unbounded ", StopLimit::Unbounded)]
    fn stop_limit_from_str(#[case] input: &str, #[case] expected: StopLimit) {
        assert_eq!(input.parse(), Ok(expected));
    }

    #[rstest]
    fn stop_limit_rejects_unknown_values() {
        assert!("4".parse::<StopLimit>().is_err());
        assert!("".parse::<StopLimit>().is_err());
    }

    #[rstest]
    #[case("2", StopLimit::Two)]
    #[case("\"unbounded\"", StopLimit::Unbounded)]
    fn stop_limit_deserializes_numbers_and_names(
        #[case] json: &str,
        #[case] expected: StopLimit,
    ) {
        let parsed: StopLimit = serde_json::from_str(json).expect("deserialize");
        assert_eq!(parsed, expected);
    }

    #[rstest]
    fn stop_limit_rejects_out_of_range_number() {
        assert!(serde_json::from_str::<StopLimit>("4").is_err());
    }

    #[rstest]
    fn stop_limit_serializes_like_the_wire_format() {
        assert_eq!(serde_json::to_string(&StopLimit::Two).expect("serialize"), "2");
        assert_eq!(
            serde_json::to_string(&StopLimit::Unbounded).expect("serialize"),
            "\"unbounded\""
        );
    }
}
