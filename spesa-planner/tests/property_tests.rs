//! Property-based tests for the shopping planner.
//!
//! # Invariants tested
//!
//! - **Monotonicity:** allowing more stops never produces a worse
//!   `(missing, total)` outcome than the single-stop plan.
//! - **Unbounded optimality:** with no stop limit, every item is bought at
//!   its global minimum price across the candidate set.
//! - **Idempotence:** identical inputs yield identical plans.

use geo::Coord;
use proptest::prelude::*;
use spesa_core::test_support::{FixedRoutingProvider, store_record, transaction};
use spesa_core::{
    LedgerSnapshot, Meters, PlanRequest, PlanSession, Planner, Price, StopLimit, StoreDirectory,
};
use spesa_planner::ShoppingPlanner;

const HOME: Coord<f64> = Coord { x: 9.19, y: 45.46 };
const STORES: usize = 5;
const ITEMS: usize = 5;

/// (store index, item index, unit price in cents).
type Row = (usize, usize, u64);

fn row_strategy() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec((0..STORES, 0..ITEMS, 1u64..=500), 1..40)
}

fn store_coord(store: usize) -> Coord<f64> {
    Coord {
        x: 9.0 + store as f64 * 0.01,
        y: 45.0,
    }
}

fn fixture(rows: &[Row]) -> (LedgerSnapshot, ShoppingPlanner<FixedRoutingProvider>) {
    let ledger = LedgerSnapshot::new(
        rows.iter()
            .map(|&(store, item, cents)| {
                transaction(
                    &format!("Negozio {store}"),
                    &format!("Via Test {store}"),
                    &format!("ARTICOLO{item}"),
                    cents,
                )
            })
            .collect(),
    );
    let directory = StoreDirectory::new(
        (0..STORES)
            .map(|store| {
                let coord = store_coord(store);
                store_record(
                    &format!("Negozio {store}"),
                    &format!("Via Test {store}"),
                    coord.x,
                    coord.y,
                )
            })
            .collect(),
    );
    let mut routing = FixedRoutingProvider::new();
    for store in 0..STORES {
        routing = routing.with_route(store_coord(store), Meters::from_km(store as f64 + 1.0));
    }
    (ledger, ShoppingPlanner::new(directory, routing))
}

fn request(stop_limit: StopLimit) -> PlanRequest {
    PlanRequest {
        items: (0..ITEMS).map(|item| format!("ARTICOLO{item}")).collect(),
        radius: Meters::from_km(100.0),
        stop_limit,
    }
}

fn stop_limit_strategy() -> impl Strategy<Value = StopLimit> {
    prop_oneof![
        Just(StopLimit::One),
        Just(StopLimit::Two),
        Just(StopLimit::Three),
        Just(StopLimit::Unbounded),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// More stops never lose to one stop: the bounded search considers every
    /// pair, and each pair covers at least what its members cover alone.
    #[test]
    fn bounded_search_never_loses_to_single_stop(rows in row_strategy()) {
        let (ledger, planner) = fixture(&rows);

        let mut session = PlanSession::with_location(HOME);
        let single = planner
            .plan(&ledger, &mut session, &request(StopLimit::One))
            .expect("single-stop plan");
        let pair = planner
            .plan(&ledger, &mut session, &request(StopLimit::Two))
            .expect("two-stop plan");

        prop_assert!(
            (pair.missing_items.len(), pair.total) <= (single.missing_items.len(), single.total),
            "pair {:?} worse than single {:?}",
            (pair.missing_items.len(), pair.total),
            (single.missing_items.len(), single.total),
        );
        if pair.missing_items.len() == single.missing_items.len() {
            prop_assert!(pair.total <= single.total);
        }
    }

    /// Unbounded plans buy every item at its global minimum price.
    #[test]
    fn unbounded_assigns_global_minimum(rows in row_strategy()) {
        let (ledger, planner) = fixture(&rows);

        let mut session = PlanSession::with_location(HOME);
        let plan = planner
            .plan(&ledger, &mut session, &request(StopLimit::Unbounded))
            .expect("unbounded plan");

        for assignment in &plan.assignments {
            let item: usize = assignment
                .query
                .trim_start_matches("ARTICOLO")
                .parse()
                .expect("query names are synthetic");
            let global_min = rows
                .iter()
                .filter(|&&(_, row_item, _)| row_item == item)
                .map(|&(_, _, cents)| cents)
                .min()
                .expect("assigned items have at least one row");
            prop_assert_eq!(assignment.price, Price::from_cents(global_min));
        }
    }

    /// A frozen ledger, directory, and request always produce the same plan.
    #[test]
    fn planning_is_idempotent(
        rows in row_strategy(),
        stop_limit in stop_limit_strategy(),
    ) {
        let (ledger, planner) = fixture(&rows);

        let mut first_session = PlanSession::with_location(HOME);
        let first = planner.plan(&ledger, &mut first_session, &request(stop_limit));
        let mut second_session = PlanSession::with_location(HOME);
        let second = planner.plan(&ledger, &mut second_session, &request(stop_limit));

        prop_assert_eq!(first, second);
    }
}
