//! Assembly of the final plan from an assignment.

use std::collections::BTreeMap;

use spesa_core::{
    ItemAssignment, Meters, Plan, PlannedStop, Price, RouteDistance, SingleStopSummary, StoreKey,
};

use crate::combo::Selection;
use crate::distance::Candidate;
use crate::rank::StoreRanking;

/// Group the winning assignment into per-store stops and attach the
/// single-stop comparison.
pub(crate) fn compose(
    selection: Selection,
    candidates: &[Candidate],
    ranked: &[StoreRanking],
) -> Plan {
    let mut grouped: BTreeMap<StoreKey, Vec<ItemAssignment>> = BTreeMap::new();
    for assignment in &selection.assignments {
        grouped
            .entry(assignment.store.clone())
            .or_default()
            .push(assignment.clone());
    }

    let mut stops: Vec<PlannedStop> = grouped
        .into_iter()
        .map(|(store, items)| {
            let subtotal = items
                .iter()
                .fold(Price::ZERO, |acc, item| acc.saturating_add(item.price));
            let distance = candidates
                .iter()
                .find(|candidate| candidate.key == store)
                .map_or(RouteDistance::Unresolved, |candidate| {
                    RouteDistance::Resolved(candidate.distance)
                });
            PlannedStop {
                store,
                distance,
                subtotal,
                items,
            }
        })
        .collect();
    stops.sort_by(|a, b| {
        sort_distance(a.distance)
            .cmp(&sort_distance(b.distance))
            .then_with(|| a.store.cmp(&b.store))
    });

    let single_stop = ranked.first().map(|head| SingleStopSummary {
        store: head.store.clone(),
        total: head.total,
        missing_count: head.missing,
        distance: head.distance,
    });
    let savings = single_stop.as_ref().and_then(|single| {
        single
            .total
            .checked_sub(selection.total)
            .filter(|saved| !saved.is_zero())
    });

    Plan {
        stops,
        assignments: selection.assignments,
        total: selection.total,
        missing_items: selection.missing,
        single_stop,
        savings,
    }
}

fn sort_distance(distance: RouteDistance) -> Meters {
    distance.resolved().unwrap_or(Meters::new(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn assignment(query: &str, store: &str, address: &str, cents: u64) -> ItemAssignment {
        ItemAssignment {
            query: query.to_owned(),
            store: StoreKey::new(store, address),
            price: Price::from_cents(cents),
            product: query.to_owned(),
        }
    }

    fn candidate(store: &str, address: &str, meters: u32) -> Candidate {
        Candidate {
            key: StoreKey::new(store, address),
            distance: Meters::new(meters),
        }
    }

    #[rstest]
    fn groups_by_store_with_subtotals() {
        let selection = Selection {
            assignments: vec![
                assignment("LATTE", "Aldi", "Via Po 2", 100),
                assignment("PANE", "Conad", "Via Roma 1", 90),
                assignment("UOVA", "Aldi", "Via Po 2", 210),
            ],
            missing: vec![],
            total: Price::from_cents(400),
        };
        let candidates = vec![
            candidate("Conad", "Via Roma 1", 5_000),
            candidate("Aldi", "Via Po 2", 8_000),
        ];

        let plan = compose(selection, &candidates, &[]);
        assert_eq!(plan.stops.len(), 2);
        let nearest = plan.stops.first().expect("two stops");
        assert_eq!(nearest.store.name(), "CONAD");
        assert_eq!(nearest.subtotal, Price::from_cents(90));
        let farthest = plan.stops.last().expect("two stops");
        assert_eq!(farthest.subtotal, Price::from_cents(310));
        assert_eq!(farthest.items.len(), 2);
    }

    #[rstest]
    fn savings_only_reported_when_positive() {
        let selection = Selection {
            assignments: vec![assignment("LATTE", "Aldi", "Via Po 2", 100)],
            missing: vec![],
            total: Price::from_cents(100),
        };
        let ranked = vec![StoreRanking {
            store: StoreKey::new("Aldi", "Via Po 2"),
            distance: Meters::new(8_000),
            total: Price::from_cents(100),
            covered: 1,
            missing: 0,
        }];
        let candidates = vec![candidate("Aldi", "Via Po 2", 8_000)];

        let plan = compose(selection, &candidates, &ranked);
        assert_eq!(plan.savings, None);
        assert_eq!(
            plan.single_stop.map(|s| s.total),
            Some(Price::from_cents(100))
        );
    }
}
