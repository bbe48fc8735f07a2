//! Proportional attribution of one aggregate change across entities.
//!
//! Each entity with a positive delta gets a share of the aggregate equal to
//! its share of the total positive delta. This estimates correlation weight,
//! not causation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use devpulse_core::EntityId;
use serde::Serialize;

use crate::series::TimeRange;

/// Split `aggregate_delta` across entities in proportion to their positive deltas.
///
/// Returns an empty map when `aggregate_delta <= 0` or no entity has a
/// positive delta. Entities with a zero or negative delta never enter the
/// denominator; with `floor_negative` they are omitted, otherwise they are
/// listed with `0.0`. The attributed amounts sum to `aggregate_delta` up to
/// floating-point rounding.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn attribute(
    aggregate_delta: i64,
    entity_deltas: &BTreeMap<EntityId, i64>,
    floor_negative: bool,
) -> BTreeMap<EntityId, f64> {
    if aggregate_delta <= 0 {
        return BTreeMap::new();
    }

    let total_positive: i128 = entity_deltas
        .values()
        .filter(|d| **d > 0)
        .map(|d| i128::from(*d))
        .sum();
    if total_positive == 0 {
        return BTreeMap::new();
    }

    let total = total_positive as f64;
    let aggregate = aggregate_delta as f64;

    entity_deltas
        .iter()
        .filter_map(|(&id, &delta)| {
            if delta > 0 {
                Some((id, delta as f64 / total * aggregate))
            } else if floor_negative {
                None
            } else {
                Some((id, 0.0))
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributionResult {
    pub entity_id: EntityId,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub entity_delta: i64,
    pub share_of_aggregate: f64,
    pub attributed_amount: f64,
}

/// [`attribute`] expanded into full result rows, largest attribution first.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn attribute_window(
    aggregate_delta: i64,
    entity_deltas: &BTreeMap<EntityId, i64>,
    window: TimeRange,
    floor_negative: bool,
) -> Vec<AttributionResult> {
    let attributed = attribute(aggregate_delta, entity_deltas, floor_negative);
    let aggregate = aggregate_delta as f64;

    let mut rows: Vec<AttributionResult> = attributed
        .into_iter()
        .map(|(entity_id, attributed_amount)| AttributionResult {
            entity_id,
            window_start: window.start,
            window_end: window.end,
            entity_delta: entity_deltas.get(&entity_id).copied().unwrap_or(0),
            share_of_aggregate: attributed_amount / aggregate,
            attributed_amount,
        })
        .collect();

    rows.sort_by(|a, b| {
        b.attributed_amount
            .total_cmp(&a.attributed_amount)
            .then(a.entity_id.cmp(&b.entity_id))
    });
    rows
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    use super::*;

    fn deltas(pairs: &[(EntityId, i64)]) -> BTreeMap<EntityId, i64> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn proportional_split_excludes_losers() {
        let result = attribute(30, &deltas(&[(1, 300), (2, 100), (3, -50)]), true);
        assert_eq!(result.len(), 2);
        assert!((result[&1] - 22.5).abs() < 1e-9);
        assert!((result[&2] - 7.5).abs() < 1e-9);
        assert!(!result.contains_key(&3));
    }

    #[test]
    fn unfloored_losers_are_listed_with_zero() {
        let result = attribute(30, &deltas(&[(1, 300), (2, 100), (3, -50), (4, 0)]), false);
        assert_eq!(result.len(), 4);
        assert_eq!(result[&3], 0.0);
        assert_eq!(result[&4], 0.0);
        let sum: f64 = result.values().sum();
        assert!((sum - 30.0).abs() < 1e-9);
    }

    #[test]
    fn non_positive_aggregate_yields_empty() {
        assert!(attribute(0, &deltas(&[(1, 10)]), true).is_empty());
        assert!(attribute(-5, &deltas(&[(1, 10)]), false).is_empty());
    }

    #[test]
    fn no_positive_entity_yields_empty() {
        assert!(attribute(10, &deltas(&[(1, 0), (2, -3)]), false).is_empty());
        assert!(attribute(10, &BTreeMap::new(), true).is_empty());
    }

    #[test]
    fn window_rows_are_sorted_and_carry_shares() {
        let start = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        let window = TimeRange::new(start, start + Duration::days(7));
        let rows = attribute_window(30, &deltas(&[(1, 100), (2, 300), (3, -50)]), window, true);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].entity_id, 2);
        assert_eq!(rows[0].entity_delta, 300);
        assert!((rows[0].share_of_aggregate - 0.75).abs() < 1e-9);
        assert_eq!(rows[0].window_end, start + Duration::days(7));
    }

    proptest! {
        #[test]
        fn attributed_amounts_conserve_the_aggregate(
            aggregate in 1i64..1_000_000,
            entries in prop::collection::btree_map(0i64..200, -10_000i64..10_000, 0..50),
            floor in any::<bool>(),
        ) {
            let result = attribute(aggregate, &entries, floor);
            let any_positive = entries.values().any(|d| *d > 0);
            if any_positive {
                let sum: f64 = result.values().sum();
                #[allow(clippy::cast_precision_loss)]
                let expected = aggregate as f64;
                prop_assert!((sum - expected).abs() <= 1e-6 * expected.max(1.0));
            } else {
                prop_assert!(result.is_empty());
            }
            prop_assert!(result.values().all(|v| *v >= 0.0));
        }
    }
}
