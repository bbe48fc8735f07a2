use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use devpulse_core::EventType;
use serde::Serialize;

use crate::series::{Series, TimeRange};
use crate::velocity::average_velocity;

/// Sentinel for growth starting from a zero baseline.
pub const NEW_ACTIVITY_PCT: f64 = 100.0;

/// Percentage change from `before` to `after`.
///
/// A zero baseline yields [`NEW_ACTIVITY_PCT`] when activity started and
/// `0.0` when there was none on either side; never infinity or NaN.
#[must_use]
pub fn impact_pct(before: f64, after: f64) -> f64 {
    if before > 0.0 {
        (after - before) / before * 100.0
    } else if after > 0.0 {
        NEW_ACTIVITY_PCT
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImpactResult {
    pub event_time: DateTime<Utc>,
    pub before_velocity: f64,
    pub after_velocity: f64,
    pub impact_pct: f64,
}

/// Compare average velocity in the windows just before and just after `event_time`.
///
/// A sample exactly at `event_time` belongs to both windows.
#[must_use]
pub fn impact(
    event_time: DateTime<Utc>,
    before_window: Duration,
    after_window: Duration,
    series: &Series,
) -> ImpactResult {
    let before_range = TimeRange::around(event_time, before_window, Duration::zero());
    let after_range = TimeRange::around(event_time, Duration::zero(), after_window);

    let before_velocity = average_velocity(&series.window(before_range));
    let after_velocity = average_velocity(&series.window(after_range));

    ImpactResult {
        event_time,
        before_velocity,
        after_velocity,
        impact_pct: impact_pct(before_velocity, after_velocity),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImpactSummary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Mean, min and max impact per event type.
#[must_use]
pub fn summarize_by_event_type<I>(rows: I) -> BTreeMap<EventType, ImpactSummary>
where
    I: IntoIterator<Item = (EventType, f64)>,
{
    let mut grouped: BTreeMap<EventType, Vec<f64>> = BTreeMap::new();
    for (event_type, pct) in rows {
        grouped.entry(event_type).or_default().push(pct);
    }

    grouped
        .into_iter()
        .map(|(event_type, values)| {
            #[allow(clippy::cast_precision_loss)]
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            let summary = ImpactSummary {
                count: values.len(),
                mean,
                min: values.iter().copied().fold(f64::INFINITY, f64::min),
                max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            };
            (event_type, summary)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::series::test_support::{hourly, t0};

    #[test]
    fn doubling_velocity_is_plus_100_pct() {
        assert!((impact_pct(2.0, 4.0) - 100.0).abs() < 1e-9);
        assert!((impact_pct(4.0, 1.0) + 75.0).abs() < 1e-9);
    }

    #[test]
    fn impact_measures_around_event() {
        // 1 view/hour for the day before, 3 views/hour for the day after.
        let series = hourly(&[(-24, 0), (-12, 12), (0, 24), (12, 60), (24, 96)]);
        let event = t0();
        let result = impact(event, Duration::hours(24), Duration::hours(24), &series);
        assert!((result.before_velocity - 1.0).abs() < 1e-9);
        assert!((result.after_velocity - 3.0).abs() < 1e-9);
        assert!((result.impact_pct - 200.0).abs() < 1e-9);
    }

    #[test]
    fn no_samples_before_event_is_new_activity() {
        let series = hourly(&[(0, 0), (10, 50)]);
        let result = impact(t0(), Duration::hours(24), Duration::hours(24), &series);
        assert_eq!(result.before_velocity, 0.0);
        assert_eq!(result.impact_pct, NEW_ACTIVITY_PCT);
    }

    #[test]
    fn summary_groups_by_type() {
        let rows = vec![
            (EventType::TitleChange, 10.0),
            (EventType::TitleChange, -30.0),
            (EventType::StaffCurated, 250.0),
        ];
        let summary = summarize_by_event_type(rows);
        let title = summary[&EventType::TitleChange];
        assert_eq!(title.count, 2);
        assert!((title.mean + 10.0).abs() < 1e-9);
        assert_eq!(title.min, -30.0);
        assert_eq!(title.max, 10.0);
        assert_eq!(summary[&EventType::StaffCurated].count, 1);
        assert!(!summary.contains_key(&EventType::Manual));
    }

    proptest! {
        #[test]
        fn zero_baseline_sentinels(after in 0.0f64..1e9) {
            let pct = impact_pct(0.0, after);
            if after > 0.0 {
                prop_assert_eq!(pct, NEW_ACTIVITY_PCT);
            } else {
                prop_assert_eq!(pct, 0.0);
            }
        }

        #[test]
        fn impact_pct_is_always_finite(before in 0.0f64..1e9, after in 0.0f64..1e9) {
            prop_assert!(impact_pct(before, after).is_finite());
        }
    }
}
