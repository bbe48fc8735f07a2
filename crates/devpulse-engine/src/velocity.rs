//! Rate-of-change estimation over irregularly spaced samples.
//!
//! Rates are expressed in units per hour. Pairwise rates used for averaging
//! are floored at zero: lifetime counters only grow by intent, so a decline
//! between two samples is treated as collection noise rather than allowed to
//! cancel real growth. Period velocity keeps the sign.

use chrono::Duration;
use serde::Serialize;

use crate::series::Series;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

#[allow(clippy::cast_precision_loss)]
fn hours(d: Duration) -> f64 {
    d.num_milliseconds() as f64 / MILLIS_PER_HOUR
}

/// Clamped rates between consecutive samples, skipping pairs whose time
/// delta is zero or negative.
fn pairwise_rates(series: &Series) -> Vec<f64> {
    series
        .samples()
        .windows(2)
        .filter_map(|pair| {
            let dt = hours(pair[1].at - pair[0].at);
            if dt <= 0.0 {
                return None;
            }
            #[allow(clippy::cast_precision_loss)]
            let dv = pair[1].value.saturating_sub(pair[0].value).max(0) as f64;
            Some(dv / dt)
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean of the clamped pairwise rates. `0.0` with fewer than two samples.
#[must_use]
pub fn average_velocity(series: &Series) -> f64 {
    mean(&pairwise_rates(series))
}

/// First-to-last difference divided by elapsed hours. Not clamped.
///
/// `0.0` with fewer than two samples or no elapsed time.
#[must_use]
pub fn period_velocity(series: &Series) -> f64 {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return 0.0;
    };
    let dt = hours(last.at - first.at);
    if dt <= 0.0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let dv = last.value.saturating_sub(first.value) as f64;
    dv / dt
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VelocityProfile {
    pub average: f64,
    pub peak: f64,
    /// Rate over the most recent valid pair.
    pub current: f64,
    pub pairs: usize,
}

/// Average, peak and current clamped rates. `None` without a valid pair.
#[must_use]
pub fn velocity_profile(series: &Series) -> Option<VelocityProfile> {
    let rates = pairwise_rates(series);
    let current = *rates.last()?;
    Some(VelocityProfile {
        average: mean(&rates),
        peak: rates.iter().copied().fold(0.0, f64::max),
        current,
        pairs: rates.len(),
    })
}

/// Interval distribution buckets, in hours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CadenceHistogram {
    pub under_1h: usize,
    pub from_1h_to_2h: usize,
    pub from_2h_to_4h: usize,
    pub from_4h_to_6h: usize,
    pub over_6h: usize,
}

impl CadenceHistogram {
    fn record(&mut self, interval_hours: f64) {
        let bucket = if interval_hours < 1.0 {
            &mut self.under_1h
        } else if interval_hours < 2.0 {
            &mut self.from_1h_to_2h
        } else if interval_hours < 4.0 {
            &mut self.from_2h_to_4h
        } else if interval_hours <= 6.0 {
            &mut self.from_4h_to_6h
        } else {
            &mut self.over_6h
        };
        *bucket += 1;
    }
}

/// How regularly a series was collected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplingCadence {
    pub intervals: usize,
    pub min_hours: f64,
    pub max_hours: f64,
    pub mean_hours: f64,
    pub median_hours: f64,
    pub histogram: CadenceHistogram,
}

/// Interval statistics between consecutive samples. `None` with fewer than
/// two samples.
#[must_use]
pub fn sampling_cadence(series: &Series) -> Option<SamplingCadence> {
    let mut intervals: Vec<f64> = series
        .samples()
        .windows(2)
        .map(|pair| hours(pair[1].at - pair[0].at))
        .collect();
    if intervals.is_empty() {
        return None;
    }

    let mut histogram = CadenceHistogram::default();
    for &h in &intervals {
        histogram.record(h);
    }

    intervals.sort_by(f64::total_cmp);
    let n = intervals.len();
    let median = if n % 2 == 0 {
        (intervals[n / 2 - 1] + intervals[n / 2]) / 2.0
    } else {
        intervals[n / 2]
    };

    Some(SamplingCadence {
        intervals: n,
        min_hours: intervals[0],
        max_hours: intervals[n - 1],
        mean_hours: mean(&intervals),
        median_hours: median,
        histogram,
    })
}

/// Weekly rate of a total accumulated over `min(age, retention)` whole days.
///
/// A total that only covers the retention window must not be spread over the
/// full lifetime of an older entity. `0.0` when the divisor is under a day.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn retention_adjusted_weekly_rate(total: i64, age: Duration, retention: Duration) -> f64 {
    let days = age.min(retention).num_days();
    if days <= 0 {
        return 0.0;
    }
    total as f64 / days as f64 * 7.0
}
