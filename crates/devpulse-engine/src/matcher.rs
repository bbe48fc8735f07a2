use chrono::{DateTime, Duration, Utc};

use crate::series::{Sample, Series};

/// Find the sample closest in time to `target`.
///
/// With `tolerance == None` the whole series is searched. Otherwise the
/// closest sample is only returned when it lies within
/// `[target - tolerance, target + tolerance]`.
///
/// Ties in distance go to the earlier sample, and among samples sharing a
/// timestamp the first one in collection order wins. Because the candidate is
/// always the globally closest sample, widening the tolerance can only turn
/// `None` into `Some`, never change which sample is returned.
#[must_use]
pub fn find_nearest(
    series: &Series,
    target: DateTime<Utc>,
    tolerance: Option<Duration>,
) -> Option<&Sample> {
    let samples = series.samples();
    let idx = samples.partition_point(|s| s.at < target);

    let before = idx.checked_sub(1).map(|i| {
        let at = samples[i].at;
        &samples[samples.partition_point(|s| s.at < at)]
    });
    let after = samples.get(idx);

    let nearest = match (before, after) {
        (Some(b), Some(a)) => {
            if a.at - target < target - b.at {
                a
            } else {
                b
            }
        }
        (Some(b), None) => b,
        (None, Some(a)) => a,
        (None, None) => return None,
    };

    match tolerance {
        Some(tol) if distance(nearest.at, target) > tol => None,
        _ => Some(nearest),
    }
}

fn distance(a: DateTime<Utc>, b: DateTime<Utc>) -> Duration {
    (a - b).abs()
}
