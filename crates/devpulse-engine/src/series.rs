//! Ordered sample sequences.
//!
//! Every matcher and estimator in this crate requires samples sorted by
//! timestamp. [`Series`] makes that a property of the type: it can only be
//! built through [`Series::new`], which sorts.

use chrono::{DateTime, Duration, Utc};
use devpulse_core::{FollowerSnapshot, MetricSnapshot};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sample {
    pub at: DateTime<Utc>,
    pub value: i64,
}

impl Sample {
    #[must_use]
    pub fn new(at: DateTime<Utc>, value: i64) -> Self {
        Self { at, value }
    }
}

/// Inclusive time interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    #[must_use]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Range that matches every sample.
    #[must_use]
    pub fn all() -> Self {
        Self {
            start: DateTime::<Utc>::MIN_UTC,
            end: DateTime::<Utc>::MAX_UTC,
        }
    }

    /// `[center - before, center + after]`, saturating at the representable bounds.
    #[must_use]
    pub fn around(center: DateTime<Utc>, before: Duration, after: Duration) -> Self {
        Self {
            start: center
                .checked_sub_signed(before)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            end: center
                .checked_add_signed(after)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Samples sorted by timestamp, oldest first.
///
/// Sorting is stable, so samples sharing a timestamp keep their collection
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Series(Vec<Sample>);

impl Series {
    #[must_use]
    pub fn new(mut samples: Vec<Sample>) -> Self {
        samples.sort_by_key(|s| s.at);
        Self(samples)
    }

    /// One counter out of a set of lifetime snapshots. Snapshots that do not
    /// carry the counter are left out.
    #[must_use]
    pub fn from_metric_snapshots<'a, I>(snapshots: I, counter: &str) -> Self
    where
        I: IntoIterator<Item = &'a MetricSnapshot>,
    {
        Self::new(
            snapshots
                .into_iter()
                .filter_map(|s| s.counter(counter).map(|v| Sample::new(s.collected_at, v)))
                .collect(),
        )
    }

    #[must_use]
    pub fn from_follower_snapshots<'a, I>(snapshots: I) -> Self
    where
        I: IntoIterator<Item = &'a FollowerSnapshot>,
    {
        Self::new(
            snapshots
                .into_iter()
                .map(|s| Sample::new(s.collected_at, s.follower_count))
                .collect(),
        )
    }

    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<&Sample> {
        self.0.first()
    }

    #[must_use]
    pub fn last(&self) -> Option<&Sample> {
        self.0.last()
    }

    /// Samples whose timestamp lies in `range`, inclusive on both ends.
    #[must_use]
    pub fn window(&self, range: TimeRange) -> Series {
        let lo = self.0.partition_point(|s| s.at < range.start);
        let hi = self.0.partition_point(|s| s.at <= range.end);
        if lo >= hi {
            return Series::default();
        }
        Series(self.0[lo..hi].to_vec())
    }

    /// `true` when at least one sample lies in `range`.
    #[must_use]
    pub fn has_sample_in(&self, range: TimeRange) -> bool {
        let lo = self.0.partition_point(|s| s.at < range.start);
        self.0.get(lo).is_some_and(|s| s.at <= range.end)
    }
}

impl FromIterator<Sample> for Series {
    fn from_iter<T: IntoIterator<Item = Sample>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
