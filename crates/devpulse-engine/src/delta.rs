use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::EngineError;
use crate::matcher::find_nearest;
use crate::series::{Series, TimeRange};

/// Signed change between two counter readings. Negative results are valid.
#[must_use]
pub fn compute_delta(start_value: i64, end_value: i64) -> i64 {
    end_value.saturating_sub(start_value)
}

/// Change of a counter over a period, with the matched endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowedDelta {
    pub gain: i64,
    pub start_value: i64,
    pub end_value: i64,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    /// Both endpoints came from the same sample, or no sample lies inside the
    /// period itself and the match leaned entirely on the tolerance.
    pub suspicious: bool,
}

/// Change of the counter between `period.start` and `period.end`.
///
/// Each endpoint is matched independently with `tolerance`.
///
/// # Errors
///
/// Returns [`EngineError::InsufficientData`] when either endpoint has no
/// sample within the tolerance.
pub fn compute_windowed_delta(
    series: &Series,
    period: TimeRange,
    tolerance: Duration,
) -> Result<WindowedDelta, EngineError> {
    let start = find_nearest(series, period.start, Some(tolerance)).ok_or_else(|| {
        EngineError::insufficient(format!(
            "no sample within {}h of period start {}",
            tolerance.num_hours(),
            period.start.to_rfc3339()
        ))
    })?;
    let end = find_nearest(series, period.end, Some(tolerance)).ok_or_else(|| {
        EngineError::insufficient(format!(
            "no sample within {}h of period end {}",
            tolerance.num_hours(),
            period.end.to_rfc3339()
        ))
    })?;

    let suspicious = std::ptr::eq(start, end) || !series.has_sample_in(period);

    Ok(WindowedDelta {
        gain: compute_delta(start.value, end.value),
        start_value: start.value,
        end_value: end.value,
        start_at: start.at,
        end_at: end.at,
        suspicious,
    })
}
