use serde::Serialize;

use crate::error::EngineError;

/// Whether a day-bucketed counter holds running totals or per-day activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterSemantics {
    Cumulative,
    Incremental,
}

/// Decide how to read a sequence of daily values, oldest first.
///
/// A decrease between consecutive days rules out a running total. Without
/// one, the values are compared against the lifetime counter: a maximum
/// close to it reads as cumulative, a sum close to it as incremental.
///
/// # Errors
///
/// Returns [`EngineError::AmbiguousSemantics`] when the values are empty, or
/// when both or neither comparison falls within `tolerance`. The caller is
/// expected to flag the counter for manual verification rather than guess.
pub fn infer_semantics(
    counter: &str,
    daily_values: &[i64],
    lifetime: i64,
    tolerance: i64,
) -> Result<CounterSemantics, EngineError> {
    let max = daily_values.iter().copied().max().unwrap_or(0);
    let sum = daily_values.iter().copied().fold(0i64, i64::saturating_add);
    let ambiguous = || EngineError::AmbiguousSemantics {
        counter: counter.to_string(),
        max,
        sum,
        lifetime,
    };

    if daily_values.is_empty() {
        return Err(ambiguous());
    }

    if daily_values.windows(2).any(|w| w[1] < w[0]) {
        return Ok(CounterSemantics::Incremental);
    }

    let near_max = max.abs_diff(lifetime) <= tolerance.unsigned_abs();
    let near_sum = sum.abs_diff(lifetime) <= tolerance.unsigned_abs();

    match (near_max, near_sum) {
        (true, false) => Ok(CounterSemantics::Cumulative),
        (false, true) => Ok(CounterSemantics::Incremental),
        _ => Err(ambiguous()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_decrease_means_incremental() {
        let result = infer_semantics("reactions_like", &[3, 1, 4], 999, 2);
        assert_eq!(result.unwrap(), CounterSemantics::Incremental);
    }

    #[test]
    fn running_total_matching_lifetime_is_cumulative() {
        let result = infer_semantics("reactions_total", &[10, 12, 20, 31], 32, 2);
        assert_eq!(result.unwrap(), CounterSemantics::Cumulative);
    }

    #[test]
    fn non_decreasing_values_summing_to_lifetime_are_incremental() {
        let result = infer_semantics("page_views", &[1, 2, 2, 5], 10, 2);
        assert_eq!(result.unwrap(), CounterSemantics::Incremental);
    }

    #[test]
    fn neither_match_is_ambiguous() {
        let err = infer_semantics("comments_total", &[1, 2, 3], 50, 2).unwrap_err();
        assert_eq!(
            err,
            EngineError::AmbiguousSemantics {
                counter: "comments_total".to_string(),
                max: 3,
                sum: 6,
                lifetime: 50,
            }
        );
    }

    #[test]
    fn both_match_is_ambiguous() {
        // A single non-zero day: max == sum == lifetime.
        let result = infer_semantics("reactions_like", &[0, 0, 7], 7, 2);
        assert!(matches!(result, Err(EngineError::AmbiguousSemantics { .. })));
    }

    #[test]
    fn empty_input_is_ambiguous() {
        let result = infer_semantics("page_views", &[], 0, 2);
        assert!(matches!(result, Err(EngineError::AmbiguousSemantics { .. })));
    }
}
