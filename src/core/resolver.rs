//! The profile resolver joins a calendar against a reference table.
//!
//! Resolution is a pure function of each timestamp: the timestamp is floored
//! to the table's native grid, the table is consulted with the resulting key,
//! and the join discipline decides what a missing row means. Because no state
//! flows between timestamps, resolving a sub-range of the calendar yields
//! exactly the slice a full-range resolution would produce at those
//! positions.

use crate::core::calendar::TimeIndex;
use crate::errors::{CoverageError, ProfileError};
use chrono::{Duration, NaiveDateTime, Timelike};

use super::reference_table::JoinMode;

/// Floor a timestamp onto the native step grid of a reference table. The
/// standards define each factor as constant over its native interval, so the
/// correct adaptation to finer output steps is "hold", never interpolation.
pub fn align_to_native(ts: NaiveDateTime, native_step: Duration) -> NaiveDateTime {
    let seconds_into_day = ts.num_seconds_from_midnight() as i64;
    let native = native_step.num_seconds();
    let aligned = seconds_into_day - seconds_into_day % native;
    ts.date()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        + Duration::seconds(aligned)
}

/// Resolve one shape value per output timestep by looking the aligned
/// timestamp up in a reference table.
///
/// Under [`JoinMode::Inner`] a missing row aborts resolution with the
/// coverage error returned by the lookup; under [`JoinMode::Outer`] it
/// becomes a `None` in the output for the caller to inspect.
pub fn resolve_series<F>(
    index: &TimeIndex,
    native_step: Duration,
    join: JoinMode,
    mut lookup: F,
) -> Result<Vec<Option<f64>>, ProfileError>
where
    F: FnMut(NaiveDateTime) -> Result<f64, CoverageError>,
{
    index
        .timestamps()
        .iter()
        .map(|ts| match lookup(align_to_native(*ts, native_step)) {
            Ok(value) => Ok(Some(value)),
            Err(missing) => match join {
                JoinMode::Inner => Err(ProfileError::Coverage(missing)),
                JoinMode::Outer => Ok(None),
            },
        })
        .collect()
}

/// Inner-join resolution for tables whose coverage is guaranteed complete:
/// the first missing row aborts with a coverage error, so a successful result
/// doubles as a completeness assertion over the resolved range.
pub fn resolve_series_complete<F>(
    index: &TimeIndex,
    native_step: Duration,
    mut lookup: F,
) -> Result<Vec<f64>, ProfileError>
where
    F: FnMut(NaiveDateTime) -> Result<f64, CoverageError>,
{
    index
        .timestamps()
        .iter()
        .map(|ts| lookup(align_to_native(*ts, native_step)).map_err(ProfileError::Coverage))
        .collect()
}

/// Aggregate native-resolution values onto a coarser step by averaging.
/// Averaging (not summing) keeps the energy-to-power conversion factor
/// resolution independent.
pub fn mean_to_coarser(
    values: &[f64],
    native_step: Duration,
    target_step: Duration,
) -> Result<Vec<f64>, ProfileError> {
    let ratio = step_ratio(native_step, target_step)?;
    Ok(values
        .chunks(ratio)
        .map(|chunk| chunk.iter().sum::<f64>() / chunk.len() as f64)
        .collect())
}

/// Aggregate native-resolution values onto a coarser step by summation, for
/// series that carry energy per interval rather than a dimensionless shape.
pub fn sum_to_coarser(
    values: &[f64],
    native_step: Duration,
    target_step: Duration,
) -> Result<Vec<f64>, ProfileError> {
    let ratio = step_ratio(native_step, target_step)?;
    Ok(values
        .chunks(ratio)
        .map(|chunk| chunk.iter().sum::<f64>())
        .collect())
}

/// Repeat each native-interval value over every finer output step.
pub fn hold_to_finer(
    values: &[f64],
    native_step: Duration,
    target_step: Duration,
) -> Result<Vec<f64>, ProfileError> {
    let ratio = step_ratio(target_step, native_step)?;
    Ok(values
        .iter()
        .flat_map(|v| std::iter::repeat(*v).take(ratio))
        .collect())
}

fn step_ratio(finer: Duration, coarser: Duration) -> Result<usize, ProfileError> {
    let finer_s = finer.num_seconds();
    let coarser_s = coarser.num_seconds();
    if finer_s <= 0 || coarser_s <= 0 || coarser_s % finer_s != 0 {
        return Err(ProfileError::InvalidCalendar(format!(
            "target step {coarser} is not a multiple of the native step {finer}"
        )));
    }
    Ok((coarser_s / finer_s) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::collections::HashMap;

    fn ts(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2010, 6, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[fixture]
    fn hourly_table() -> HashMap<NaiveDateTime, f64> {
        (0..24).map(|h| (ts(h, 0), h as f64)).collect()
    }

    #[rstest]
    fn alignment_floors_to_the_native_grid() {
        assert_eq!(align_to_native(ts(13, 44), Duration::minutes(15)), ts(13, 30));
        assert_eq!(align_to_native(ts(13, 44), Duration::hours(1)), ts(13, 0));
        assert_eq!(align_to_native(ts(13, 0), Duration::hours(1)), ts(13, 0));
    }

    #[rstest]
    fn finer_output_steps_hold_the_native_value(hourly_table: HashMap<NaiveDateTime, f64>) {
        let index = TimeIndex::for_range(ts(6, 0), ts(8, 0), Duration::minutes(15)).unwrap();
        let resolved = resolve_series(&index, Duration::hours(1), JoinMode::Inner, |key| {
            hourly_table
                .get(&key)
                .copied()
                .ok_or_else(|| CoverageError::new("test", key.to_string()))
        })
        .unwrap();
        let values: Vec<f64> = resolved.into_iter().map(|v| v.unwrap()).collect();
        assert_eq!(values, vec![6.0, 6.0, 6.0, 6.0, 7.0, 7.0, 7.0, 7.0]);
    }

    #[rstest]
    fn inner_join_misses_abort(hourly_table: HashMap<NaiveDateTime, f64>) {
        let index = TimeIndex::for_range(
            ts(0, 0),
            NaiveDate::from_ymd_opt(2010, 6, 2)
                .unwrap()
                .and_hms_opt(1, 0, 0)
                .unwrap(),
            Duration::hours(1),
        )
        .unwrap();
        // The table only covers June 1st, so June 2nd 00:00 has no row.
        let result = resolve_series(&index, Duration::hours(1), JoinMode::Inner, |key| {
            hourly_table
                .get(&key)
                .copied()
                .ok_or_else(|| CoverageError::new("test", key.to_string()))
        });
        assert!(matches!(result, Err(ProfileError::Coverage(_))));
    }

    #[rstest]
    fn outer_join_misses_propagate(hourly_table: HashMap<NaiveDateTime, f64>) {
        let index = TimeIndex::for_range(
            ts(23, 0),
            NaiveDate::from_ymd_opt(2010, 6, 2)
                .unwrap()
                .and_hms_opt(1, 0, 0)
                .unwrap(),
            Duration::hours(1),
        )
        .unwrap();
        let resolved = resolve_series(&index, Duration::hours(1), JoinMode::Outer, |key| {
            hourly_table
                .get(&key)
                .copied()
                .ok_or_else(|| CoverageError::new("test", key.to_string()))
        })
        .unwrap();
        assert_eq!(resolved, vec![Some(23.0), None]);
    }

    #[rstest]
    fn sub_range_resolution_equals_the_full_range_slice(
        hourly_table: HashMap<NaiveDateTime, f64>,
    ) {
        let full = TimeIndex::for_range(ts(0, 0), ts(23, 0), Duration::minutes(15)).unwrap();
        let sub = TimeIndex::for_range(ts(5, 30), ts(9, 45), Duration::minutes(15)).unwrap();
        let lookup = |table: &HashMap<NaiveDateTime, f64>, key: NaiveDateTime| {
            table
                .get(&key)
                .copied()
                .ok_or_else(|| CoverageError::new("test", key.to_string()))
        };
        let full_values = resolve_series(&full, Duration::hours(1), JoinMode::Inner, |key| {
            lookup(&hourly_table, key)
        })
        .unwrap();
        let sub_values = resolve_series(&sub, Duration::hours(1), JoinMode::Inner, |key| {
            lookup(&hourly_table, key)
        })
        .unwrap();
        let offset = (5 * 4 + 2) as usize;
        assert_eq!(sub_values[..], full_values[offset..offset + sub_values.len()]);
    }

    #[rstest]
    fn mean_aggregation_preserves_the_scaled_total() {
        let values: Vec<f64> = (0..96).map(|i| i as f64).collect();
        let coarse =
            mean_to_coarser(&values, Duration::minutes(15), Duration::hours(1)).unwrap();
        assert_eq!(coarse.len(), 24);
        let fine_sum: f64 = values.iter().sum();
        let coarse_sum: f64 = coarse.iter().sum();
        assert_eq!(coarse_sum * 4.0, fine_sum);
    }

    #[rstest]
    fn hold_and_mean_round_trip() {
        let values = vec![1.0, 2.0, 3.0];
        let fine = hold_to_finer(&values, Duration::hours(1), Duration::minutes(15)).unwrap();
        assert_eq!(fine.len(), 12);
        let back = mean_to_coarser(&fine, Duration::minutes(15), Duration::hours(1)).unwrap();
        assert_eq!(back, values);
    }

    #[rstest]
    fn non_divisible_steps_are_rejected() {
        assert!(mean_to_coarser(&[1.0], Duration::minutes(25), Duration::hours(1)).is_err());
    }
}
