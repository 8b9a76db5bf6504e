use crate::core::units::{days_in_year, steps_per_day};
use crate::errors::ProfileError;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use itertools::Itertools;
use std::collections::BTreeSet;

/// Weekday class for a holiday when holidays are kept as an independent day
/// class rather than folded into Sundays.
pub const HOLIDAY_CLASS: u8 = 0;
pub const SUNDAY_CLASS: u8 = 7;

/// Calendar dates marked as holidays. Callers holding a date-keyed mapping
/// (e.g. date -> holiday name) only need to pass the keys; values carry no
/// meaning for classification.
pub type Holidays = BTreeSet<NaiveDate>;

/// An ordered sequence of timestamps at a fixed step size. The base axis for
/// every resolved profile; immutable once constructed.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeIndex {
    timestamps: Vec<NaiveDateTime>,
    step: Duration,
}

impl TimeIndex {
    /// A full-year index starting at Jan 1st 00:00, e.g. 8760 * 4 steps for a
    /// 15-minute step in a non-leap year and 8784 * 4 in a leap year.
    pub fn for_year(year: i32, step: Duration) -> Result<Self, ProfileError> {
        let start = first_instant_of_year(year)?;
        let steps = days_in_year(year) as usize * steps_per_day(validate_step(step)?);
        Ok(Self::from_start(start, steps, step))
    }

    /// An index covering `[start, end)`. Resolution over a sub-range equals
    /// the slice of a full-range resolution, so partial indexes are valid
    /// inputs everywhere a full-year index is.
    pub fn for_range(
        start: NaiveDateTime,
        end: NaiveDateTime,
        step: Duration,
    ) -> Result<Self, ProfileError> {
        let step = validate_step(step)?;
        if end < start {
            return Err(ProfileError::InvalidCalendar(format!(
                "range end {end} precedes start {start}"
            )));
        }
        let steps = ((end - start).num_seconds() / step.num_seconds()) as usize;
        Ok(Self::from_start(start, steps, step))
    }

    fn from_start(start: NaiveDateTime, steps: usize, step: Duration) -> Self {
        let timestamps = (0..steps).map(|i| start + step * i as i32).collect();
        Self { timestamps, step }
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// The distinct calendar days covered by the index, in order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.timestamps.iter().map(|ts| ts.date()).dedup().collect()
    }
}

fn validate_step(step: Duration) -> Result<Duration, ProfileError> {
    let seconds = step.num_seconds();
    if seconds <= 0 {
        return Err(ProfileError::InvalidCalendar(format!(
            "step size must be positive, got {step}"
        )));
    }
    if Duration::days(1).num_seconds() % seconds != 0 {
        return Err(ProfileError::InvalidCalendar(format!(
            "step size {step} does not divide a day evenly"
        )));
    }
    Ok(step)
}

fn first_instant_of_year(year: i32) -> Result<NaiveDateTime, ProfileError> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| ProfileError::InvalidCalendar(format!("year {year} is out of range")))
}

/// The weekday class of a single timestamp: 1-6 for Monday to Saturday, 7 for
/// Sunday, 0 for a holiday when `holiday_is_sunday` is false. Holiday status
/// always overrides the plain weekday; a holiday falling on a Sunday stays in
/// class 7 when holidays fold into Sundays.
pub fn weekday_class(
    ts: NaiveDateTime,
    holidays: Option<&Holidays>,
    holiday_is_sunday: bool,
) -> u8 {
    let mut class = ts.weekday().number_from_monday() as u8;
    if holidays.is_some_and(|h| h.contains(&ts.date())) {
        class = HOLIDAY_CLASS;
    }
    if holiday_is_sunday && class == HOLIDAY_CLASS {
        class = SUNDAY_CLASS;
    }
    class
}

/// Assign one weekday class per timestamp.
pub fn weekday_classes(
    timestamps: &[NaiveDateTime],
    holidays: Option<&Holidays>,
    holiday_is_sunday: bool,
) -> Vec<u8> {
    timestamps
        .iter()
        .map(|ts| weekday_class(*ts, holidays, holiday_is_sunday))
        .collect()
}

/// Per-day variant of [`weekday_classes`] used by the day-type resolver.
pub fn daily_weekday_classes(
    dates: &[NaiveDate],
    holidays: Option<&Holidays>,
    holiday_is_sunday: bool,
) -> Vec<u8> {
    let midnights: Vec<NaiveDateTime> = dates
        .iter()
        .map(|d| d.and_hms_opt(0, 0, 0).expect("midnight is always valid"))
        .collect();
    weekday_classes(&midnights, holidays, holiday_is_sunday)
}
