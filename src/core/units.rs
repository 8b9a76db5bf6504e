use chrono::Duration;

pub const MINUTES_PER_HOUR: u32 = 60;
pub const HOURS_PER_DAY: u32 = 24;
pub const MINUTES_PER_DAY: u32 = MINUTES_PER_HOUR * HOURS_PER_DAY;
pub const DAYS_PER_YEAR: u32 = 365;
pub const QUARTER_HOURS_PER_HOUR: u32 = 4;

/// Conversion factor between energy per interval and average power over the
/// interval, e.g. 4.0 for 15-minute steps. Must match the actual step size of
/// the series it is applied to; this is a caller responsibility.
pub fn intervals_per_hour(step: Duration) -> f64 {
    Duration::hours(1).num_seconds() as f64 / step.num_seconds() as f64
}

pub fn steps_per_day(step: Duration) -> usize {
    (Duration::days(1).num_seconds() / step.num_seconds()) as usize
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn hours_in_year(year: i32) -> u32 {
    if is_leap_year(year) {
        8784
    } else {
        8760
    }
}

pub fn days_in_year(year: i32) -> u32 {
    hours_in_year(year) / HOURS_PER_DAY
}
