//! Step load profiles for industrial consumers.
//!
//! Industry has no published standard profile, so the usual approximation is
//! a step function over two day periods and three weekday groups.

use crate::core::calendar::{weekday_class, Holidays, TimeIndex};
use crate::core::scaling::normalize_to_annual;
use crate::core::units::intervals_per_hour;
use crate::errors::{ConfigurationError, ProfileError};
use chrono::{Duration, NaiveTime};
use indexmap::IndexMap;

/// Day and night factor of one weekday group.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DayNightFactors {
    pub day: f64,
    pub night: f64,
}

/// The factors of a simple step profile, one day/night pair per weekday
/// group. The holiday group only applies when holidays keep their own class
/// instead of folding into Sundays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepFactors {
    pub week: DayNightFactors,
    pub weekend: DayNightFactors,
    pub holiday: DayNightFactors,
}

impl Default for StepFactors {
    fn default() -> Self {
        Self {
            week: DayNightFactors {
                day: 0.8,
                night: 0.6,
            },
            weekend: DayNightFactors {
                day: 0.9,
                night: 0.7,
            },
            holiday: DayNightFactors {
                day: 0.9,
                night: 0.7,
            },
        }
    }
}

impl StepFactors {
    /// Build factors from a nested `group -> period -> factor` mapping, the
    /// layout configuration files tend to use. All six entries are required.
    pub fn from_map(
        factors: &IndexMap<String, IndexMap<String, f64>>,
    ) -> Result<Self, ConfigurationError> {
        let group = |name: &str| {
            let field = |key: &str| {
                factors
                    .get(name)
                    .and_then(|g| g.get(key))
                    .copied()
                    .ok_or_else(|| ConfigurationError::MissingProfileFactor {
                        group: name.to_string(),
                        field: key.to_string(),
                    })
            };
            Ok::<_, ConfigurationError>(DayNightFactors {
                day: field("day")?,
                night: field("night")?,
            })
        };
        Ok(Self {
            week: group("week")?,
            weekend: group("weekend")?,
            holiday: group("holiday")?,
        })
    }
}

/// Options of [`IndustrialLoadProfile::simple_profile`]. The day period is
/// the closed interval `[day_start, day_end]`; weekday classes follow the
/// 1 to 7 convention with 0 for holidays.
#[derive(Clone, Debug)]
pub struct SimpleProfileConfig {
    pub day_start: NaiveTime,
    pub day_end: NaiveTime,
    pub week: Vec<u8>,
    pub weekend: Vec<u8>,
    pub holiday: Vec<u8>,
    pub factors: StepFactors,
}

impl Default for SimpleProfileConfig {
    fn default() -> Self {
        Self {
            day_start: NaiveTime::from_hms_opt(7, 0, 0).expect("valid time"),
            day_end: NaiveTime::from_hms_opt(23, 30, 0).expect("valid time"),
            week: vec![1, 2, 3, 4, 5],
            weekend: vec![6, 7],
            holiday: vec![0],
            factors: StepFactors::default(),
        }
    }
}

/// Step profile generator over one year.
#[derive(Clone, Debug)]
pub struct IndustrialLoadProfile {
    index: TimeIndex,
    holidays: Option<Holidays>,
    holiday_is_sunday: bool,
}

impl IndustrialLoadProfile {
    pub fn new(
        year: i32,
        step: Duration,
        holidays: Option<Holidays>,
        holiday_is_sunday: bool,
    ) -> Result<Self, ProfileError> {
        Ok(Self {
            index: TimeIndex::for_year(year, step)?,
            holidays,
            holiday_is_sunday,
        })
    }

    pub fn index(&self) -> &TimeIndex {
        &self.index
    }

    /// The step profile in power units, scaled so that its energy integral
    /// over the year equals `annual_demand`. A weekday class assigned to no
    /// group is an error, never a silent zero.
    pub fn simple_profile(
        &self,
        annual_demand: f64,
        config: &SimpleProfileConfig,
    ) -> Result<Vec<f64>, ProfileError> {
        let raw = self
            .index
            .timestamps()
            .iter()
            .map(|ts| {
                let class = weekday_class(*ts, self.holidays.as_ref(), self.holiday_is_sunday);
                let time = ts.time();
                let day = config.day_start <= time && time <= config.day_end;
                let group = if config.week.contains(&class) {
                    config.factors.week
                } else if config.weekend.contains(&class) {
                    config.factors.weekend
                } else if config.holiday.contains(&class) {
                    config.factors.holiday
                } else {
                    return Err(ProfileError::InvalidCalendar(format!(
                        "weekday class {class} on {} belongs to no weekday group",
                        ts.date()
                    )));
                };
                Ok(if day { group.day } else { group.night })
            })
            .collect::<Result<Vec<f64>, ProfileError>>()?;
        let conversion = intervals_per_hour(self.index.step());
        Ok(normalize_to_annual(&raw, annual_demand)
            .into_iter()
            .map(|v| v * conversion)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Datelike, NaiveDate};
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn profile() -> Vec<f64> {
        let ilp = IndustrialLoadProfile::new(2010, Duration::minutes(15), None, false).unwrap();
        ilp.simple_profile(50_000.0, &SimpleProfileConfig::default())
            .unwrap()
    }

    fn step_index(date: NaiveDate, hour: u32, minute: u32) -> usize {
        date.ordinal0() as usize * 96 + (hour * 4 + minute / 15) as usize
    }

    #[rstest]
    fn profile_conserves_annual_demand(profile: Vec<f64>) {
        assert_eq!(profile.len(), 8760 * 4);
        // Power units at 15-minute steps.
        assert_relative_eq!(
            profile.iter().sum::<f64>() / 4.0,
            50_000.0,
            max_relative = 1e-9
        );
    }

    #[rstest]
    fn day_and_night_steps_follow_the_factors(profile: Vec<f64>) {
        // 2010-06-07 is a Monday.
        let monday = NaiveDate::from_ymd_opt(2010, 6, 7).unwrap();
        let night = profile[step_index(monday, 3, 0)];
        let day = profile[step_index(monday, 12, 0)];
        assert_relative_eq!(day / night, 0.8 / 0.6, max_relative = 1e-12);
        // The day period includes its 23:30 end point.
        assert_relative_eq!(profile[step_index(monday, 23, 30)], day, max_relative = 1e-12);
        assert_relative_eq!(
            profile[step_index(monday, 23, 45)],
            night,
            max_relative = 1e-12
        );
    }

    #[rstest]
    fn weekends_use_their_own_factors(profile: Vec<f64>) {
        let monday = NaiveDate::from_ymd_opt(2010, 6, 7).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2010, 6, 6).unwrap();
        let ratio = profile[step_index(sunday, 12, 0)] / profile[step_index(monday, 12, 0)];
        assert_relative_eq!(ratio, 0.9 / 0.8, max_relative = 1e-12);
    }

    #[rstest]
    fn holidays_get_the_holiday_factors() {
        // Whit Monday 2010.
        let holidays: Holidays = [NaiveDate::from_ymd_opt(2010, 5, 24).unwrap()]
            .into_iter()
            .collect();
        let ilp =
            IndustrialLoadProfile::new(2010, Duration::minutes(15), Some(holidays), false).unwrap();
        let mut config = SimpleProfileConfig::default();
        config.factors.holiday = DayNightFactors {
            day: 0.3,
            night: 0.2,
        };
        let profile = ilp.simple_profile(50_000.0, &config).unwrap();
        let holiday = NaiveDate::from_ymd_opt(2010, 5, 24).unwrap();
        let monday = NaiveDate::from_ymd_opt(2010, 6, 7).unwrap();
        let ratio = profile[step_index(holiday, 12, 0)] / profile[step_index(monday, 12, 0)];
        assert_relative_eq!(ratio, 0.3 / 0.8, max_relative = 1e-12);
    }

    #[rstest]
    fn folded_holidays_use_the_weekend_factors() {
        let holidays: Holidays = [NaiveDate::from_ymd_opt(2010, 5, 24).unwrap()]
            .into_iter()
            .collect();
        let ilp =
            IndustrialLoadProfile::new(2010, Duration::minutes(15), Some(holidays), true).unwrap();
        let profile = ilp
            .simple_profile(50_000.0, &SimpleProfileConfig::default())
            .unwrap();
        let holiday = NaiveDate::from_ymd_opt(2010, 5, 24).unwrap();
        let monday = NaiveDate::from_ymd_opt(2010, 6, 7).unwrap();
        let ratio = profile[step_index(holiday, 12, 0)] / profile[step_index(monday, 12, 0)];
        assert_relative_eq!(ratio, 0.9 / 0.8, max_relative = 1e-12);
    }

    #[rstest]
    fn factors_parse_from_nested_maps() {
        let entry = |day: f64, night: f64| {
            IndexMap::from([("day".to_string(), day), ("night".to_string(), night)])
        };
        let map: IndexMap<String, IndexMap<String, f64>> = IndexMap::from([
            ("week".to_string(), entry(0.7, 0.5)),
            ("weekend".to_string(), entry(0.6, 0.4)),
            ("holiday".to_string(), entry(0.5, 0.3)),
        ]);
        let factors = StepFactors::from_map(&map).unwrap();
        assert_eq!(factors.week.day, 0.7);
        assert_eq!(factors.holiday.night, 0.3);
    }

    #[rstest]
    fn missing_factor_entries_are_rejected() {
        let map: IndexMap<String, IndexMap<String, f64>> = IndexMap::from([(
            "week".to_string(),
            IndexMap::from([("day".to_string(), 0.7)]),
        )]);
        let err = StepFactors::from_map(&map).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::MissingProfileFactor { group, field }
                if group == "week" && field == "night"
        ));
    }

    #[rstest]
    fn unassigned_weekday_classes_are_rejected() {
        let ilp = IndustrialLoadProfile::new(2010, Duration::hours(1), None, false).unwrap();
        let config = SimpleProfileConfig {
            week: vec![1, 2, 3, 4],
            // Fridays (class 5) belong to no group.
            ..SimpleProfileConfig::default()
        };
        assert!(matches!(
            ilp.simple_profile(50_000.0, &config),
            Err(ProfileError::InvalidCalendar(_))
        ));
    }
}
