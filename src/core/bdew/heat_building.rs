//! Hourly building heat demand profiles based on the BDEW sigmoid method.

use crate::core::bdew::HeatProfileType;
use crate::core::calendar::{daily_weekday_classes, Holidays, TimeIndex};
use crate::core::reference_table::{
    HourFactorKey, HourFactorTable, SigmoidTable, WeekdayFactorTable,
};
use crate::core::resolver::{mean_to_coarser, resolve_series};
use crate::errors::{ConfigurationError, CoverageError, DomainError, ProfileError};
use chrono::{Datelike, Duration, Timelike};

/// The reference tables behind the heat model, loaded once per run.
#[derive(Clone, Debug)]
pub struct HeatReferenceTables {
    pub hour_factors: HourFactorTable,
    pub sigmoid: SigmoidTable,
    pub weekday_factors: WeekdayFactorTable,
}

/// Building parameters of one heat profile. Residential profiles (EFH, MFH)
/// carry a building class between 1 and 11; every other profile type is
/// defined for building class 0 only.
#[derive(Clone, Copy, Debug)]
pub struct HeatBuildingConfig {
    pub profile: HeatProfileType,
    pub building_class: u8,
    pub wind_class: u8,
    pub ww_incl: bool,
}

impl HeatBuildingConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.profile.is_residential() {
            if !(1..=11).contains(&self.building_class) {
                return Err(ConfigurationError::BuildingClassOutOfRange(
                    self.building_class,
                ));
            }
        } else if self.building_class != 0 {
            return Err(ConfigurationError::NonResidentialBuildingClass {
                profile: self.profile.to_string(),
                building_class: self.building_class,
            });
        }
        Ok(())
    }
}

/// Hourly heat demand generator for one building over one year.
#[derive(Clone, Debug)]
pub struct HeatBuilding {
    year: i32,
    index: TimeIndex,
    config: HeatBuildingConfig,
}

impl HeatBuilding {
    pub fn new(year: i32, config: HeatBuildingConfig) -> Result<Self, ProfileError> {
        config.validate()?;
        let index = TimeIndex::for_year(year, Duration::hours(1))?;
        Ok(Self {
            year,
            index,
            config,
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn index(&self) -> &TimeIndex {
        &self.index
    }

    pub fn config(&self) -> &HeatBuildingConfig {
        &self.config
    }

    /// The hourly profile scaled so that its finite entries sum to
    /// `annual_heat_demand`. `hourly_temperature` must carry one ambient
    /// temperature per step of the year.
    ///
    /// Residential hour-factor tables may have gaps; affected hours come back
    /// as NaN while the remaining hours still sum to the annual demand.
    /// Non-residential tables must be complete and a gap aborts with a
    /// coverage error.
    pub fn get_bdew_profile(
        &self,
        tables: &HeatReferenceTables,
        hourly_temperature: &[f64],
        holidays: Option<&Holidays>,
        annual_heat_demand: f64,
    ) -> Result<Vec<f64>, ProfileError> {
        if hourly_temperature.len() != self.index.len() {
            return Err(ProfileError::InvalidCalendar(format!(
                "temperature series has {} values for {} hourly steps",
                hourly_temperature.len(),
                self.index.len()
            )));
        }

        let daily_mean = mean_to_coarser(hourly_temperature, self.index.step(), Duration::days(1))?;
        let weighted = weighted_temperature(&daily_mean);
        let intervals = weighted
            .iter()
            .map(|t| temperature_interval(*t))
            .collect::<Result<Vec<usize>, DomainError>>()?;

        let dates = self.index.dates();
        let classes = daily_weekday_classes(&dates, holidays, true);

        let sigmoid = tables.sigmoid.parameters(
            self.config.building_class,
            self.config.profile,
            self.config.wind_class,
            self.config.ww_incl,
        )?;
        let h: Vec<f64> = weighted
            .iter()
            .map(|t| sigmoid.a / (1.0 + (sigmoid.b / (t - 40.0)).powf(sigmoid.c)) + sigmoid.d)
            .collect();

        let join = if self.config.profile.is_residential() {
            HourFactorTable::RESIDENTIAL_JOIN
        } else {
            HourFactorTable::NON_RESIDENTIAL_JOIN
        };
        let hour_weekday = |day: usize| {
            if self.config.profile.is_residential() {
                None
            } else {
                Some(classes[day])
            }
        };
        let f = resolve_series(&self.index, self.index.step(), join, |ts| {
            let day = ts.date().ordinal0() as usize;
            let key = HourFactorKey {
                building_class: self.config.building_class,
                profile: self.config.profile,
                weekday: hour_weekday(day),
                hour: ts.hour() as u8,
            };
            tables
                .hour_factors
                .hour_factors(key)
                .map(|row| row[intervals[day] - 1])
                .ok_or_else(|| {
                    CoverageError::new(
                        "hour_factors",
                        format!(
                            "({}, {}, weekday {:?}, hour {})",
                            key.building_class, key.profile, key.weekday, key.hour
                        ),
                    )
                })
        })?;
        let f: Vec<f64> = f.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();

        let mut profile = Vec::with_capacity(self.index.len());
        for (step, ts) in self.index.timestamps().iter().enumerate() {
            let day = ts.date().ordinal0() as usize;
            let sf = tables
                .weekday_factors
                .factor(self.config.profile, classes[day])?;
            profile.push(h[day] * f[step] * sf);
        }

        // The scalar 24 / sum(h * f) factor of the standard cancels in the
        // annual renormalization, which also has to skip table gaps.
        let finite_sum: f64 = profile.iter().copied().filter(|v| v.is_finite()).sum();
        if finite_sum > 0.0 {
            for value in &mut profile {
                *value = *value / finite_sum * annual_heat_demand;
            }
        }
        Ok(profile)
    }
}

/// The reference temperature of a day: a geometric weighting of the day's own
/// mean with the three preceding days (weights 1, 0.5, 0.25, 0.125). Days at
/// the start of the series reuse the earliest available mean, so the result
/// never depends on values after the day itself.
pub fn weighted_temperature(daily_mean: &[f64]) -> Vec<f64> {
    const WEIGHTS: [f64; 4] = [1.0, 0.5, 0.25, 0.125];
    let norm: f64 = WEIGHTS.iter().sum();
    (0..daily_mean.len())
        .map(|day| {
            WEIGHTS
                .iter()
                .enumerate()
                .map(|(lag, weight)| weight * daily_mean[day.saturating_sub(lag)])
                .sum::<f64>()
                / norm
        })
        .collect()
}

/// Map a reference temperature onto the 1-based temperature interval of the
/// hour-factor tables. The rounded-up temperature must lie within -20 to
/// 40 degrees Celsius; the lowest band spans -20 to -15, the following bands
/// are 5 degrees wide and everything from 26 upward shares the top band.
pub fn temperature_interval(weighted: f64) -> Result<usize, DomainError> {
    let rounded = weighted.ceil();
    if !(-20.0..=40.0).contains(&rounded) {
        return Err(DomainError::TemperatureOutOfRange(weighted));
    }
    let rounded = rounded as i32;
    let band = if rounded <= -15 {
        1
    } else {
        ((rounded + 14) / 5 + 2).min(10)
    };
    Ok(band as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::collections::HashMap;

    use crate::core::reference_table::SigmoidParameters;

    fn sigmoid_table() -> SigmoidTable {
        let mut parameters = HashMap::new();
        parameters.insert(
            (1, HeatProfileType::Efh, 0),
            SigmoidParameters {
                a: 3.0648,
                b: -37.1833,
                c: 5.6365,
                d: 0.1,
            },
        );
        parameters.insert(
            (0, HeatProfileType::Ghd, 0),
            SigmoidParameters {
                a: 3.5,
                b: -35.0,
                c: 6.0,
                d: 0.05,
            },
        );
        SigmoidTable::new(parameters)
    }

    /// Hour factors independent of the temperature interval, so a day's share
    /// of the year is driven by the sigmoid and weekday factor alone.
    fn hour_factor_table(residential_gap_at_hour: Option<u8>) -> HourFactorTable {
        let mut factors = HashMap::new();
        for hour in 0..24u8 {
            if residential_gap_at_hour != Some(hour) {
                factors.insert(
                    HourFactorKey {
                        building_class: 1,
                        profile: HeatProfileType::Efh,
                        weekday: None,
                        hour,
                    },
                    [(1.0 + hour as f64) / 300.0; 10],
                );
            }
            for weekday in 1..=7u8 {
                factors.insert(
                    HourFactorKey {
                        building_class: 0,
                        profile: HeatProfileType::Ghd,
                        weekday: Some(weekday),
                        hour,
                    },
                    [(2.0 + hour as f64) / 400.0; 10],
                );
            }
        }
        HourFactorTable::new(factors)
    }

    fn weekday_factor_table() -> WeekdayFactorTable {
        let mut factors = HashMap::new();
        for profile in [HeatProfileType::Efh, HeatProfileType::Ghd] {
            for weekday in 1..=7u8 {
                let factor = if weekday == 7 { 0.9 } else { 1.0 + 0.01 * weekday as f64 };
                factors.insert((profile, weekday), factor);
            }
        }
        WeekdayFactorTable::new(factors)
    }

    #[fixture]
    fn tables() -> HeatReferenceTables {
        HeatReferenceTables {
            hour_factors: hour_factor_table(None),
            sigmoid: sigmoid_table(),
            weekday_factors: weekday_factor_table(),
        }
    }

    fn efh_config() -> HeatBuildingConfig {
        HeatBuildingConfig {
            profile: HeatProfileType::Efh,
            building_class: 1,
            wind_class: 0,
            ww_incl: true,
        }
    }

    /// A mild synthetic year: cold in January, warm around July.
    fn seasonal_temperature(hours: usize) -> Vec<f64> {
        (0..hours)
            .map(|h| {
                let day = (h / 24) as f64;
                8.0 - 14.0 * (std::f64::consts::TAU * (day + 14.0) / 365.0).cos()
                    + 3.0 * ((h % 24) as f64 / 24.0 * std::f64::consts::TAU).sin()
            })
            .collect()
    }

    #[rstest]
    fn weighted_temperature_is_causal_and_clamped() {
        let means = vec![0.0, 0.0, 0.0, 8.0, 8.0];
        let weighted = weighted_temperature(&means);
        // Day 0 only sees itself.
        assert_relative_eq!(weighted[0], 0.0);
        // Day 3 weights its own 8.0 against three preceding zeros.
        assert_relative_eq!(weighted[3], 8.0 / 1.875, max_relative = 1e-12);
        // Day 4: (8 + 4) / 1.875
        assert_relative_eq!(weighted[4], 12.0 / 1.875, max_relative = 1e-12);
        // A later cold snap never leaks backwards.
        let with_snap = weighted_temperature(&[0.0, 0.0, 0.0, 8.0, -20.0]);
        assert_eq!(weighted[..4], with_snap[..4]);
    }

    #[rstest]
    #[case(-20.0, 1)]
    #[case(-15.0, 1)]
    #[case(-14.5, 2)]
    #[case(-0.3, 4)]
    #[case(3.2, 5)]
    #[case(25.0, 9)]
    #[case(26.0, 10)]
    #[case(39.5, 10)]
    fn temperature_intervals(#[case] weighted: f64, #[case] expected: usize) {
        assert_eq!(temperature_interval(weighted).unwrap(), expected);
    }

    #[rstest]
    #[case(-25.0)]
    #[case(40.5)]
    fn out_of_range_temperatures_are_rejected(#[case] weighted: f64) {
        assert!(matches!(
            temperature_interval(weighted),
            Err(DomainError::TemperatureOutOfRange(_))
        ));
    }

    #[rstest]
    fn invalid_building_classes_are_rejected() {
        let mut config = efh_config();
        config.building_class = 0;
        assert!(matches!(
            HeatBuilding::new(2010, config),
            Err(ProfileError::Configuration(
                ConfigurationError::BuildingClassOutOfRange(0)
            ))
        ));
        let config = HeatBuildingConfig {
            profile: HeatProfileType::Ghd,
            building_class: 2,
            wind_class: 0,
            ww_incl: true,
        };
        assert!(matches!(
            HeatBuilding::new(2010, config),
            Err(ProfileError::Configuration(
                ConfigurationError::NonResidentialBuildingClass { .. }
            ))
        ));
    }

    #[rstest]
    fn profile_conserves_annual_demand(tables: HeatReferenceTables) {
        let building = HeatBuilding::new(2010, efh_config()).unwrap();
        let temperature = seasonal_temperature(8760);
        let profile = building
            .get_bdew_profile(&tables, &temperature, None, 25_000.0)
            .unwrap();
        assert_eq!(profile.len(), 8760);
        assert_relative_eq!(profile.iter().sum::<f64>(), 25_000.0, max_relative = 1e-9);
    }

    #[rstest]
    fn colder_days_carry_more_demand(tables: HeatReferenceTables) {
        let building = HeatBuilding::new(2010, efh_config()).unwrap();
        let temperature = seasonal_temperature(8760);
        let profile = building
            .get_bdew_profile(&tables, &temperature, None, 25_000.0)
            .unwrap();
        // 2010-01-11 and 2010-07-12 are both Mondays.
        let cold = NaiveDate::from_ymd_opt(2010, 1, 11).unwrap().ordinal0() as usize;
        let warm = NaiveDate::from_ymd_opt(2010, 7, 12).unwrap().ordinal0() as usize;
        let day_sum = |day: usize| profile[day * 24..(day + 1) * 24].iter().sum::<f64>();
        assert!(day_sum(cold) > day_sum(warm));
    }

    #[rstest]
    fn marking_a_holiday_switches_to_the_sunday_factor(tables: HeatReferenceTables) {
        let building = HeatBuilding::new(2010, efh_config()).unwrap();
        let temperature = seasonal_temperature(8760);
        let plain = building
            .get_bdew_profile(&tables, &temperature, None, 25_000.0)
            .unwrap();
        let holidays: Holidays = [NaiveDate::from_ymd_opt(2010, 5, 24).unwrap()]
            .into_iter()
            .collect();
        let with_holiday = building
            .get_bdew_profile(&tables, &temperature, Some(&holidays), 25_000.0)
            .unwrap();
        let day = NaiveDate::from_ymd_opt(2010, 5, 24).unwrap().ordinal0() as usize;
        let day_sum =
            |profile: &[f64]| profile[day * 24..(day + 1) * 24].iter().sum::<f64>();
        // Whit Monday moves from the Monday factor (1.01) to Sunday (0.9).
        assert!(day_sum(&with_holiday) < day_sum(&plain));
    }

    #[rstest]
    fn residential_table_gaps_become_nan() {
        let tables = HeatReferenceTables {
            hour_factors: hour_factor_table(Some(3)),
            sigmoid: sigmoid_table(),
            weekday_factors: weekday_factor_table(),
        };
        let building = HeatBuilding::new(2010, efh_config()).unwrap();
        let temperature = seasonal_temperature(8760);
        let profile = building
            .get_bdew_profile(&tables, &temperature, None, 25_000.0)
            .unwrap();
        assert!(profile[3].is_nan());
        assert!(profile[2].is_finite());
        // The finite hours still carry the full annual demand.
        let finite_sum: f64 = profile.iter().copied().filter(|v| v.is_finite()).sum();
        assert_relative_eq!(finite_sum, 25_000.0, max_relative = 1e-9);
    }

    #[rstest]
    fn non_residential_table_gaps_abort(tables: HeatReferenceTables) {
        let mut hour_factors = HashMap::new();
        for hour in 0..24u8 {
            for weekday in 1..=6u8 {
                hour_factors.insert(
                    HourFactorKey {
                        building_class: 0,
                        profile: HeatProfileType::Ghd,
                        weekday: Some(weekday),
                        hour,
                    },
                    [0.04; 10],
                );
            }
        }
        let tables = HeatReferenceTables {
            hour_factors: HourFactorTable::new(hour_factors),
            ..tables
        };
        let config = HeatBuildingConfig {
            profile: HeatProfileType::Ghd,
            building_class: 0,
            wind_class: 0,
            ww_incl: true,
        };
        let building = HeatBuilding::new(2010, config).unwrap();
        let temperature = seasonal_temperature(8760);
        // Sundays (weekday 7) have no rows.
        let result = building.get_bdew_profile(&tables, &temperature, None, 25_000.0);
        assert!(matches!(result, Err(ProfileError::Coverage(_))));
    }

    #[rstest]
    fn excluding_warm_water_zeroes_the_summer_base_load(tables: HeatReferenceTables) {
        let mut config = efh_config();
        config.ww_incl = false;
        let building = HeatBuilding::new(2010, config).unwrap();
        let with_ww = HeatBuilding::new(2010, efh_config()).unwrap();
        let temperature = seasonal_temperature(8760);
        let space_only = building
            .get_bdew_profile(&tables, &temperature, None, 25_000.0)
            .unwrap();
        let total = with_ww
            .get_bdew_profile(&tables, &temperature, None, 25_000.0)
            .unwrap();
        // Without the warm water offset the shape shifts towards winter.
        let july = NaiveDate::from_ymd_opt(2010, 7, 12).unwrap().ordinal0() as usize;
        let day_sum =
            |profile: &[f64]| profile[july * 24..(july + 1) * 24].iter().sum::<f64>();
        assert!(day_sum(&space_only) < day_sum(&total));
    }
}
