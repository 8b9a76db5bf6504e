//! Per-house load curves assembled from the VDI 4655 typical-day tables.

use crate::core::calendar::{daily_weekday_classes, Holidays, TimeIndex};
use crate::core::day_types::{
    resolve_day_types, resolve_seasons, DayType, SeasonAssignment, SeasonMode, SeasonRanges,
};
use crate::core::reference_table::{EnergyFactorTable, TypicalDayProfileTable};
use crate::core::resolver::{hold_to_finer, mean_to_coarser, sum_to_coarser};
use crate::core::scaling::normalize_to_annual;
use crate::core::units::{DAYS_PER_YEAR, MINUTES_PER_DAY};
use crate::core::vdi::{EnergyKind, HouseType};
use crate::errors::{ConfigurationError, ProfileError};
use anyhow::Context;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use tracing::warn;

/// The VDI 4655 reference tables, loaded once per run.
#[derive(Clone, Debug)]
pub struct VdiReferenceTables {
    pub typical_days: TypicalDayProfileTable,
    pub energy_factors: EnergyFactorTable,
}

/// Per-house thresholds for the temperature-based season assignment: daily
/// means below `winter` are winter days, above `summer` summer days.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct TemperatureLimits {
    pub winter: f64,
    pub summer: f64,
}

impl Default for TemperatureLimits {
    fn default() -> Self {
        Self {
            winter: 5.0,
            summer: 15.0,
        }
    }
}

impl TemperatureLimits {
    pub fn season_mode(&self) -> Result<SeasonMode, ConfigurationError> {
        SeasonMode::temperature(self.winter, self.summer)
    }
}

/// One building in a region. The per-person energy factors scale with the
/// occupant count for single-family houses and with the number of flats for
/// multi-family houses.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct House {
    pub name: String,
    pub house_type: HouseType,
    pub try_region: u8,
    pub occupants: f64,
    #[serde(default = "default_flats")]
    pub flats: f64,
    #[serde(default)]
    pub annual_heat_demand: f64,
    #[serde(default)]
    pub annual_electricity_demand: f64,
    #[serde(default)]
    pub annual_hot_water_demand: f64,
    #[serde(default)]
    pub temperature_limits: TemperatureLimits,
}

fn default_flats() -> f64 {
    1.0
}

impl House {
    fn person_term(&self) -> f64 {
        match self.house_type {
            HouseType::Efh => self.occupants,
            HouseType::Mfh => self.flats,
        }
    }

    /// The fraction of the annual demand falling on one day, 1/365 plus the
    /// occupancy-scaled variation factor. The standard allows the per-person
    /// term to push the share below zero on paper; such days fall back to the
    /// uniform share.
    fn daily_share(&self, kind: EnergyKind, factor: f64) -> f64 {
        let base = 1.0 / f64::from(DAYS_PER_YEAR);
        let share = base + self.person_term() * factor;
        if share < 0.0 {
            warn!(
                house = %self.name,
                kind = %kind,
                "negative daily energy share, dropping the per-person term"
            );
            base
        } else {
            share
        }
    }
}

/// Read house definitions from a JSON array.
pub fn parse_houses(file: impl Read) -> anyhow::Result<Vec<House>> {
    serde_json::from_reader(file).context("house definitions")
}

/// The three load curves of one house at the region's step size, in energy
/// per interval.
#[derive(Clone, Debug)]
pub struct HouseLoadCurves {
    pub name: String,
    pub electricity: Vec<f64>,
    pub heat: Vec<f64>,
    pub hot_water: Vec<f64>,
}

impl HouseLoadCurves {
    pub fn curve(&self, kind: EnergyKind) -> &[f64] {
        match kind {
            EnergyKind::Electricity => &self.electricity,
            EnergyKind::Heat => &self.heat,
            EnergyKind::HotWater => &self.hot_water,
        }
    }
}

/// Region-wide season strategy: one set of fixed date ranges shared by every
/// house, or each house's own temperature thresholds.
#[derive(Clone, Debug, Default)]
pub enum RegionSeasons {
    Fixed(SeasonRanges),
    #[default]
    PerHouseTemperature,
}

impl RegionSeasons {
    /// Resolve a configured strategy name. `"fix"`/`"fixed"` uses the given
    /// date ranges, falling back to the BDEW defaults; `"temperature"` uses
    /// the temperature limits of each house.
    pub fn from_config(
        name: &str,
        ranges: Option<SeasonRanges>,
    ) -> Result<Self, ConfigurationError> {
        match SeasonAssignment::parse(name)? {
            SeasonAssignment::Fixed => Ok(RegionSeasons::Fixed(
                ranges.unwrap_or_else(SeasonRanges::bdew_default),
            )),
            SeasonAssignment::Temperature => Ok(RegionSeasons::PerHouseTemperature),
        }
    }
}

/// A group of houses sharing one calendar, holiday set and weather record.
#[derive(Clone, Debug)]
pub struct Region {
    year: i32,
    index: TimeIndex,
    holidays: Option<Holidays>,
    seasons: RegionSeasons,
    houses: Vec<House>,
}

impl Region {
    pub fn new(
        year: i32,
        step: Duration,
        holidays: Option<Holidays>,
    ) -> Result<Self, ProfileError> {
        Ok(Self {
            year,
            index: TimeIndex::for_year(year, step)?,
            holidays,
            seasons: RegionSeasons::default(),
            houses: Vec::new(),
        })
    }

    /// Switch the season strategy away from the per-house temperature
    /// default.
    pub fn set_seasons(&mut self, seasons: RegionSeasons) {
        self.seasons = seasons;
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn index(&self) -> &TimeIndex {
        &self.index
    }

    pub fn houses(&self) -> &[House] {
        &self.houses
    }

    /// Register houses with the region. Houses referencing a TRY region the
    /// energy factor table does not cover are skipped with a warning instead
    /// of failing the whole run.
    pub fn add_houses(&mut self, houses: Vec<House>, energy_factors: &EnergyFactorTable) {
        for house in houses {
            if energy_factors.contains_region(house.try_region) {
                self.houses.push(house);
            } else {
                warn!(
                    house = %house.name,
                    try_region = house.try_region,
                    "unknown TRY region, skipping house"
                );
            }
        }
    }

    /// Resolve the three load curves of every registered house. `temperature`
    /// and `cloud_cover` must carry one value per step of the region's
    /// calendar; both are averaged to daily means for the day-type
    /// classification.
    pub fn get_load_curve_houses(
        &self,
        tables: &VdiReferenceTables,
        temperature: &[f64],
        cloud_cover: &[f64],
    ) -> Result<Vec<HouseLoadCurves>, ProfileError> {
        for (series, name) in [(temperature, "temperature"), (cloud_cover, "cloud cover")] {
            if series.len() != self.index.len() {
                return Err(ProfileError::InvalidCalendar(format!(
                    "{name} series has {} values for {} steps",
                    series.len(),
                    self.index.len()
                )));
            }
        }
        let step = self.index.step();
        let daily_temperature = mean_to_coarser(temperature, step, Duration::days(1))?;
        let daily_cloud_cover = mean_to_coarser(cloud_cover, step, Duration::days(1))?;
        let dates = self.index.dates();
        let classes = daily_weekday_classes(&dates, self.holidays.as_ref(), true);

        // Fixed date ranges give one classification for the whole region. In
        // temperature mode the classification only depends on the limits, so
        // houses sharing limits share one classification.
        let shared_day_types = match &self.seasons {
            RegionSeasons::Fixed(ranges) => {
                let mode = SeasonMode::Fixed(ranges.clone());
                let seasons = resolve_seasons(&dates, &mode, None)?;
                Some(resolve_day_types(&seasons, &classes, Some(&daily_cloud_cover))?)
            }
            RegionSeasons::PerHouseTemperature => None,
        };
        let mut day_type_cache: HashMap<(u64, u64), Vec<DayType>> = HashMap::new();
        let mut curves = Vec::with_capacity(self.houses.len());
        for house in &self.houses {
            let day_types = match &shared_day_types {
                Some(day_types) => day_types,
                None => {
                    let limits = house.temperature_limits;
                    let key = (limits.winter.to_bits(), limits.summer.to_bits());
                    if !day_type_cache.contains_key(&key) {
                        let mode = limits.season_mode()?;
                        let seasons = resolve_seasons(&dates, &mode, Some(&daily_temperature))?;
                        let day_types =
                            resolve_day_types(&seasons, &classes, Some(&daily_cloud_cover))?;
                        day_type_cache.insert(key, day_types);
                    }
                    &day_type_cache[&key]
                }
            };
            curves.push(self.house_load_curves(tables, house, day_types)?);
        }
        Ok(curves)
    }

    fn house_load_curves(
        &self,
        tables: &VdiReferenceTables,
        house: &House,
        day_types: &[DayType],
    ) -> Result<HouseLoadCurves, ProfileError> {
        let native_minutes = tables.typical_days.native_step_minutes(house.house_type);
        let mut electricity = Vec::new();
        let mut heat = Vec::new();
        let mut hot_water = Vec::new();
        for day_type in day_types {
            let energy = tables
                .energy_factors
                .factors(house.try_region, house.house_type, *day_type)?;
            let daily_heat = house.annual_heat_demand * energy.heat;
            let daily_electricity = house.annual_electricity_demand
                * house.daily_share(EnergyKind::Electricity, energy.electricity);
            let daily_hot_water = house.annual_hot_water_demand
                * house.daily_share(EnergyKind::HotWater, energy.hot_water);
            for minute in (0..MINUTES_PER_DAY).step_by(native_minutes as usize) {
                let shape = tables
                    .typical_days
                    .factors(house.house_type, *day_type, minute)?;
                electricity.push(daily_electricity * shape.electricity);
                heat.push(daily_heat * shape.heat);
                hot_water.push(daily_hot_water * shape.hot_water);
            }
        }

        let native = Duration::minutes(i64::from(native_minutes));
        Ok(HouseLoadCurves {
            name: house.name.clone(),
            electricity: normalize_to_annual(
                &adapt_energy(electricity, native, self.index.step())?,
                house.annual_electricity_demand,
            ),
            heat: normalize_to_annual(
                &adapt_energy(heat, native, self.index.step())?,
                house.annual_heat_demand,
            ),
            hot_water: normalize_to_annual(
                &adapt_energy(hot_water, native, self.index.step())?,
                house.annual_hot_water_demand,
            ),
        })
    }
}

/// Adapt an energy-per-interval series between step sizes: finer steps split
/// each interval's energy evenly, coarser steps sum their intervals.
fn adapt_energy(
    values: Vec<f64>,
    native: Duration,
    target: Duration,
) -> Result<Vec<f64>, ProfileError> {
    if target == native {
        Ok(values)
    } else if target < native {
        let ratio = (native.num_seconds() / target.num_seconds()) as f64;
        Ok(hold_to_finer(&values, native, target)?
            .into_iter()
            .map(|v| v / ratio)
            .collect())
    } else {
        sum_to_coarser(&values, native, target)
    }
}
