//! In-memory reference profile tables.
//!
//! Each table is loaded once (typically from CSV through a provider
//! constructor) and treated as read-only for the lifetime of a run. Every
//! table names its join discipline: [`JoinMode::Inner`] tables assert
//! complete coverage for every key the resolvers can produce, while
//! [`JoinMode::Outer`] tables let missing rows propagate as missing values
//! for the caller to inspect.

use crate::core::bdew::HeatProfileType;
use crate::core::day_types::{DayType, Season};
use crate::core::vdi::HouseType;
use crate::errors::{ConfigurationError, CoverageError};
use anyhow::Context;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JoinMode {
    /// Missing rows are a completeness violation.
    Inner,
    /// Missing rows propagate as missing values.
    Outer,
}

/// Lookup key for the BDEW electricity standard load profiles: one factor per
/// season period, weekday number and quarter hour.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ElecSlpKey {
    pub season: Season,
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
}

/// Quarter-hourly shape factors for the BDEW electricity profile categories
/// (h0, g0..g6, l0..l2). Categories keep their table order.
#[derive(Clone, Debug)]
pub struct ElecSlpTable {
    factors: IndexMap<String, HashMap<ElecSlpKey, f64>>,
}

impl ElecSlpTable {
    pub const JOIN: JoinMode = JoinMode::Inner;

    pub fn new(factors: IndexMap<String, HashMap<ElecSlpKey, f64>>) -> Self {
        Self { factors }
    }

    /// Read the canonical CSV layout: `period,weekday,hour,minute` columns
    /// followed by one column per profile category.
    pub fn from_csv(file: impl Read) -> anyhow::Result<Self> {
        let mut reader = csv::Reader::from_reader(file);
        let headers = reader.headers().context("electricity SLP header")?.clone();
        let categories: Vec<String> = headers
            .iter()
            .skip(4)
            .map(|h| h.to_string())
            .collect();
        let mut factors: IndexMap<String, HashMap<ElecSlpKey, f64>> = categories
            .iter()
            .map(|c| (c.clone(), HashMap::new()))
            .collect();
        for record in reader.records() {
            let record = record.context("electricity SLP record")?;
            let key = ElecSlpKey {
                season: Season::from_str(&record[0]).context("period column")?,
                weekday: record[1].parse().context("weekday column")?,
                hour: record[2].parse().context("hour column")?,
                minute: record[3].parse().context("minute column")?,
            };
            for (category, value) in categories.iter().zip(record.iter().skip(4)) {
                let value: f64 = value.parse().context("factor column")?;
                if let Some(column) = factors.get_mut(category) {
                    column.insert(key, value);
                }
            }
        }
        Ok(Self { factors })
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.factors.keys().map(String::as_str)
    }

    pub fn factor(&self, category: &str, key: ElecSlpKey) -> Option<f64> {
        self.factors.get(category)?.get(&key).copied()
    }
}

/// Hour-of-day factors for the BDEW heat model, one row of 10 temperature
/// interval values per lookup key. Residential rows (building class > 0) are
/// keyed by hour alone; non-residential rows also carry the weekday.
#[derive(Clone, Debug)]
pub struct HourFactorTable {
    factors: HashMap<HourFactorKey, [f64; 10]>,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct HourFactorKey {
    pub building_class: u8,
    pub profile: HeatProfileType,
    pub weekday: Option<u8>,
    pub hour: u8,
}

impl HourFactorTable {
    /// Residential hour-factor tables have historically shipped with gaps, so
    /// missing rows are a signal to the caller rather than a hard error.
    pub const RESIDENTIAL_JOIN: JoinMode = JoinMode::Outer;
    pub const NON_RESIDENTIAL_JOIN: JoinMode = JoinMode::Inner;

    pub fn new(factors: HashMap<HourFactorKey, [f64; 10]>) -> Self {
        Self { factors }
    }

    /// Canonical CSV layout: `building_class,shlp_type,weekday,hour` followed
    /// by the ten temperature-interval columns; `weekday` stays empty for
    /// residential rows.
    pub fn from_csv(file: impl Read) -> anyhow::Result<Self> {
        let mut factors = HashMap::new();
        for record in csv::Reader::from_reader(file).records() {
            let record = record.context("hour factor record")?;
            let weekday = match &record[2] {
                "" => None,
                value => Some(value.parse().context("weekday column")?),
            };
            let mut intervals = [0.0; 10];
            for (i, value) in record.iter().skip(4).take(10).enumerate() {
                intervals[i] = value.parse().context("interval column")?;
            }
            factors.insert(
                HourFactorKey {
                    building_class: record[0].parse().context("building_class column")?,
                    profile: HeatProfileType::parse(&record[1])?,
                    weekday,
                    hour: record[3].parse().context("hour column")?,
                },
                intervals,
            );
        }
        Ok(Self { factors })
    }

    pub fn hour_factors(&self, key: HourFactorKey) -> Option<&[f64; 10]> {
        self.factors.get(&key)
    }
}

/// The four sigmoid parameters for one (building class, profile type, wind
/// class) combination.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct SigmoidParameters {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

#[derive(Clone, Debug)]
pub struct SigmoidTable {
    parameters: HashMap<(u8, HeatProfileType, u8), SigmoidParameters>,
}

#[derive(Debug, Deserialize)]
struct SigmoidRow {
    building_class: u8,
    shlp_type: String,
    wind_class: u8,
    parameter_a: f64,
    parameter_b: f64,
    parameter_c: f64,
    parameter_d: f64,
}

impl SigmoidTable {
    pub fn new(parameters: HashMap<(u8, HeatProfileType, u8), SigmoidParameters>) -> Self {
        Self { parameters }
    }

    pub fn from_csv(file: impl Read) -> anyhow::Result<Self> {
        let mut parameters = HashMap::new();
        for row in csv::Reader::from_reader(file).deserialize() {
            let row: SigmoidRow = row.context("sigmoid parameter record")?;
            let profile = HeatProfileType::parse(&row.shlp_type)?;
            let key = (row.building_class, profile, row.wind_class);
            let previous = parameters.insert(
                key,
                SigmoidParameters {
                    a: row.parameter_a,
                    b: row.parameter_b,
                    c: row.parameter_c,
                    d: row.parameter_d,
                },
            );
            if previous.is_some() {
                return Err(ConfigurationError::SigmoidParameterCount {
                    count: 2,
                    building_class: row.building_class,
                    profile: profile.to_string(),
                    wind_class: row.wind_class,
                }
                .into());
            }
        }
        Ok(Self { parameters })
    }

    /// Exactly one parameter set must exist for the combination. The warm
    /// water offset `d` is zeroed when warm water is excluded.
    pub fn parameters(
        &self,
        building_class: u8,
        profile: HeatProfileType,
        wind_class: u8,
        ww_incl: bool,
    ) -> Result<SigmoidParameters, ConfigurationError> {
        let mut parameters = self
            .parameters
            .get(&(building_class, profile, wind_class))
            .copied()
            .ok_or_else(|| ConfigurationError::SigmoidParameterCount {
                count: 0,
                building_class,
                profile: profile.to_string(),
                wind_class,
            })?;
        if !ww_incl {
            parameters.d = 0.0;
        }
        Ok(parameters)
    }
}

/// Per-weekday demand factors for the BDEW heat profiles.
#[derive(Clone, Debug)]
pub struct WeekdayFactorTable {
    factors: HashMap<(HeatProfileType, u8), f64>,
}

#[derive(Debug, Deserialize)]
struct WeekdayFactorRow {
    shlp_type: String,
    weekday: u8,
    factor: f64,
}

impl WeekdayFactorTable {
    pub const JOIN: JoinMode = JoinMode::Inner;

    pub fn new(factors: HashMap<(HeatProfileType, u8), f64>) -> Self {
        Self { factors }
    }

    pub fn from_csv(file: impl Read) -> anyhow::Result<Self> {
        let mut factors = HashMap::new();
        for row in csv::Reader::from_reader(file).deserialize() {
            let row: WeekdayFactorRow = row.context("weekday factor record")?;
            factors.insert(
                (HeatProfileType::parse(&row.shlp_type)?, row.weekday),
                row.factor,
            );
        }
        Ok(Self { factors })
    }

    pub fn factor(
        &self,
        profile: HeatProfileType,
        weekday: u8,
    ) -> Result<f64, CoverageError> {
        self.factors
            .get(&(profile, weekday))
            .copied()
            .ok_or_else(|| {
                CoverageError::new("weekday_factors", format!("({profile}, {weekday})"))
            })
    }
}

/// Normalized demand factors of one typical-day timestep (VDI 4655 Typtage).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TypicalDayFactors {
    pub electricity: f64,
    pub heat: f64,
    pub hot_water: f64,
}

/// The VDI 4655 typical-day reference profiles, keyed by house type, day-type
/// code and minute of day. The native step size per house type (1 minute for
/// EFH, 15 minutes for MFH in the published tables) is inferred from the
/// distinct minute values present.
#[derive(Clone, Debug)]
pub struct TypicalDayProfileTable {
    factors: HashMap<(HouseType, DayType, u32), TypicalDayFactors>,
    native_step_minutes: HashMap<HouseType, u32>,
}

#[derive(Debug, Deserialize)]
struct TypicalDayRow {
    house_type: String,
    day_type: String,
    minute_of_day: u32,
    electricity: f64,
    heat: f64,
    hot_water: f64,
}

impl TypicalDayProfileTable {
    pub const JOIN: JoinMode = JoinMode::Inner;

    pub fn new(factors: HashMap<(HouseType, DayType, u32), TypicalDayFactors>) -> Self {
        let native_step_minutes = infer_native_steps(&factors);
        Self {
            factors,
            native_step_minutes,
        }
    }

    pub fn from_csv(file: impl Read) -> anyhow::Result<Self> {
        let mut factors = HashMap::new();
        for row in csv::Reader::from_reader(file).deserialize() {
            let row: TypicalDayRow = row.context("typical day record")?;
            factors.insert(
                (
                    HouseType::parse(&row.house_type)?,
                    DayType::from_str(&row.day_type)?,
                    row.minute_of_day,
                ),
                TypicalDayFactors {
                    electricity: row.electricity,
                    heat: row.heat,
                    hot_water: row.hot_water,
                },
            );
        }
        Ok(Self::new(factors))
    }

    pub fn native_step_minutes(&self, house_type: HouseType) -> u32 {
        self.native_step_minutes
            .get(&house_type)
            .copied()
            .unwrap_or(1)
    }

    pub fn factors(
        &self,
        house_type: HouseType,
        day_type: DayType,
        minute_of_day: u32,
    ) -> Result<TypicalDayFactors, CoverageError> {
        let native = self.native_step_minutes(house_type);
        let aligned = minute_of_day - minute_of_day % native;
        self.factors
            .get(&(house_type, day_type, aligned))
            .copied()
            .ok_or_else(|| {
                CoverageError::new(
                    "typical_day_profiles",
                    format!("({house_type}, {day_type}, {aligned})"),
                )
            })
    }
}

fn infer_native_steps(
    factors: &HashMap<(HouseType, DayType, u32), TypicalDayFactors>,
) -> HashMap<HouseType, u32> {
    let mut minutes: HashMap<HouseType, HashSet<u32>> = HashMap::new();
    let mut day_types: HashMap<HouseType, HashSet<DayType>> = HashMap::new();
    for (house_type, day_type, minute) in factors.keys() {
        minutes.entry(*house_type).or_default().insert(*minute);
        day_types.entry(*house_type).or_default().insert(*day_type);
    }
    minutes
        .into_iter()
        .map(|(house_type, minutes)| {
            let steps_per_day = minutes.len().max(1) as u32;
            (house_type, (24 * 60 / steps_per_day).max(1))
        })
        .collect()
}

/// Per-day-type annual energy variation factors (VDI 4655 tables 10 to 24),
/// keyed by TRY region, house type and day-type code.
#[derive(Clone, Debug)]
pub struct EnergyFactorTable {
    factors: HashMap<(u8, HouseType, DayType), EnergyFactors>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EnergyFactors {
    pub heat: f64,
    pub electricity: f64,
    pub hot_water: f64,
}

#[derive(Debug, Deserialize)]
struct EnergyFactorRow {
    try_region: u8,
    house_type: String,
    day_type: String,
    f_heat: f64,
    f_el: f64,
    f_hot_water: f64,
}

impl EnergyFactorTable {
    pub const JOIN: JoinMode = JoinMode::Inner;

    pub fn new(factors: HashMap<(u8, HouseType, DayType), EnergyFactors>) -> Self {
        Self { factors }
    }

    pub fn from_csv(file: impl Read) -> anyhow::Result<Self> {
        let mut factors = HashMap::new();
        for row in csv::Reader::from_reader(file).deserialize() {
            let row: EnergyFactorRow = row.context("energy factor record")?;
            factors.insert(
                (
                    row.try_region,
                    HouseType::parse(&row.house_type)?,
                    DayType::from_str(&row.day_type)?,
                ),
                EnergyFactors {
                    heat: row.f_heat,
                    electricity: row.f_el,
                    hot_water: row.f_hot_water,
                },
            );
        }
        Ok(Self { factors })
    }

    pub fn contains_region(&self, try_region: u8) -> bool {
        self.factors.keys().any(|(region, _, _)| *region == try_region)
    }

    pub fn factors(
        &self,
        try_region: u8,
        house_type: HouseType,
        day_type: DayType,
    ) -> Result<EnergyFactors, CoverageError> {
        self.factors
            .get(&(try_region, house_type, day_type))
            .copied()
            .ok_or_else(|| {
                CoverageError::new(
                    "energy_factors",
                    format!("({try_region}, {house_type}, {day_type})"),
                )
            })
    }
}
