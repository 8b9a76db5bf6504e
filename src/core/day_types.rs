use crate::core::calendar::{HOLIDAY_CLASS, SUNDAY_CLASS};
use crate::errors::{ConfigurationError, ProfileError};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum_macros::{Display, EnumString};

/// Cloud cover at or above this value (on the 8-point okta scale) counts as
/// heavily overcast.
pub const HEAVY_CLOUD_COVER: f64 = 5.0;

#[derive(Clone, Copy, Debug, Deserialize, Display, EnumString, Eq, Hash, PartialEq, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Summer,
    Transition,
}

impl Season {
    pub fn symbol(&self) -> char {
        match self {
            Season::Winter => 'W',
            Season::Summer => 'S',
            Season::Transition => 'U',
        }
    }

    fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'W' => Some(Season::Winter),
            'S' => Some(Season::Summer),
            'U' => Some(Season::Transition),
            _ => None,
        }
    }
}

/// Weekday half of a day-type code: Saturdays count as weekdays here, only
/// Sundays and holidays form the second class.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TypicalDayKind {
    Weekday,
    SundayOrHoliday,
}

impl TypicalDayKind {
    pub fn from_weekday_class(class: u8) -> Self {
        if class == SUNDAY_CLASS || class == HOLIDAY_CLASS {
            TypicalDayKind::SundayOrHoliday
        } else {
            TypicalDayKind::Weekday
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            TypicalDayKind::Weekday => 'W',
            TypicalDayKind::SundayOrHoliday => 'S',
        }
    }

    fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'W' => Some(TypicalDayKind::Weekday),
            'S' => Some(TypicalDayKind::SundayOrHoliday),
            _ => None,
        }
    }
}

/// The sunny/cloudy distinction has no effect on summer profiles, so summer
/// days always carry the wildcard symbol.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CloudCover {
    Covered,
    Clear,
    Irrelevant,
}

impl CloudCover {
    pub fn symbol(&self) -> char {
        match self {
            CloudCover::Covered => 'B',
            CloudCover::Clear => 'H',
            CloudCover::Irrelevant => 'X',
        }
    }

    fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'B' => Some(CloudCover::Covered),
            'H' => Some(CloudCover::Clear),
            'X' => Some(CloudCover::Irrelevant),
            _ => None,
        }
    }
}

/// Composite typical-day key, e.g. `WWB` for an overcast winter weekday. The
/// symbol order (season, weekday kind, cloud cover) is fixed because the code
/// doubles as a literal join key into the reference tables.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct DayType {
    pub season: Season,
    pub kind: TypicalDayKind,
    pub cloud: CloudCover,
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.season.symbol(),
            self.kind.symbol(),
            self.cloud.symbol()
        )
    }
}

impl FromStr for DayType {
    type Err = ConfigurationError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigurationError::InvalidDayTypeCode(code.to_string());
        let mut symbols = code.chars();
        let day_type = DayType {
            season: symbols
                .next()
                .and_then(Season::from_symbol)
                .ok_or_else(invalid)?,
            kind: symbols
                .next()
                .and_then(TypicalDayKind::from_symbol)
                .ok_or_else(invalid)?,
            cloud: symbols
                .next()
                .and_then(CloudCover::from_symbol)
                .ok_or_else(invalid)?,
        };
        if symbols.next().is_some() {
            return Err(invalid());
        }
        Ok(day_type)
    }
}

/// One named season date range, bounded by inclusive month/day pairs.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SeasonRange {
    pub season: Season,
    pub start: (u32, u32),
    pub end: (u32, u32),
}

impl SeasonRange {
    fn contains(&self, date: NaiveDate) -> bool {
        let md = (date.month(), date.day());
        self.start <= md && md <= self.end
    }
}

/// A fixed season assignment: date ranges that together must cover all 366
/// days of a leap year, each day falling into exactly one season.
#[derive(Clone, Debug)]
pub struct SeasonRanges {
    ranges: Vec<SeasonRange>,
}

impl SeasonRanges {
    pub fn new(ranges: Vec<SeasonRange>) -> Result<Self, ConfigurationError> {
        let ranges = Self { ranges };
        // 2012 is a leap year, so this walks all 366 possible month-days.
        let mut date = NaiveDate::from_ymd_opt(2012, 1, 1).expect("valid date");
        while date.year() == 2012 {
            if ranges.lookup(date).is_none() {
                return Err(ConfigurationError::SeasonGap {
                    month: date.month(),
                    day: date.day(),
                });
            }
            date = date.succ_opt().expect("next day within range");
        }
        Ok(ranges)
    }

    /// The standard BDEW seasons: summer 15.05.-14.09., transitions
    /// 21.03.-14.05. and 15.09.-31.10., winter 01.01.-20.03. and 01.11.-31.12.
    pub fn bdew_default() -> Self {
        Self {
            ranges: vec![
                SeasonRange {
                    season: Season::Summer,
                    start: (5, 15),
                    end: (9, 14),
                },
                SeasonRange {
                    season: Season::Transition,
                    start: (3, 21),
                    end: (5, 14),
                },
                SeasonRange {
                    season: Season::Transition,
                    start: (9, 15),
                    end: (10, 31),
                },
                SeasonRange {
                    season: Season::Winter,
                    start: (1, 1),
                    end: (3, 20),
                },
                SeasonRange {
                    season: Season::Winter,
                    start: (11, 1),
                    end: (12, 31),
                },
            ],
        }
    }

    fn lookup(&self, date: NaiveDate) -> Option<Season> {
        self.ranges
            .iter()
            .find(|r| r.contains(date))
            .map(|r| r.season)
    }

    pub fn season_for(&self, date: NaiveDate) -> Season {
        // Coverage is validated at construction; bdew_default covers too.
        self.lookup(date).unwrap_or(Season::Winter)
    }
}

/// Strategy for assigning a season label to a calendar day. The two variants
/// are interchangeable from the resolver's point of view.
#[derive(Clone, Debug)]
pub enum SeasonMode {
    /// Explicit date ranges per season.
    Fixed(SeasonRanges),
    /// Per-day mean temperature against two thresholds: below `winter_limit`
    /// is winter, above `summer_limit` is summer, in between is transition.
    Temperature { winter_limit: f64, summer_limit: f64 },
}

impl SeasonMode {
    pub fn temperature(winter_limit: f64, summer_limit: f64) -> Result<Self, ConfigurationError> {
        if winter_limit >= summer_limit {
            return Err(ConfigurationError::InvalidTemperatureLimits {
                winter: winter_limit,
                summer: summer_limit,
            });
        }
        Ok(SeasonMode::Temperature {
            winter_limit,
            summer_limit,
        })
    }
}

/// Named season-assignment strategies as they appear in configuration.
/// Unknown names are a configuration error, never a silent fallback.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[strum(serialize_all = "lowercase")]
pub enum SeasonAssignment {
    Temperature,
    Fixed,
}

impl SeasonAssignment {
    pub fn parse(name: &str) -> Result<Self, ConfigurationError> {
        match name {
            "temperature" => Ok(SeasonAssignment::Temperature),
            "fix" | "fixed" => Ok(SeasonAssignment::Fixed),
            other => Err(ConfigurationError::UnknownSeasonMode(other.to_string())),
        }
    }
}

/// Assign one season per calendar day under the given mode. The temperature
/// mode requires one daily mean temperature per date.
pub fn resolve_seasons(
    dates: &[NaiveDate],
    mode: &SeasonMode,
    daily_mean_temperature: Option<&[f64]>,
) -> Result<Vec<Season>, ProfileError> {
    match mode {
        SeasonMode::Fixed(ranges) => Ok(dates.iter().map(|d| ranges.season_for(*d)).collect()),
        SeasonMode::Temperature {
            winter_limit,
            summer_limit,
        } => {
            let temperatures = daily_mean_temperature
                .ok_or(ConfigurationError::MissingTemperatureSeries)
                .map_err(ProfileError::from)?;
            if temperatures.len() != dates.len() {
                return Err(ProfileError::InvalidCalendar(format!(
                    "daily mean temperature series has {} values for {} days",
                    temperatures.len(),
                    dates.len()
                )));
            }
            Ok(temperatures
                .iter()
                .map(|t| {
                    if *t < *winter_limit {
                        Season::Winter
                    } else if *t > *summer_limit {
                        Season::Summer
                    } else {
                        Season::Transition
                    }
                })
                .collect())
        }
    }
}

/// Combine season, weekday class and cloud cover into one day-type code per
/// calendar day. Cloud cover is only consulted outside summer, but a cloud
/// series of the wrong length is rejected regardless.
pub fn resolve_day_types(
    seasons: &[Season],
    daily_weekday_classes: &[u8],
    daily_cloud_cover: Option<&[f64]>,
) -> Result<Vec<DayType>, ProfileError> {
    if daily_weekday_classes.len() != seasons.len() {
        return Err(ProfileError::InvalidCalendar(format!(
            "weekday class series has {} values for {} days",
            daily_weekday_classes.len(),
            seasons.len()
        )));
    }
    if let Some(cover) = daily_cloud_cover {
        if cover.len() != seasons.len() {
            return Err(ProfileError::InvalidCalendar(format!(
                "cloud cover series has {} values for {} days",
                cover.len(),
                seasons.len()
            )));
        }
    }
    seasons
        .iter()
        .zip(daily_weekday_classes)
        .enumerate()
        .map(|(day, (season, class))| {
            let cloud = if *season == Season::Summer {
                CloudCover::Irrelevant
            } else {
                let cover = daily_cloud_cover
                    .ok_or(ConfigurationError::MissingCloudCoverSeries)
                    .map_err(ProfileError::from)?;
                if cover[day] >= HEAVY_CLOUD_COVER {
                    CloudCover::Covered
                } else {
                    CloudCover::Clear
                }
            };
            Ok(DayType {
                season: *season,
                kind: TypicalDayKind::from_weekday_class(*class),
                cloud,
            })
        })
        .collect()
}
