pub mod core;
pub mod errors;
pub mod read_weather_file;

pub use crate::core::bdew::{
    ElecSlp, HeatBuilding, HeatBuildingConfig, HeatProfileType, HeatReferenceTables,
};
pub use crate::core::calendar::{Holidays, TimeIndex};
pub use crate::core::day_types::{DayType, Season, SeasonAssignment, SeasonMode, SeasonRanges};
pub use crate::core::industrial::{
    DayNightFactors, IndustrialLoadProfile, SimpleProfileConfig, StepFactors,
};
pub use crate::core::vdi::{
    House, HouseLoadCurves, HouseType, Region, RegionSeasons, TemperatureLimits,
    VdiReferenceTables,
};
pub use crate::errors::ProfileError;
pub use crate::read_weather_file::{read_dwd_weather_file, WeatherData};
