//! Typical-day load profiles for residential buildings following VDI 4655.

pub mod region;

pub use region::{
    House, HouseLoadCurves, Region, RegionSeasons, TemperatureLimits, VdiReferenceTables,
};

use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// The two residential house types the VDI 4655 reference profiles cover.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, EnumString, Eq, Hash, PartialEq, Serialize,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum HouseType {
    /// Single-family house
    Efh,
    /// Multi-family house
    Mfh,
}

impl HouseType {
    pub fn parse(name: &str) -> Result<Self, ConfigurationError> {
        name.parse()
            .map_err(|_| ConfigurationError::InvalidHouseType(name.to_string()))
    }
}

/// The three demand kinds of a typical-day profile.
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EnergyKind {
    Electricity,
    Heat,
    HotWater,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn house_types_parse_case_insensitively() {
        assert_eq!(HouseType::parse("efh").unwrap(), HouseType::Efh);
        assert_eq!(HouseType::parse("MFH").unwrap(), HouseType::Mfh);
        assert!(HouseType::parse("GHD").is_err());
    }

    #[rstest]
    fn energy_kinds_display_as_snake_case() {
        assert_eq!(EnergyKind::HotWater.to_string(), "hot_water");
    }
}
