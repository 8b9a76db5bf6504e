//! BDEW standard load profile generators for electricity and building heat.

pub mod elec_slp;
pub mod heat_building;

pub use elec_slp::ElecSlp;
pub use heat_building::{HeatBuilding, HeatBuildingConfig, HeatReferenceTables};

use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Standardized heat load profile types according to BDEW. EFH and MFH are
/// the residential types; everything else covers trade, commerce and services
/// and is restricted to building class 0.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, EnumString, Eq, Hash, PartialEq, Serialize,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum HeatProfileType {
    /// Single-family house
    Efh,
    /// Multi-family house
    Mfh,
    Gmf,
    Gpd,
    Ghd,
    Gwa,
    Ggb,
    Gko,
    Gbd,
    Gba,
    Gmk,
    Gbh,
    Gga,
    Gha,
}

impl HeatProfileType {
    pub fn is_residential(self) -> bool {
        matches!(self, HeatProfileType::Efh | HeatProfileType::Mfh)
    }

    pub fn parse(name: &str) -> Result<Self, ConfigurationError> {
        name.parse()
            .map_err(|_| ConfigurationError::InvalidProfileType(name.to_string()))
    }
}
