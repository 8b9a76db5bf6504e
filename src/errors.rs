use thiserror::Error;

/// Top-level error for a profile construction run.
///
/// Configuration and domain errors abort the whole construction; coverage
/// errors are only raised on inner-join lookup paths (outer-join paths
/// propagate missing values into the output series instead).
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Coverage(#[from] CoverageError),
    #[error("Invalid calendar input: {0}")]
    InvalidCalendar(String),
}

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Season assignment mode <{0}> does not exist")]
    UnknownSeasonMode(String),
    #[error("Season date ranges leave {month:02}-{day:02} without a season")]
    SeasonGap { month: u32, day: u32 },
    #[error("Winter temperature limit {winter} must be below the summer temperature limit {summer}")]
    InvalidTemperatureLimits { winter: f64, summer: f64 },
    #[error("Temperature-threshold season assignment requires a daily mean temperature series")]
    MissingTemperatureSeries,
    #[error("Cloud-cover classification requires a daily mean cloud cover series")]
    MissingCloudCoverSeries,
    #[error("Building class must be 0 for non-residential profile type {profile}, got {building_class}")]
    NonResidentialBuildingClass { profile: String, building_class: u8 },
    #[error("Residential building class must be between 1 and 11, got {0}")]
    BuildingClassOutOfRange(u8),
    #[error("{count} sigmoid parameter sets found for building_class={building_class}, shlp_type={profile}, wind_class={wind_class}. Should be 1.")]
    SigmoidParameterCount {
        count: usize,
        building_class: u8,
        profile: String,
        wind_class: u8,
    },
    #[error("Missing entry for '{field}' in profile factors for '{group}'")]
    MissingProfileFactor { group: String, field: String },
    #[error("<{0}> is not a supported day type code")]
    InvalidDayTypeCode(String),
    #[error("<{0}> is not a supported heat profile type")]
    InvalidProfileType(String),
    #[error("<{0}> is not a supported house type")]
    InvalidHouseType(String),
}

/// Range errors over the model's supported input domain.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Temperature {0}°C is outside the supported interval table range (-20°C to +40°C)")]
    TemperatureOutOfRange(f64),
}

/// An inner-join lookup found no reference row; the reference table failed
/// its completeness assertion.
#[derive(Debug, Error)]
#[error("No reference row in table '{table}' for key {key}")]
pub struct CoverageError {
    pub table: &'static str,
    pub key: String,
}

impl CoverageError {
    pub(crate) fn new(table: &'static str, key: impl Into<String>) -> Self {
        Self {
            table,
            key: key.into(),
        }
    }
}
