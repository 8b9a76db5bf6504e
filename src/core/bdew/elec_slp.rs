//! Electrical standardized load profiles based on the BDEW method.

use crate::core::calendar::{weekday_class, Holidays, TimeIndex};
use crate::core::day_types::SeasonRanges;
use crate::core::reference_table::{ElecSlpKey, ElecSlpTable};
use crate::core::resolver::resolve_series_complete;
use crate::core::scaling::{normalize_to_annual, scale_by_targets};
use crate::core::units::intervals_per_hour;
use crate::errors::{CoverageError, ProfileError};
use chrono::{Duration, Timelike};
use indexmap::IndexMap;

/// Column name of the dynamic household profile derived from h0.
pub const H0_DYN: &str = "h0_dyn";

/// Quarter-hourly electricity standard load profiles for one year, one
/// normalized column per profile category plus the dynamic `h0_dyn` variant.
/// The frame is computed once at construction and immutable afterwards.
#[derive(Clone, Debug)]
pub struct ElecSlp {
    year: i32,
    index: TimeIndex,
    slp_frame: IndexMap<String, Vec<f64>>,
}

impl ElecSlp {
    /// Build the normalized profile frame for `year`. Holidays fold into the
    /// Sunday class (the BDEW electricity tables carry no holiday column);
    /// custom seasons replace the standard BDEW season ranges.
    pub fn new(
        year: i32,
        table: &ElecSlpTable,
        seasons: Option<SeasonRanges>,
        holidays: Option<&Holidays>,
    ) -> Result<Self, ProfileError> {
        let step = Duration::minutes(15);
        let index = TimeIndex::for_year(year, step)?;
        let seasons = seasons.unwrap_or_else(SeasonRanges::bdew_default);

        let mut slp_frame: IndexMap<String, Vec<f64>> = IndexMap::new();
        for category in table.categories() {
            let raw = resolve_series_complete(&index, step, |ts| {
                let key = ElecSlpKey {
                    season: seasons.season_for(ts.date()),
                    weekday: weekday_class(ts, holidays, true),
                    hour: ts.hour() as u8,
                    minute: ts.minute() as u8,
                };
                table.factor(category, key).ok_or_else(|| {
                    CoverageError::new(
                        "elec_slp",
                        format!(
                            "({category}, {}, {}, {:02}:{:02})",
                            key.season, key.weekday, key.hour, key.minute
                        ),
                    )
                })
            })?;
            slp_frame.insert(category.to_string(), normalize_to_annual(&raw, 1.0));
        }

        if let Some(h0) = slp_frame.get("h0") {
            // Renormalized like every other column, so annual scaling behaves
            // identically for the dynamic variant.
            let h0_dyn = normalize_to_annual(&dynamic_h0_profile(h0), 1.0);
            slp_frame.insert(H0_DYN.to_string(), h0_dyn);
        }

        Ok(Self {
            year,
            index,
            slp_frame,
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn index(&self) -> &TimeIndex {
        &self.index
    }

    /// The normalized quarter-hourly frame, one column per category.
    pub fn slp_frame(&self) -> &IndexMap<String, Vec<f64>> {
        &self.slp_frame
    }

    /// Scale the frame by annual demand values per category, in power units
    /// (the ×4 conversion for 15-minute steps). Categories without an annual
    /// value are dropped from the output.
    pub fn get_profile(
        &self,
        annual_demand_per_category: &IndexMap<String, f64>,
    ) -> IndexMap<String, Vec<f64>> {
        scale_by_targets(
            &self.slp_frame,
            annual_demand_per_category,
            intervals_per_hour(self.index.step()),
        )
    }
}

/// The BDEW dynamisation function smoothing the seasonal edges of h0:
///
/// f(x) = -3.916649251e-10 x⁴ + 3.2e-7 x³ - 7.02e-5 x² + 0.0021 x + 1.24
///
/// evaluated on the decimal day of the year x = (q + 1) / 96 over the
/// quarter-hour index q. The leading coefficient is the high-precision
/// constant, not the rounded -3.92e-10.
fn dynamic_h0_profile(h0: &[f64]) -> Vec<f64> {
    h0.iter()
        .enumerate()
        .map(|(q, value)| {
            let x = (q + 1) as f64 / 96.0;
            let smoothing = -3.916649251e-10 * x.powi(4) + 3.2e-7 * x.powi(3)
                - 7.02e-5 * x.powi(2)
                + 0.0021 * x
                + 1.24;
            value * smoothing
        })
        .collect()
}
