//! Composite parameters and validation

use crate::selection::PassSelection;
use crate::step::DEFAULT_MIN_OBS;
use crate::trend::Weighting;
use sarcomp_core::{DateRange, Error, Polarization, Result, Timestamp, MILLIS_PER_DAY};
use sarcomp_parallel::ProcessingMode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Days of history before the window end used by [`CompositeParams::ending_at`]
pub const DEFAULT_BASELINE_DAYS: i64 = 180;

/// Days of monitoring before the window end used by [`CompositeParams::ending_at`]
pub const DEFAULT_MONITORING_DAYS: i64 = 90;

/// Per-location model fitted by the composite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FitAlgorithm {
    /// Linear trend over the monitoring window
    Trend,
    /// Single level shift
    #[default]
    Step,
    /// Strongest peak in the monitoring window
    Spike,
}

impl FitAlgorithm {
    /// Output band names, in order. The first three form the RGB composite.
    pub fn band_names(&self) -> &'static [&'static str] {
        match self {
            FitAlgorithm::Trend => &["before", "after", "r_squared", "count", "slope_per_year"],
            FitAlgorithm::Step => &[
                "before",
                "after",
                "r_squared",
                "images_in_time_series",
                "images_in_change_series",
                "breakpoint",
                "left_count",
                "right_count",
            ],
            FitAlgorithm::Spike => &["red", "green", "blue", "spike_date", "ratio", "baseline"],
        }
    }
}

impl FromStr for FitAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "trend" | "trend-line" | "line" => Ok(FitAlgorithm::Trend),
            "step" | "step-function" => Ok(FitAlgorithm::Step),
            "spike" | "spike-function" => Ok(FitAlgorithm::Spike),
            _ => Err(Error::invalid_parameter(
                "algorithm",
                s,
                "expected trend, step or spike",
            )),
        }
    }
}

impl fmt::Display for FitAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitAlgorithm::Trend => f.write_str("trend"),
            FitAlgorithm::Step => f.write_str("step"),
            FitAlgorithm::Spike => f.write_str("spike"),
        }
    }
}

/// Everything that controls one composite run.
///
/// Three instants split the time axis: observations in
/// `[baseline_start, monitoring_start)` are history (and train the season
/// model), `[monitoring_start, end)` is the monitoring window.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeParams {
    pub baseline_start: Timestamp,
    pub monitoring_start: Timestamp,
    pub end: Timestamp,
    /// Selects the stretch of the RGB preview
    pub polarization: Polarization,
    pub pass_selection: PassSelection,
    pub remove_season: bool,
    pub algorithm: FitAlgorithm,
    /// Trend only
    pub weighting: Weighting,
    /// Step only: observations required after a breakpoint (exclusive)
    pub min_obs: usize,
    pub mode: ProcessingMode,
}

impl CompositeParams {
    /// Default settings with history and monitoring windows counted back from `end`
    pub fn ending_at(end: Timestamp) -> Self {
        Self {
            baseline_start: end - DEFAULT_BASELINE_DAYS * MILLIS_PER_DAY,
            monitoring_start: end - DEFAULT_MONITORING_DAYS * MILLIS_PER_DAY,
            end,
            polarization: Polarization::default(),
            pass_selection: PassSelection::default(),
            remove_season: false,
            algorithm: FitAlgorithm::default(),
            weighting: Weighting::default(),
            min_obs: DEFAULT_MIN_OBS,
            mode: ProcessingMode::default(),
        }
    }

    /// Check window ordering and the selection threshold
    pub fn validate(&self) -> Result<()> {
        if !(self.baseline_start < self.monitoring_start && self.monitoring_start < self.end) {
            return Err(Error::invalid_parameter(
                "dates",
                format!(
                    "baseline_start={} monitoring_start={} end={}",
                    self.baseline_start, self.monitoring_start, self.end
                ),
                "requires baseline_start < monitoring_start < end",
            ));
        }
        if let ProcessingMode::ParallelWith(0) = self.mode {
            return Err(Error::invalid_parameter("threads", 0, "must be at least 1"));
        }
        self.pass_selection.validate()
    }

    /// `[baseline_start, end)`
    pub fn full_range(&self) -> Result<DateRange> {
        DateRange::new(self.baseline_start, self.end)
    }

    /// `[baseline_start, monitoring_start)`
    pub fn baseline_range(&self) -> Result<DateRange> {
        DateRange::new(self.baseline_start, self.monitoring_start)
    }

    /// `[monitoring_start, end)`
    pub fn monitoring_range(&self) -> Result<DateRange> {
        DateRange::new(self.monitoring_start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_count_back_from_end() {
        let end = 1_700_000_000_000;
        let p = CompositeParams::ending_at(end);
        assert_eq!(p.end - p.monitoring_start, 90 * MILLIS_PER_DAY);
        assert_eq!(p.end - p.baseline_start, 180 * MILLIS_PER_DAY);
        assert_eq!(p.min_obs, 3);
        assert_eq!(p.pass_selection, PassSelection::Combine);
        assert_eq!(p.polarization, Polarization::VV);
        assert_eq!(p.weighting, Weighting::None);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn misordered_dates_fail_fast() {
        let mut p = CompositeParams::ending_at(1_000_000_000_000);
        p.monitoring_start = p.baseline_start;
        assert!(matches!(
            p.validate(),
            Err(Error::InvalidParameter { name: "dates", .. })
        ));
        let mut p = CompositeParams::ending_at(1_000_000_000_000);
        p.end = p.monitoring_start;
        assert!(p.validate().is_err());
    }

    #[test]
    fn bad_threshold_fails_fast() {
        let mut p = CompositeParams::ending_at(1_000_000_000_000);
        p.pass_selection = PassSelection::FilterSteep(f64::INFINITY);
        assert!(p.validate().is_err());
    }

    #[test]
    fn parse_algorithm() {
        assert_eq!("trend".parse::<FitAlgorithm>().unwrap(), FitAlgorithm::Trend);
        assert_eq!("Step-Function".parse::<FitAlgorithm>().unwrap(), FitAlgorithm::Step);
        assert_eq!("spike".parse::<FitAlgorithm>().unwrap(), FitAlgorithm::Spike);
        assert!("wiggle".parse::<FitAlgorithm>().is_err());
    }

    #[test]
    fn band_layouts() {
        assert_eq!(FitAlgorithm::Trend.band_names().len(), 5);
        assert_eq!(FitAlgorithm::Step.band_names().len(), 8);
        assert_eq!(FitAlgorithm::Spike.band_names()[..3], ["red", "green", "blue"]);
    }
}
