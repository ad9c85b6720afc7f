//! Terrain-aware observation selection
//!
//! Masks the observations of a location that were acquired from the
//! geometrically unfavorable pass. Nothing is removed from the series: a
//! rejected observation keeps its timestamp and pass but loses its value, so
//! every other consumer still sees the full acquisition calendar.

use sarcomp_core::{Error, Observation, Pass, Result, TerrainSample};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default relief threshold for [`PassSelection::FilterSteep`], in degrees
pub const DEFAULT_SLOPE_THRESHOLD: f64 = 20.0;

/// Which passes contribute at each location
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum PassSelection {
    /// Ascending passes only
    Ascending,
    /// Descending passes only
    Descending,
    /// The pass looking more directly uphill (terrain rule at threshold 0)
    Best,
    /// Only the favored pass where |ew_slope| exceeds the threshold (degrees)
    FilterSteep(f64),
    /// Both passes everywhere
    #[default]
    Combine,
}

impl PassSelection {
    /// Reject non-finite or negative thresholds
    pub fn validate(&self) -> Result<()> {
        if let PassSelection::FilterSteep(t) = *self
            && !(t.is_finite() && t >= 0.0)
        {
            return Err(Error::invalid_parameter(
                "slope_threshold",
                t,
                "must be a finite angle >= 0 degrees",
            ));
        }
        Ok(())
    }

    /// Terrain threshold in degrees when this mode consults terrain
    pub fn terrain_threshold(&self) -> Option<f64> {
        match *self {
            PassSelection::Best => Some(0.0),
            PassSelection::FilterSteep(t) => Some(t),
            _ => None,
        }
    }

    /// Mask rejected observations of one location.
    ///
    /// `terrain` is only consulted by terrain-based modes; `None` there
    /// (undefined terrain) masks every observation.
    pub fn apply(&self, series: &[Observation], terrain: Option<TerrainSample>) -> Vec<Observation> {
        match *self {
            PassSelection::Combine => series.to_vec(),
            PassSelection::Ascending => mask_where(series, |o| o.pass == Pass::Ascending),
            PassSelection::Descending => mask_where(series, |o| o.pass == Pass::Descending),
            PassSelection::Best | PassSelection::FilterSteep(_) => {
                let threshold = self.terrain_threshold().unwrap_or(0.0);
                match terrain {
                    Some(sample) => {
                        let ew = sample.ew_slope_degrees();
                        mask_where(series, |o| keeps_pass(o.pass, ew, threshold))
                    }
                    None => series.iter().map(|o| o.masked()).collect(),
                }
            }
        }
    }
}

impl FromStr for PassSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ascending" | "asc" => Ok(PassSelection::Ascending),
            "descending" | "desc" => Ok(PassSelection::Descending),
            "best" => Ok(PassSelection::Best),
            "filter-steep" | "filter_steep" | "steep" => {
                Ok(PassSelection::FilterSteep(DEFAULT_SLOPE_THRESHOLD))
            }
            "combine" | "both" => Ok(PassSelection::Combine),
            _ => Err(Error::invalid_parameter(
                "pass_selection",
                s,
                "expected ascending, descending, best, filter-steep or combine",
            )),
        }
    }
}

impl fmt::Display for PassSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassSelection::Ascending => f.write_str("ascending"),
            PassSelection::Descending => f.write_str("descending"),
            PassSelection::Best => f.write_str("best"),
            PassSelection::FilterSteep(t) => write!(f, "filter-steep ({t} deg)"),
            PassSelection::Combine => f.write_str("combine"),
        }
    }
}

/// Terrain rule for one observation.
///
/// Ascending is kept when `ew_slope > -threshold`, descending when
/// `ew_slope <= threshold`. At threshold 0 exactly one pass survives and
/// flat ground (`ew_slope == 0`) keeps descending.
pub fn keeps_pass(pass: Pass, ew_slope_degrees: f64, threshold_degrees: f64) -> bool {
    match pass {
        Pass::Ascending => ew_slope_degrees > -threshold_degrees,
        Pass::Descending => ew_slope_degrees <= threshold_degrees,
    }
}

fn mask_where<F: Fn(&Observation) -> bool>(series: &[Observation], keep: F) -> Vec<Observation> {
    series
        .iter()
        .map(|o| if keep(o) { *o } else { o.masked() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed_series() -> Vec<Observation> {
        (0..6)
            .map(|i| {
                let pass = if i % 2 == 0 { Pass::Ascending } else { Pass::Descending };
                Observation::new(i * 1000, -10.0 - i as f64, pass)
            })
            .collect()
    }

    /// Terrain whose ew slope is `deg` (pure east or west aspect)
    fn terrain_with_ew(deg: f64) -> TerrainSample {
        if deg == 0.0 {
            return TerrainSample::flat();
        }
        let aspect = if deg > 0.0 { 90f64 } else { 270f64 };
        TerrainSample::new(deg.abs().to_radians(), Some(aspect.to_radians()))
    }

    fn kept_passes(out: &[Observation]) -> Vec<Pass> {
        out.iter().filter(|o| o.is_valid()).map(|o| o.pass).collect()
    }

    #[test]
    fn flat_ground_at_zero_threshold_keeps_descending_only() {
        let out = PassSelection::Best.apply(&mixed_series(), Some(TerrainSample::flat()));
        assert_eq!(out.len(), 6);
        assert!(kept_passes(&out).iter().all(|p| *p == Pass::Descending));
        assert_eq!(kept_passes(&out).len(), 3);
    }

    #[test]
    fn best_picks_uphill_pass() {
        let east = PassSelection::Best.apply(&mixed_series(), Some(terrain_with_ew(10.0)));
        assert!(kept_passes(&east).iter().all(|p| *p == Pass::Ascending));
        let west = PassSelection::Best.apply(&mixed_series(), Some(terrain_with_ew(-10.0)));
        assert!(kept_passes(&west).iter().all(|p| *p == Pass::Descending));
    }

    #[test]
    fn steep_terrain_keeps_only_favored_pass() {
        let mode = PassSelection::FilterSteep(20.0);
        let out = mode.apply(&mixed_series(), Some(terrain_with_ew(35.0)));
        assert_eq!(kept_passes(&out), vec![Pass::Ascending; 3]);
        let out = mode.apply(&mixed_series(), Some(terrain_with_ew(-35.0)));
        assert_eq!(kept_passes(&out), vec![Pass::Descending; 3]);
    }

    #[test]
    fn gentle_terrain_keeps_both_passes() {
        let mode = PassSelection::FilterSteep(20.0);
        for ew in [-19.5, -5.0, 0.0, 12.0, 19.5] {
            let out = mode.apply(&mixed_series(), Some(terrain_with_ew(ew)));
            assert_eq!(out, mixed_series(), "ew slope {ew}");
        }
    }

    #[test]
    fn rule_boundaries() {
        assert!(keeps_pass(Pass::Descending, 20.0, 20.0));
        assert!(!keeps_pass(Pass::Ascending, -20.0, 20.0));
        assert!(keeps_pass(Pass::Ascending, -19.9, 20.0));
        assert!(!keeps_pass(Pass::Descending, 20.1, 20.0));
    }

    #[test]
    fn orbit_modes_ignore_terrain() {
        let out = PassSelection::Ascending.apply(&mixed_series(), None);
        assert_eq!(kept_passes(&out), vec![Pass::Ascending; 3]);
        let out = PassSelection::Descending.apply(&mixed_series(), None);
        assert_eq!(kept_passes(&out), vec![Pass::Descending; 3]);
        assert_eq!(PassSelection::Combine.apply(&mixed_series(), None), mixed_series());
    }

    #[test]
    fn undefined_terrain_masks_everything() {
        let out = PassSelection::Best.apply(&mixed_series(), None);
        assert!(out.iter().all(|o| !o.is_valid()));
        assert_eq!(out.iter().map(|o| o.timestamp).collect::<Vec<_>>(), vec![0, 1000, 2000, 3000, 4000, 5000]);
    }

    #[test]
    fn parse_and_validate() {
        assert_eq!("best".parse::<PassSelection>().unwrap(), PassSelection::Best);
        assert_eq!(
            "filter-steep".parse::<PassSelection>().unwrap(),
            PassSelection::FilterSteep(DEFAULT_SLOPE_THRESHOLD)
        );
        assert!("sideways".parse::<PassSelection>().is_err());
        assert!(PassSelection::FilterSteep(-1.0).validate().is_err());
        assert!(PassSelection::FilterSteep(f64::NAN).validate().is_err());
        assert!(PassSelection::FilterSteep(0.0).validate().is_ok());
    }
}
