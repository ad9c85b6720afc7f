//! # SarComp Algorithms
//!
//! Per-location fitting of SAR backscatter time series.
//!
//! ## Modules
//!
//! - **terrain**: slope, aspect and east-west slope from a DEM
//! - **selection**: terrain-aware masking of ascending/descending passes
//! - **season**: annual harmonic fit and removal
//! - **step**: single level-shift detection
//! - **trend**: weighted linear trend
//! - **spike**: strongest peak and its colour encoding
//! - **composite**: the raster-wide driver tying the above together

pub(crate) mod maybe_rayon;

pub mod composite;
pub mod season;
pub mod selection;
pub mod spike;
pub mod stats;
pub mod step;
pub mod terrain;
pub mod trend;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::composite::{compute_composite, Band, CompositeOutput, CompositeParams, FitAlgorithm};
    pub use crate::season::{fit_season, remove_season, SeasonModel};
    pub use crate::selection::{PassSelection, DEFAULT_SLOPE_THRESHOLD};
    pub use crate::spike::{find_spike, SpikeFit};
    pub use crate::step::{fit_step, StepFit, DEFAULT_MIN_OBS};
    pub use crate::terrain::{ew_slope, terrain_model, EwSlope, TerrainParams};
    pub use crate::trend::{fit_trend, TrendFit, Weighting};
    pub use sarcomp_core::prelude::*;
}
