//! # SarComp Core
//!
//! Core types, traits and I/O for SAR backscatter time-series composites.
//!
//! This crate provides:
//! - `Raster<T>`: georeferenced grid for scene bands and output bands
//! - `Masked`: explicit validity marker propagated through all arithmetic
//! - `Observation` / `SeriesSource`: per-location time series access
//! - `TerrainSample` / `TerrainLookup`: static terrain used for pass selection
//! - GeoTIFF I/O

pub mod error;
pub mod io;
pub mod mask;
pub mod raster;
pub mod series;
pub mod terrain;

pub use error::{Error, Result};
pub use mask::Masked;
pub use raster::{GeoTransform, Raster, RasterElement};
pub use series::{
    DateRange, Location, Observation, Pass, Polarization, SeriesSource, Timestamp, MILLIS_PER_DAY,
};
pub use terrain::{TerrainLookup, TerrainSample};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::mask::Masked;
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::series::{DateRange, Location, Observation, Pass, Polarization, SeriesSource, Timestamp};
    pub use crate::terrain::{TerrainLookup, TerrainSample};
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in SarComp.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
