//! Static terrain samples used for pass selection

use crate::error::{Error, Result};
use crate::raster::Raster;
use crate::series::Location;

/// Slope and aspect at one location, derived once from an elevation model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainSample {
    /// Slope angle in radians (0 = flat)
    pub slope_radians: f64,
    /// Aspect in radians clockwise from north; `None` on flat ground
    pub aspect_radians: Option<f64>,
}

impl TerrainSample {
    pub fn new(slope_radians: f64, aspect_radians: Option<f64>) -> Self {
        Self {
            slope_radians,
            aspect_radians,
        }
    }

    /// Flat ground
    pub fn flat() -> Self {
        Self::new(0.0, None)
    }

    /// East-west facing slope component in degrees.
    ///
    /// `atan(tan(slope) * sin(aspect))`, positive for east-facing surfaces
    /// and exactly zero on flat ground.
    pub fn ew_slope_degrees(&self) -> f64 {
        match self.aspect_radians {
            Some(aspect) => (self.slope_radians.tan() * aspect.sin()).atan().to_degrees(),
            None => 0.0,
        }
    }
}

/// Per-location terrain lookup.
///
/// `Ok(None)` means the terrain is undefined at the location (DEM nodata or
/// raster border); observations relying on it are masked.
pub trait TerrainLookup: Sync {
    fn terrain_at(&self, location: Location) -> Result<Option<TerrainSample>>;
}

/// Slope and aspect rasters in radians.
///
/// Slope cells that are nodata mark undefined terrain; aspect nodata (or a
/// negative value) marks flat ground.
#[derive(Debug, Clone)]
pub struct TerrainRaster {
    slope: Raster<f64>,
    aspect: Raster<f64>,
}

impl TerrainRaster {
    pub fn new(slope: Raster<f64>, aspect: Raster<f64>) -> Result<Self> {
        if slope.shape() != aspect.shape() {
            return Err(Error::SizeMismatch {
                er: slope.rows(),
                ec: slope.cols(),
                ar: aspect.rows(),
                ac: aspect.cols(),
            });
        }
        Ok(Self { slope, aspect })
    }

    pub fn shape(&self) -> (usize, usize) {
        self.slope.shape()
    }

    pub fn slope(&self) -> &Raster<f64> {
        &self.slope
    }

    pub fn aspect(&self) -> &Raster<f64> {
        &self.aspect
    }
}

impl TerrainLookup for TerrainRaster {
    fn terrain_at(&self, (row, col): Location) -> Result<Option<TerrainSample>> {
        let slope = self.slope.get(row, col)?;
        if self.slope.is_nodata(slope) {
            return Ok(None);
        }
        let aspect = self.aspect.get(row, col)?;
        let aspect = (!self.aspect.is_nodata(aspect) && aspect >= 0.0).then_some(aspect);
        Ok(Some(TerrainSample::new(slope, aspect)))
    }
}

/// Terrain that is flat everywhere, for stacks without an elevation model
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatTerrain;

impl TerrainLookup for FlatTerrain {
    fn terrain_at(&self, _location: Location) -> Result<Option<TerrainSample>> {
        Ok(Some(TerrainSample::flat()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    #[test]
    fn ew_slope_east_facing_is_positive() {
        let s = TerrainSample::new(FRAC_PI_4, Some(FRAC_PI_2));
        assert!((s.ew_slope_degrees() - 45.0).abs() < 1e-9);
    }

    #[test]
    fn ew_slope_west_facing_is_negative() {
        let s = TerrainSample::new(30f64.to_radians(), Some(3.0 * FRAC_PI_2));
        assert!((s.ew_slope_degrees() + 30.0).abs() < 1e-9);
    }

    #[test]
    fn ew_slope_north_facing_is_near_zero() {
        let s = TerrainSample::new(FRAC_PI_4, Some(0.0));
        assert!(s.ew_slope_degrees().abs() < 1e-9);
        let s = TerrainSample::new(FRAC_PI_4, Some(PI));
        assert!(s.ew_slope_degrees().abs() < 1e-9);
    }

    #[test]
    fn flat_ground_is_exactly_zero() {
        assert_eq!(TerrainSample::flat().ew_slope_degrees(), 0.0);
    }

    #[test]
    fn terrain_raster_lookup() {
        let mut slope = Raster::filled(2, 2, 0.3);
        slope.set_nodata(Some(f64::NAN));
        slope.set(0, 1, f64::NAN).unwrap();
        let mut aspect = Raster::filled(2, 2, 1.0);
        aspect.set(1, 1, -1.0).unwrap();
        let terrain = TerrainRaster::new(slope, aspect).unwrap();

        assert_eq!(terrain.terrain_at((0, 1)).unwrap(), None);
        assert_eq!(
            terrain.terrain_at((0, 0)).unwrap(),
            Some(TerrainSample::new(0.3, Some(1.0)))
        );
        assert_eq!(
            terrain.terrain_at((1, 1)).unwrap(),
            Some(TerrainSample::new(0.3, None))
        );
        assert!(terrain.terrain_at((2, 0)).is_err());
    }
}
