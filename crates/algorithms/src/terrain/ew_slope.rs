//! East-west facing slope
//!
//! A side-looking radar sees a slope facing its look direction foreshortened
//! and the opposite slope stretched or shadowed. Ascending and descending
//! passes look in roughly opposite east-west directions, so the component of
//! slope along the east-west axis decides which pass views a surface more
//! directly:
//!
//! `ew_slope = atan(tan(slope) * sin(aspect))`, in degrees, positive when
//! the surface faces east.

use super::gradient::{terrain_model, TerrainParams};
use crate::maybe_rayon::*;
use sarcomp_core::raster::Raster;
use sarcomp_core::terrain::{TerrainLookup, TerrainRaster};
use sarcomp_core::{Algorithm, Error, Result};

/// East-west slope algorithm (DEM in, degrees out)
#[derive(Debug, Clone, Default)]
pub struct EwSlope;

impl Algorithm for EwSlope {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = TerrainParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "East-West Slope"
    }

    fn description(&self) -> &'static str {
        "East-west facing slope component in degrees, positive toward the east"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let terrain = terrain_model(&input, &params)?;
        ew_slope(&terrain)
    }
}

/// East-west slope raster in degrees.
///
/// Flat cells are exactly 0; cells with undefined terrain are NaN.
pub fn ew_slope(terrain: &TerrainRaster) -> Result<Raster<f64>> {
    let (rows, cols) = terrain.shape();

    let data = (0..rows)
        .into_par_iter()
        .map(|row| {
            (0..cols)
                .map(|col| {
                    Ok(terrain
                        .terrain_at((row, col))?
                        .map_or(f64::NAN, |sample| sample.ew_slope_degrees()))
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    terrain
        .slope()
        .derive(data.into_iter().flatten().collect(), Some(f64::NAN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sarcomp_core::GeoTransform;

    fn plane(dx: f64, dy: f64) -> Raster<f64> {
        let mut dem = Raster::new(8, 8);
        dem.set_transform(GeoTransform::new(0.0, 8.0, 1.0, -1.0));
        for row in 0..8 {
            for col in 0..8 {
                dem.set(row, col, dx * col as f64 + dy * row as f64).unwrap();
            }
        }
        dem
    }

    #[test]
    fn east_facing_plane_is_positive() {
        // 45 degree slope descending toward the east
        let out = EwSlope.execute_default(plane(-1.0, 0.0)).unwrap();
        assert!((out.get(4, 4).unwrap() - 45.0).abs() < 1e-9);
    }

    #[test]
    fn west_facing_plane_is_negative() {
        let out = EwSlope.execute_default(plane(1.0, 0.0)).unwrap();
        assert!((out.get(4, 4).unwrap() + 45.0).abs() < 1e-9);
    }

    #[test]
    fn north_south_plane_has_no_ew_component() {
        let out = EwSlope.execute_default(plane(0.0, 1.0)).unwrap();
        assert!(out.get(4, 4).unwrap().abs() < 1e-9);
    }

    #[test]
    fn flat_is_zero_and_border_is_nan() {
        let out = EwSlope.execute_default(plane(0.0, 0.0)).unwrap();
        assert_eq!(out.get(4, 4).unwrap(), 0.0);
        assert!(out.get(0, 0).unwrap().is_nan());
        assert_eq!(EwSlope.name(), "East-West Slope");
    }
}
