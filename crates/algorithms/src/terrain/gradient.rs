//! Slope and aspect from DEMs
//!
//! Horn's (1981) 3x3 finite differences give both quantities from one set
//! of gradients:
//! ```text
//! a b c
//! d e f
//! g h i
//! ```
//! dz/dx = ((c + 2f + i) - (a + 2d + g)) / (8 * cell_width)
//! dz/dy = ((g + 2h + i) - (a + 2b + c)) / (8 * cell_height)

use crate::maybe_rayon::*;
use sarcomp_core::raster::Raster;
use sarcomp_core::terrain::TerrainRaster;
use sarcomp_core::Result;
use std::f64::consts::PI;

/// Gradients below this magnitude are treated as flat
const FLAT_THRESHOLD: f64 = 1e-10;

/// Aspect value written for flat cells
pub(crate) const FLAT_ASPECT: f64 = -1.0;

/// Parameters for the terrain model
#[derive(Debug, Clone)]
pub struct TerrainParams {
    /// Multiplier converting horizontal units to elevation units
    /// (use ~111320 for lat/lon DEMs with elevations in meters)
    pub z_factor: f64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self { z_factor: 1.0 }
    }
}

/// Slope and aspect rasters, both in radians.
///
/// Aspect is measured clockwise from north (east = π/2). Flat cells get
/// slope 0 and aspect [`FLAT_ASPECT`]; border cells and cells touching
/// nodata are NaN in both rasters.
pub fn terrain_model(dem: &Raster<f64>, params: &TerrainParams) -> Result<TerrainRaster> {
    let (rows, cols) = dem.shape();
    let dx8 = 8.0 * dem.transform().cell_width() * params.z_factor;
    let dy8 = 8.0 * dem.transform().cell_height() * params.z_factor;

    let cells: Vec<(f64, f64)> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![(f64::NAN, f64::NAN); cols];
            if row == 0 || row + 1 == rows || cols < 3 {
                return row_data;
            }

            for (col, cell) in row_data.iter_mut().enumerate().take(cols - 1).skip(1) {
                let at = |r: usize, c: usize| {
                    let v = unsafe { dem.get_unchecked(r, c) };
                    (!dem.is_nodata(v)).then_some(v)
                };
                let window = [
                    at(row - 1, col - 1),
                    at(row - 1, col),
                    at(row - 1, col + 1),
                    at(row, col - 1),
                    at(row, col),
                    at(row, col + 1),
                    at(row + 1, col - 1),
                    at(row + 1, col),
                    at(row + 1, col + 1),
                ];
                let Some([a, b, c, d, _e, f, g, h, i]) = collect_window(window) else {
                    continue;
                };

                let dz_dx = ((c + 2.0 * f + i) - (a + 2.0 * d + g)) / dx8;
                let dz_dy = ((g + 2.0 * h + i) - (a + 2.0 * b + c)) / dy8;

                if dz_dx.abs() < FLAT_THRESHOLD && dz_dy.abs() < FLAT_THRESHOLD {
                    *cell = (0.0, FLAT_ASPECT);
                    continue;
                }

                let slope = dz_dx.hypot(dz_dy).atan();
                // Descent direction: east component -dz/dx, north component
                // +dz/dy because rows grow southward
                let mut aspect = (-dz_dx).atan2(dz_dy);
                if aspect < 0.0 {
                    aspect += 2.0 * PI;
                }
                *cell = (slope, aspect);
            }
            row_data
        })
        .collect();

    let (slope_data, aspect_data): (Vec<f64>, Vec<f64>) = cells.into_iter().unzip();
    let slope = dem.derive(slope_data, Some(f64::NAN))?;
    let aspect = dem.derive(aspect_data, Some(f64::NAN))?;
    TerrainRaster::new(slope, aspect)
}

fn collect_window(window: [Option<f64>; 9]) -> Option<[f64; 9]> {
    let mut out = [0.0; 9];
    for (slot, v) in out.iter_mut().zip(window) {
        *slot = v?;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sarcomp_core::terrain::TerrainLookup;
    use sarcomp_core::GeoTransform;

    fn dem_from(f: impl Fn(usize, usize) -> f64) -> Raster<f64> {
        let mut dem = Raster::new(10, 10);
        dem.set_transform(GeoTransform::new(0.0, 10.0, 1.0, -1.0));
        for row in 0..10 {
            for col in 0..10 {
                dem.set(row, col, f(row, col)).unwrap();
            }
        }
        dem
    }

    #[test]
    fn east_facing_plane() {
        // Elevation drops toward the east at 1 m per cell
        let dem = dem_from(|_, col| -(col as f64));
        let terrain = terrain_model(&dem, &TerrainParams::default()).unwrap();
        let sample = terrain.terrain_at((5, 5)).unwrap().unwrap();
        assert!((sample.slope_radians - 45f64.to_radians()).abs() < 1e-9);
        let aspect = sample.aspect_radians.unwrap();
        assert!((aspect.to_degrees() - 90.0).abs() < 1e-9, "aspect {}", aspect.to_degrees());
    }

    #[test]
    fn north_facing_plane() {
        // Higher in the south (high rows)
        let dem = dem_from(|row, _| row as f64);
        let terrain = terrain_model(&dem, &TerrainParams::default()).unwrap();
        let aspect = terrain.terrain_at((5, 5)).unwrap().unwrap().aspect_radians.unwrap();
        assert!(aspect.to_degrees() < 1e-6 || aspect.to_degrees() > 359.999);
    }

    #[test]
    fn flat_dem_has_no_aspect() {
        let dem = dem_from(|_, _| 100.0);
        let terrain = terrain_model(&dem, &TerrainParams::default()).unwrap();
        let sample = terrain.terrain_at((5, 5)).unwrap().unwrap();
        assert_eq!(sample.slope_radians, 0.0);
        assert_eq!(sample.aspect_radians, None);
    }

    #[test]
    fn border_and_nodata_are_undefined() {
        let mut dem = dem_from(|_, col| col as f64);
        dem.set(4, 4, f64::NAN).unwrap();
        let terrain = terrain_model(&dem, &TerrainParams::default()).unwrap();
        assert_eq!(terrain.terrain_at((0, 3)).unwrap(), None);
        assert_eq!(terrain.terrain_at((5, 9)).unwrap(), None);
        assert_eq!(terrain.terrain_at((5, 5)).unwrap(), None);
        assert!(terrain.terrain_at((7, 7)).unwrap().is_some());
    }
}
