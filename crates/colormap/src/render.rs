//! Three-band raster to RGBA rendering.

use crate::hsv::to_byte;
use sarcomp_core::raster::Raster;
use sarcomp_core::{Error, Polarization, Result};

/// Per-channel linear stretch: `min` maps to 0 and `max` to 255.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stretch {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Stretch {
    /// Bands already in `[0, 1]` (spike colours)
    pub const UNIT: Stretch = Stretch {
        min: [0.0; 3],
        max: [1.0; 3],
    };

    /// Decibel stretch for before/after/r_squared composites
    pub fn for_polarization(polarization: Polarization) -> Self {
        match polarization {
            Polarization::VV => Stretch {
                min: [-20.0, -20.0, 0.0],
                max: [0.0, 0.0, 1.0],
            },
            Polarization::VH => Stretch {
                min: [-30.0, -30.0, 0.0],
                max: [0.0, 0.0, 1.0],
            },
        }
    }
}

/// Convert three bands to an RGBA pixel buffer.
///
/// Returns `rows * cols * 4` bytes in row-major order. A pixel that is
/// nodata in any band is fully transparent.
pub fn composite_to_rgba(bands: [&Raster<f64>; 3], stretch: &Stretch) -> Result<Vec<u8>> {
    let shape = bands[0].shape();
    for band in &bands[1..] {
        if band.shape() != shape {
            return Err(Error::SizeMismatch {
                er: shape.0,
                ec: shape.1,
                ar: band.rows(),
                ac: band.cols(),
            });
        }
    }

    let mut rgba = vec![0u8; shape.0 * shape.1 * 4];
    let pixels = bands[0]
        .data()
        .iter()
        .zip(bands[1].data().iter())
        .zip(bands[2].data().iter());
    for (pixel, ((&r, &g), &b)) in rgba.chunks_exact_mut(4).zip(pixels) {
        let values = [r, g, b];
        if values
            .iter()
            .zip(&bands)
            .any(|(&v, band)| !v.is_finite() || band.is_nodata(v))
        {
            continue;
        }
        for c in 0..3 {
            let range = stretch.max[c] - stretch.min[c];
            let t = if range.abs() > f64::EPSILON {
                (values[c] - stretch.min[c]) / range
            } else {
                0.0
            };
            pixel[c] = to_byte(t);
        }
        pixel[3] = 255;
    }

    Ok(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vv_stretch() {
        let before = Raster::from_vec(vec![-20.0, -10.0, 0.0, f64::NAN], 2, 2).unwrap();
        let after = Raster::from_vec(vec![0.0, -25.0, 5.0, -10.0], 2, 2).unwrap();
        let r2 = Raster::from_vec(vec![0.5, 1.0, 0.0, 0.5], 2, 2).unwrap();
        let rgba = composite_to_rgba([&before, &after, &r2], &Stretch::for_polarization(Polarization::VV)).unwrap();

        assert_eq!(rgba.len(), 16);
        assert_eq!(&rgba[0..4], &[0, 255, 128, 255]);
        assert_eq!(&rgba[4..8], &[128, 0, 255, 255]);
        assert_eq!(&rgba[8..12], &[255, 255, 0, 255]);
        // NaN in one band -> transparent
        assert_eq!(&rgba[12..16], &[0, 0, 0, 0]);
    }

    #[test]
    fn vh_range_is_wider() {
        let s = Stretch::for_polarization(Polarization::VH);
        assert_eq!(s.min, [-30.0, -30.0, 0.0]);
        assert_eq!(s.max, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn nodata_value_is_transparent() {
        let mut red = Raster::filled(1, 2, 0.5);
        red.set_nodata(Some(-1.0));
        red.set(0, 1, -1.0).unwrap();
        let other = Raster::filled(1, 2, 0.5);
        let rgba = composite_to_rgba([&red, &other, &other], &Stretch::UNIT).unwrap();
        assert_eq!(&rgba[0..4], &[128, 128, 128, 255]);
        assert_eq!(rgba[7], 0);
    }

    #[test]
    fn mismatched_bands_fail() {
        let a = Raster::filled(2, 2, 0.0);
        let b = Raster::filled(2, 3, 0.0);
        assert!(composite_to_rgba([&a, &b, &a], &Stretch::UNIT).is_err());
    }
}
