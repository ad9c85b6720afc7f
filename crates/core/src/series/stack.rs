//! In-memory raster stack acting as a series source

use super::{DateRange, Location, Observation, Pass, SeriesSource, Timestamp};
use crate::error::{Error, Result};
use crate::mask::Masked;
use crate::raster::{GeoTransform, Raster};

/// One acquisition: a single-band backscatter raster with its metadata
#[derive(Debug, Clone)]
pub struct Scene {
    pub timestamp: Timestamp,
    pub pass: Pass,
    /// Calibrated sigma0 in dB; nodata cells are masked observations
    pub band: Raster<f64>,
}

/// Scenes of identical shape ordered by acquisition time.
#[derive(Debug, Clone)]
pub struct SceneStack {
    scenes: Vec<Scene>,
    shape: (usize, usize),
}

impl SceneStack {
    /// Build a stack, sorting scenes by timestamp.
    ///
    /// Fails when the stack is empty, shapes disagree, or two scenes share a
    /// timestamp (a location's series must strictly increase in time).
    pub fn new(mut scenes: Vec<Scene>) -> Result<Self> {
        let first = scenes
            .first()
            .ok_or_else(|| Error::Other("scene stack is empty".into()))?;
        let shape = first.band.shape();

        for scene in &scenes {
            let (ar, ac) = scene.band.shape();
            if (ar, ac) != shape {
                return Err(Error::SizeMismatch {
                    er: shape.0,
                    ec: shape.1,
                    ar,
                    ac,
                });
            }
        }

        scenes.sort_by_key(|s| s.timestamp);
        for pair in scenes.windows(2) {
            if pair[1].timestamp == pair[0].timestamp {
                return Err(Error::UnsortedSeries {
                    previous: pair[0].timestamp,
                    next: pair[1].timestamp,
                });
            }
        }

        Ok(Self { scenes, shape })
    }

    /// Scenes in acquisition order
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// Number of scenes
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    /// Whether the stack holds no scenes
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Time span covered, `[first, last]`
    pub fn span(&self) -> Option<(Timestamp, Timestamp)> {
        Some((self.scenes.first()?.timestamp, self.scenes.last()?.timestamp))
    }

    /// Metadata template for output rasters
    pub fn template(&self) -> &Raster<f64> {
        &self.scenes[0].band
    }
}

impl SeriesSource for SceneStack {
    fn shape(&self) -> (usize, usize) {
        self.shape
    }

    fn transform(&self) -> GeoTransform {
        *self.template().transform()
    }

    fn select(&self, location: Location, range: DateRange) -> Result<Vec<Observation>> {
        let (row, col) = location;
        if row >= self.shape.0 || col >= self.shape.1 {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.shape.0,
                cols: self.shape.1,
            });
        }

        let lo = self.scenes.partition_point(|s| s.timestamp < range.start);
        let hi = self.scenes.partition_point(|s| s.timestamp < range.end);

        Ok(self.scenes[lo..hi]
            .iter()
            .map(|scene| {
                let raw = unsafe { scene.band.get_unchecked(row, col) };
                let value = if scene.band.is_nodata(raw) {
                    Masked::MASKED
                } else {
                    Masked::new(raw)
                };
                Observation {
                    timestamp: scene.timestamp,
                    value,
                    pass: scene.pass,
                }
            })
            .collect())
    }
}
