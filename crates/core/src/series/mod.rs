//! Per-location observation series
//!
//! A location's series is the ordered list of backscatter observations
//! acquired over it. Series are never materialized for a whole raster: a
//! [`SeriesSource`] hands out one location at a time, already sorted by
//! strictly increasing timestamp.

mod observation;
mod stack;

pub use observation::{DateRange, Location, Observation, Pass, Polarization, Timestamp, MILLIS_PER_DAY};
pub use stack::{Scene, SceneStack};

use crate::error::{Error, Result};
use crate::raster::GeoTransform;

/// Source of per-location time series.
///
/// Implementations must return observations sorted by strictly increasing
/// timestamp and restricted to the half-open range `[range.start, range.end)`.
pub trait SeriesSource: Sync {
    /// Grid dimensions as (rows, cols)
    fn shape(&self) -> (usize, usize);

    /// Georeferencing of the grid, inherited by output bands
    fn transform(&self) -> GeoTransform {
        GeoTransform::default()
    }

    /// Observations at `location` within `range`
    fn select(&self, location: Location, range: DateRange) -> Result<Vec<Observation>>;
}

/// Verify that timestamps strictly increase
pub fn check_sorted(series: &[Observation]) -> Result<()> {
    for pair in series.windows(2) {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(Error::UnsortedSeries {
                previous: pair[0].timestamp,
                next: pair[1].timestamp,
            });
        }
    }
    Ok(())
}

/// Sub-slice of a sorted series falling inside `range`
pub fn within(series: &[Observation], range: DateRange) -> &[Observation] {
    let lo = series.partition_point(|o| o.timestamp < range.start);
    let hi = series.partition_point(|o| o.timestamp < range.end);
    &series[lo..hi.max(lo)]
}

/// Number of valid observations
pub fn valid_count(series: &[Observation]) -> usize {
    series.iter().filter(|o| o.is_valid()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(stamps: &[i64]) -> Vec<Observation> {
        stamps
            .iter()
            .map(|&t| Observation::new(t, -10.0, Pass::Ascending))
            .collect()
    }

    #[test]
    fn within_is_half_open() {
        let s = series(&[0, 10, 20, 30, 40]);
        let range = DateRange::new(10, 30).unwrap();
        let w = within(&s, range);
        let stamps: Vec<i64> = w.iter().map(|o| o.timestamp).collect();
        assert_eq!(stamps, vec![10, 20]);
    }

    #[test]
    fn within_empty_when_outside() {
        let s = series(&[0, 10, 20]);
        let range = DateRange::new(100, 200).unwrap();
        assert!(within(&s, range).is_empty());
    }

    #[test]
    fn check_sorted_rejects_duplicates() {
        assert!(check_sorted(&series(&[0, 5, 9])).is_ok());
        assert!(matches!(
            check_sorted(&series(&[0, 5, 5])),
            Err(Error::UnsortedSeries { previous: 5, next: 5 })
        ));
    }

    #[test]
    fn valid_count_skips_masked() {
        let mut s = series(&[0, 1, 2]);
        s[1] = s[1].masked();
        assert_eq!(valid_count(&s), 2);
    }
}
