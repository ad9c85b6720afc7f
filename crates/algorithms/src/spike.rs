//! Spike detection
//!
//! Finds the strongest backscatter peak in a monitoring window and measures
//! it against the window's median. The result is encoded as a colour: hue
//! gives the date of the spike, saturation its strength, and brightness the
//! baseline level.

use crate::stats::median;
use sarcomp_colormap::{hsv_to_rgb, spike_hue};
use sarcomp_core::{DateRange, Masked, Observation, Timestamp};

/// Saturation reaches 1 at this linear power ratio (10 dB)
const FULL_SATURATION_RATIO: f64 = 10.0;

/// Baseline (dB) shown at full brightness; -20 dB and below is black
const BRIGHTNESS_FLOOR_DB: f64 = -20.0;

/// Strongest observation in a window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeFit {
    pub spike_timestamp: Timestamp,
    pub spike_value: f64,
    /// Median of the valid values in the window
    pub baseline: f64,
    /// Linear power ratio `10^((spike - baseline) / 10)`; masked when it
    /// overflows
    pub ratio: Masked,
}

impl SpikeFit {
    /// Saturation component in `[0, 1]`
    pub fn saturation(&self) -> f64 {
        // The spike is never below the median, so a masked ratio overflowed
        ((self.ratio - 1.0) / (FULL_SATURATION_RATIO - 1.0))
            .clamp(0.0, 1.0)
            .unwrap_or(1.0)
    }

    /// Brightness component in `[0, 1]`
    pub fn brightness(&self) -> f64 {
        ((self.baseline - BRIGHTNESS_FLOOR_DB) / -BRIGHTNESS_FLOOR_DB).clamp(0.0, 1.0)
    }

    /// RGB encoding in `[0, 1]` relative to the monitoring `window`
    pub fn color(&self, window: DateRange) -> [f64; 3] {
        hsv_to_rgb(
            spike_hue(self.spike_timestamp, window),
            self.saturation(),
            self.brightness(),
        )
    }
}

/// Locate the maximum valid value of `series` inside `window`.
///
/// Ties go to the latest timestamp. `None` when the window has no valid
/// observation.
pub fn find_spike(series: &[Observation], window: DateRange) -> Option<SpikeFit> {
    let in_window: Vec<Observation> = series
        .iter()
        .filter(|o| window.contains(o.timestamp))
        .copied()
        .collect();

    let (spike_timestamp, spike_value) = in_window
        .iter()
        .filter_map(|o| o.value.get().map(|v| (o.timestamp, v)))
        .fold(None, |best: Option<(Timestamp, f64)>, (t, v)| match best {
            Some((_, bv)) if v < bv => best,
            _ => Some((t, v)),
        })?;

    let baseline = median(&in_window)?;
    Some(SpikeFit {
        spike_timestamp,
        spike_value,
        baseline,
        ratio: Masked::new(10f64.powf((spike_value - baseline) / 10.0)),
    })
}
