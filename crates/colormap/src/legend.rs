//! Date legend for the spike colour composite.
//!
//! Spike hue runs from red at the window start through the colour wheel
//! toward magenta, reaching 1/1.2 of the wheel at the window end. The
//! legend samples six evenly spaced dates with the colour each would get at
//! full saturation and brightness.

use crate::hsv::{hsv_to_rgb, Rgb};
use sarcomp_core::{DateRange, Timestamp};
use serde::Serialize;

/// Fraction of the hue wheel spanned by the window
pub const HUE_SPAN: f64 = 1.0 / 1.2;

/// Number of legend entries
pub const LEGEND_STEPS: usize = 6;

/// Swatch colour names
const COLOR_NAMES: [&str; LEGEND_STEPS] = ["red", "yellow", "green", "cyan", "blue", "magenta"];

/// Label colours readable on each legend swatch
const TEXT_COLORS: [Rgb; LEGEND_STEPS] = [
    Rgb::WHITE,
    Rgb::BLACK,
    Rgb::WHITE,
    Rgb::BLACK,
    Rgb::WHITE,
    Rgb::WHITE,
];

/// One legend swatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub timestamp: Timestamp,
    pub name: &'static str,
    pub color: Rgb,
    pub text_color: Rgb,
}

/// Hue of a spike at `timestamp`, in `[0, 1)`
pub fn spike_hue(timestamp: Timestamp, window: DateRange) -> f64 {
    let elapsed = (timestamp - window.start) as f64 / window.duration() as f64;
    (elapsed * HUE_SPAN).clamp(0.0, 1.0 - f64::EPSILON)
}

/// Six entries at `start + i·(end − start)/5`
pub fn spike_legend(window: DateRange) -> Vec<LegendEntry> {
    let last = (LEGEND_STEPS - 1) as i64;
    (0..LEGEND_STEPS)
        .map(|i| {
            let timestamp = window.start + i as i64 * window.duration() / last;
            let hue = spike_hue(timestamp, window);
            LegendEntry {
                timestamp,
                name: COLOR_NAMES[i],
                color: Rgb::from_unit(hsv_to_rgb(hue, 1.0, 1.0)),
                text_color: TEXT_COLORS[i],
            }
        })
        .collect()
}
