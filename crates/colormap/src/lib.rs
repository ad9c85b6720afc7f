//! # SarComp Colormap
//!
//! Colour encoding and raster-to-RGBA rendering for SarComp composites.
//!
//! - [`hsv_to_rgb`]: the HSV model behind the spike-date composite
//! - [`spike_legend`]: date swatches matching the spike hue ramp
//! - [`composite_to_rgba`]: per-channel stretch of three bands into an RGBA
//!   buffer, with the usual VV/VH decibel ranges in [`Stretch`]
//!
//! ## Usage
//!
//! ```ignore
//! use sarcomp_colormap::{composite_to_rgba, Stretch};
//!
//! let stretch = Stretch::for_polarization(Polarization::VV);
//! let rgba = composite_to_rgba([&before, &after, &r_squared], &stretch)?;
//! ```

mod hsv;
mod legend;
mod render;

pub use hsv::{hsv_to_rgb, Rgb};
pub use legend::{spike_hue, spike_legend, LegendEntry, HUE_SPAN, LEGEND_STEPS};
pub use render::{composite_to_rgba, Stretch};
