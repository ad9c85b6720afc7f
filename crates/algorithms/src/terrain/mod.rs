//! Terrain model for pass selection
//!
//! Derives, from an elevation model:
//! - Slope and aspect (Horn 1981, single pass)
//! - East-west facing slope, the relief component seen differently by
//!   ascending and descending passes

mod ew_slope;
mod gradient;

pub use ew_slope::{ew_slope, EwSlope};
pub use gradient::{terrain_model, TerrainParams};
