//! Linear trend over a monitoring window
//!
//! Weighted least squares of value against time. Time is measured as the
//! fraction of the window elapsed, `x = (t - start) / (end - start)`, so the
//! intercept is the level at the window start and `intercept + slope` the
//! level at its end.

use crate::season::MILLIS_PER_YEAR;
use sarcomp_core::{DateRange, Error, Masked, Observation, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Observation weighting for the trend fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Weighting {
    /// Ordinary least squares
    #[default]
    None,
    /// Weight grows linearly from 0 at the window start to 1 at its end
    LinearRamp,
}

impl Weighting {
    fn weight(self, x: f64) -> f64 {
        match self {
            Weighting::None => 1.0,
            Weighting::LinearRamp => x,
        }
    }
}

impl FromStr for Weighting {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "ols" => Ok(Weighting::None),
            "linear" | "linear-ramp" | "linear_ramp" | "ramp" => Ok(Weighting::LinearRamp),
            _ => Err(Error::invalid_parameter(
                "weighting",
                s,
                "expected none or linear",
            )),
        }
    }
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weighting::None => f.write_str("none"),
            Weighting::LinearRamp => f.write_str("linear"),
        }
    }
}

/// Fitted line over one window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendFit {
    pub level_at_start: f64,
    pub level_at_end: f64,
    /// Weighted coefficient of determination; masked for a constant series
    pub r_squared: Masked,
    /// Valid observations with positive weight
    pub count: usize,
    /// Change in decibels per year
    pub slope_per_year: f64,
}

/// Fit a line to the valid observations of `series` inside `window`.
///
/// `None` when fewer than two observations with positive weight exist.
pub fn fit_trend(series: &[Observation], window: DateRange, weighting: Weighting) -> Option<TrendFit> {
    let span = window.duration() as f64;
    let points: Vec<(f64, f64, f64)> = series
        .iter()
        .filter(|o| window.contains(o.timestamp))
        .filter_map(|o| {
            let y = o.value.get()?;
            let x = (o.timestamp - window.start) as f64 / span;
            let w = weighting.weight(x);
            (w > 0.0).then_some((x, y, w))
        })
        .collect();

    if points.len() < 2 {
        return None;
    }

    let sum_w: f64 = points.iter().map(|p| p.2).sum();
    let x_mean = points.iter().map(|&(x, _, w)| w * x).sum::<f64>() / sum_w;
    let y_mean = points.iter().map(|&(_, y, w)| w * y).sum::<f64>() / sum_w;

    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for &(x, y, w) in &points {
        let (dx, dy) = (x - x_mean, y - y_mean);
        sxx += w * dx * dx;
        sxy += w * dx * dy;
        syy += w * dy * dy;
    }
    // Coincident timestamps
    if sxx <= 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;
    let residual: f64 = points
        .iter()
        .map(|&(x, y, w)| w * (y - intercept - slope * x).powi(2))
        .sum();

    Some(TrendFit {
        level_at_start: intercept,
        level_at_end: intercept + slope,
        r_squared: -Masked::new(residual) / syy + 1.0,
        count: points.len(),
        slope_per_year: slope * MILLIS_PER_YEAR / span,
    })
}
