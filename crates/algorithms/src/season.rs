//! Harmonic season estimation and removal
//!
//! Fits an annual sinusoid per location over a baseline window,
//!
//! `value ≈ center + sin_coeff·sin(2πt) + cos_coeff·cos(2πt)`,
//!
//! with `t` in fractional years since [`SEASON_EPOCH`], then subtracts the
//! periodic part from the full series. `center` stays in the data so the
//! residual keeps the original decibel scale.

use sarcomp_core::{Masked, Observation, Timestamp, MILLIS_PER_DAY};
use std::f64::consts::TAU;

/// Reference epoch for the harmonic phase: 2010-01-01T00:00:00Z
pub const SEASON_EPOCH: Timestamp = 1_262_304_000_000;

/// Mean Julian year in milliseconds
pub const MILLIS_PER_YEAR: f64 = 365.25 * MILLIS_PER_DAY as f64;

/// Number of regressors (constant, sine, cosine)
const N_TERMS: usize = 3;

/// Fitted annual harmonic at one location
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonModel {
    pub center: f64,
    pub sin_coeff: f64,
    pub cos_coeff: f64,
}

impl SeasonModel {
    /// Periodic component at `timestamp` (excludes `center`)
    pub fn seasonal_component(&self, timestamp: Timestamp) -> f64 {
        let phase = TAU * fractional_years(timestamp);
        self.sin_coeff * phase.sin() + self.cos_coeff * phase.cos()
    }
}

/// Years elapsed since [`SEASON_EPOCH`]
pub fn fractional_years(timestamp: Timestamp) -> f64 {
    (timestamp - SEASON_EPOCH) as f64 / MILLIS_PER_YEAR
}

/// Least-squares harmonic fit over the valid observations of `baseline`.
///
/// `None` when fewer than three valid observations exist or the normal
/// equations are singular (e.g. all samples at the same phase).
pub fn fit_season(baseline: &[Observation]) -> Option<SeasonModel> {
    let mut xtx = [0.0f64; N_TERMS * N_TERMS];
    let mut xty = [0.0f64; N_TERMS];
    let mut n = 0usize;

    for obs in baseline {
        let Some(y) = obs.value.get() else { continue };
        let phase = TAU * fractional_years(obs.timestamp);
        let x = [1.0, phase.sin(), phase.cos()];
        for i in 0..N_TERMS {
            for j in 0..N_TERMS {
                xtx[i * N_TERMS + j] += x[i] * x[j];
            }
            xty[i] += x[i] * y;
        }
        n += 1;
    }

    if n < N_TERMS {
        return None;
    }

    let [center, sin_coeff, cos_coeff] = solve3(xtx, xty)?;
    Some(SeasonModel {
        center,
        sin_coeff,
        cos_coeff,
    })
}

/// Subtract the periodic component of `model` from every observation.
///
/// Timestamps, passes and masks are preserved. A masked model (`None`)
/// masks the whole series.
pub fn remove_season(series: &[Observation], model: Option<&SeasonModel>) -> Vec<Observation> {
    series
        .iter()
        .map(|obs| {
            let seasonal = Masked::from(model.map(|m| m.seasonal_component(obs.timestamp)));
            obs.with_value(obs.value - seasonal)
        })
        .collect()
}

/// Gaussian elimination with partial pivoting on a 3x3 system
fn solve3(mut mat: [f64; 9], mut rhs: [f64; 3]) -> Option<[f64; 3]> {
    // Pivots are compared against the matrix scale so that the singularity
    // test does not depend on how many samples were accumulated
    let scale = mat.iter().fold(0.0f64, |m, v| m.max(v.abs()));
    if scale == 0.0 {
        return None;
    }

    for col in 0..3 {
        let max_row = (col..3)
            .max_by(|&a, &b| mat[a * 3 + col].abs().total_cmp(&mat[b * 3 + col].abs()))
            .unwrap_or(col);
        if mat[max_row * 3 + col].abs() < 1e-12 * scale {
            return None;
        }
        if max_row != col {
            for j in 0..3 {
                mat.swap(col * 3 + j, max_row * 3 + j);
            }
            rhs.swap(col, max_row);
        }

        let pivot = mat[col * 3 + col];
        for row in (col + 1)..3 {
            let factor = mat[row * 3 + col] / pivot;
            mat[row * 3 + col] = 0.0;
            for j in (col + 1)..3 {
                mat[row * 3 + j] -= factor * mat[col * 3 + j];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut beta = [0.0f64; 3];
    for col in (0..3).rev() {
        let tail: f64 = ((col + 1)..3).map(|j| mat[col * 3 + j] * beta[j]).sum();
        beta[col] = (rhs[col] - tail) / mat[col * 3 + col];
    }
    beta.iter().all(|b| b.is_finite()).then_some(beta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sarcomp_core::Pass;

    /// Every 12 days over two years starting 2017-01-01
    fn harmonic_series(c: f64, a: f64, b: f64) -> Vec<Observation> {
        let start: Timestamp = 1_483_228_800_000;
        (0..61)
            .map(|i| {
                let t = start + i * 12 * MILLIS_PER_DAY;
                let phase = TAU * fractional_years(t);
                Observation::new(t, c + a * phase.sin() + b * phase.cos(), Pass::Descending)
            })
            .collect()
    }

    #[test]
    fn epoch_is_year_zero() {
        assert_eq!(fractional_years(SEASON_EPOCH), 0.0);
        let one_year = SEASON_EPOCH + (365.25 * MILLIS_PER_DAY as f64) as i64;
        assert_relative_eq!(fractional_years(one_year), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn recovers_noise_free_harmonic() {
        let series = harmonic_series(-11.0, 1.5, -0.75);
        let model = fit_season(&series).unwrap();
        assert_relative_eq!(model.center, -11.0, epsilon = 1e-8);
        assert_relative_eq!(model.sin_coeff, 1.5, epsilon = 1e-8);
        assert_relative_eq!(model.cos_coeff, -0.75, epsilon = 1e-8);
    }

    #[test]
    fn residual_is_flat_center() {
        let series = harmonic_series(-8.0, 2.0, 1.0);
        let model = fit_season(&series).unwrap();
        let residual = remove_season(&series, Some(&model));
        assert_eq!(residual.len(), series.len());
        for (r, o) in residual.iter().zip(&series) {
            assert_eq!(r.timestamp, o.timestamp);
            assert_relative_eq!(r.value.get().unwrap(), -8.0, epsilon = 1e-8);
        }
    }

    #[test]
    fn masked_observations_are_ignored_and_preserved() {
        let mut series = harmonic_series(-10.0, 1.0, 0.5);
        series[3] = series[3].masked();
        series[10] = series[10].with_value(Masked::new(500.0)).masked();
        let model = fit_season(&series).unwrap();
        assert_relative_eq!(model.center, -10.0, epsilon = 1e-8);
        let residual = remove_season(&series, Some(&model));
        assert!(!residual[3].is_valid());
        assert!(!residual[10].is_valid());
        assert!(residual[4].is_valid());
    }

    #[test]
    fn too_few_observations_masks_model() {
        let series = harmonic_series(-10.0, 1.0, 0.5);
        assert!(fit_season(&series[..2]).is_none());
        assert!(fit_season(&[]).is_none());
    }

    #[test]
    fn same_phase_samples_are_degenerate() {
        // Three acquisitions exactly one year apart share a phase
        let year = (365.25 * MILLIS_PER_DAY as f64) as i64;
        let series: Vec<_> = (0..3)
            .map(|i| Observation::new(SEASON_EPOCH + i * year, -10.0 + i as f64, Pass::Ascending))
            .collect();
        assert!(fit_season(&series).is_none());
    }

    #[test]
    fn masked_model_masks_series() {
        let series = harmonic_series(-10.0, 1.0, 0.5);
        let out = remove_season(&series, None);
        assert!(out.iter().all(|o| !o.is_valid()));
    }
}
