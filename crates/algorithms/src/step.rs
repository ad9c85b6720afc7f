//! Step-function change detection
//!
//! Fits, per location, a function that is constant before an unknown
//! instant and constant (at another level) after it. The instant is chosen
//! among the timestamps of a candidate series by minimizing the pooled
//! squared error of the two constant segments:
//!
//! `goodness(t) = -(var_left·n_left + var_right·n_right)`
//!
//! where the left segment is the reference series strictly before `t` and
//! the right segment is the candidate series from `t` onward. Candidates
//! whose right segment has `n_right <= min_obs` observations are rejected.
//!
//! Running statistics make the search linear: one reverse pass over the
//! candidates builds the right-segment statistics for every breakpoint, and
//! one forward sweep grows the left segment from the reference series.

use crate::stats::RunningStats;
use sarcomp_core::{Masked, Observation, Timestamp};

/// Default minimum number of observations required after a breakpoint
pub const DEFAULT_MIN_OBS: usize = 3;

/// Best single-breakpoint fit at one location
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepFit {
    /// First timestamp of the right segment
    pub breakpoint: Timestamp,
    /// Mean of the reference series before the breakpoint
    pub left_level: f64,
    /// Mean of the candidate series from the breakpoint on
    pub right_level: f64,
    /// `1 - SSE / SST` with SST over the whole reference series; masked when
    /// the reference series has no variance
    pub r_squared: Masked,
    pub left_count: usize,
    pub right_count: usize,
    /// Valid observations in the reference series
    pub reference_count: usize,
    /// Valid observations in the candidate series
    pub candidate_count: usize,
    /// Pooled squared error of the two segments (`-goodness`)
    pub squared_error: f64,
}

/// Find the best breakpoint.
///
/// * `reference` - series supplying the left segment (typically full history)
/// * `candidates` - series supplying breakpoints and the right segment
/// * `min_obs` - a breakpoint needs more than this many right observations
///
/// Both series must be sorted by strictly increasing timestamp. Every
/// candidate timestamp is a breakpoint, masked ones included: a masked
/// candidate contributes its instant but no value. A breakpoint with an
/// empty left segment is not a step. Ties go to the earliest breakpoint.
///
/// Returns `None` (masked) when either series has no valid observation or
/// no breakpoint satisfies the constraints.
pub fn fit_step(reference: &[Observation], candidates: &[Observation], min_obs: usize) -> Option<StepFit> {
    let total = RunningStats::from_series(reference);
    if total.count() == 0 {
        return None;
    }

    // right[i] summarizes the valid values of candidates[i..]
    let mut right = vec![RunningStats::new(); candidates.len() + 1];
    for i in (0..candidates.len()).rev() {
        right[i] = right[i + 1];
        right[i].push_observation(&candidates[i]);
    }
    let candidate_count = right[0].count();
    if candidate_count == 0 {
        return None;
    }

    let mut left = RunningStats::new();
    let mut next_ref = 0;
    let mut best: Option<(f64, usize, RunningStats)> = None;

    for (i, t) in candidates.iter().map(|o| o.timestamp).enumerate() {
        while let Some(obs) = reference.get(next_ref).filter(|o| o.timestamp < t) {
            left.push_observation(obs);
            next_ref += 1;
        }

        let tail = &right[i];
        if left.count() == 0 || tail.count() <= min_obs {
            continue;
        }

        let squared_error = left.squared_error() + tail.squared_error();
        // Strictly smaller error wins, so equal scores keep the earlier breakpoint
        if best.is_none_or(|(err, _, _)| squared_error < err) {
            best = Some((squared_error, i, left));
        }
    }

    let (squared_error, i, left) = best?;
    let tail = right[i];
    Some(StepFit {
        breakpoint: candidates[i].timestamp,
        left_level: left.mean()?,
        right_level: tail.mean()?,
        r_squared: -Masked::new(squared_error) / total.squared_error() + 1.0,
        left_count: left.count(),
        right_count: tail.count(),
        reference_count: total.count(),
        candidate_count,
        squared_error,
    })
}
