//! Streaming summary statistics shared by the detectors

use sarcomp_core::Observation;

/// Count, mean and sum of squared deviations, updated one value at a time
/// (Welford). Population variance is `m2 / count`, so `variance * count`
/// is the squared error of a constant fit at the mean.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStats {
    count: usize,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statistics of the valid values in `series`
    pub fn from_series(series: &[Observation]) -> Self {
        let mut stats = Self::new();
        for obs in series {
            stats.push_observation(obs);
        }
        stats
    }

    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// Push the observation's value if it is valid
    pub fn push_observation(&mut self, obs: &Observation) {
        if let Some(v) = obs.value.get() {
            self.push(v);
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Mean, `None` when empty
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// Population variance, `None` when empty
    pub fn variance(&self) -> Option<f64> {
        (self.count > 0).then(|| self.m2 / self.count as f64)
    }

    /// Sum of squared deviations from the mean (`variance * count`)
    pub fn squared_error(&self) -> f64 {
        self.m2
    }
}

/// Median of the valid values; the mean of the two middle values when the
/// count is even.
pub fn median(series: &[Observation]) -> Option<f64> {
    let mut values: Vec<f64> = series.iter().filter_map(|o| o.value.get()).collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sarcomp_core::Pass;

    fn obs(values: &[f64]) -> Vec<Observation> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| Observation::new(i as i64, v, Pass::Ascending))
            .collect()
    }

    #[test]
    fn running_stats_match_two_pass() {
        let values = [-12.0, -10.5, -11.0, -9.0, -13.5, -10.0];
        let stats = RunningStats::from_series(&obs(&values));
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        assert_eq!(stats.count(), 6);
        assert_relative_eq!(stats.mean().unwrap(), mean, epsilon = 1e-12);
        assert_relative_eq!(stats.variance().unwrap(), var, epsilon = 1e-12);
        assert_relative_eq!(stats.squared_error(), var * n, epsilon = 1e-12);
    }

    #[test]
    fn constant_values_have_exactly_zero_variance() {
        let stats = RunningStats::from_series(&obs(&[5.0; 10]));
        assert_eq!(stats.variance(), Some(0.0));
    }

    #[test]
    fn empty_stats_are_undefined() {
        let stats = RunningStats::new();
        assert_eq!(stats.mean(), None);
        assert_eq!(stats.variance(), None);
    }

    #[test]
    fn masked_values_are_skipped() {
        let mut series = obs(&[1.0, 100.0, 3.0]);
        series[1] = series[1].masked();
        let stats = RunningStats::from_series(&series);
        assert_eq!(stats.count(), 2);
        assert_eq!(stats.mean(), Some(2.0));
        assert_eq!(median(&series), Some(2.0));
    }

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&obs(&[3.0, 1.0, 2.0])), Some(2.0));
        assert_eq!(median(&obs(&[4.0, 1.0, 3.0, 2.0])), Some(2.5));
        assert_eq!(median(&[]), None);
    }
}
