//! Descriptive statistics over text lengths and other numeric samples

use serde::{Deserialize, Serialize};

/// Finite values of a sample in ascending order
struct SortedSample {
    values: Vec<f64>,
    missing: usize,
}

impl SortedSample {
    fn new(data: &[f64]) -> Self {
        let mut values: Vec<f64> = data.iter().copied().filter(|x| x.is_finite()).collect();
        values.sort_by(f64::total_cmp);
        Self {
            missing: data.len() - values.len(),
            values,
        }
    }
}

/// Moments and order statistics of a sample
///
/// Every statistic is NaN when no finite value is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryStats {
    pub count: usize,
    /// Non-finite values left out of every statistic
    pub missing: usize,
    pub mean: f64,
    /// Sample variance (n - 1); NaN for a single value, as data frames report it
    pub variance: f64,
    pub std_dev: f64,
    pub min: f64,
    pub median: f64,
    pub max: f64,
}

impl SummaryStats {
    pub fn from_data(data: &[f64]) -> Self {
        let sample = SortedSample::new(data);
        let values = &sample.values;

        // Welford's running mean and sum of squared deviations
        let (mut mean, mut m2) = (0.0, 0.0);
        for (i, &x) in values.iter().enumerate() {
            let delta = x - mean;
            mean += delta / (i + 1) as f64;
            m2 += delta * (x - mean);
        }

        let count = values.len();
        let variance = if count > 1 {
            m2 / (count - 1) as f64
        } else {
            f64::NAN
        };

        Self {
            count,
            missing: sample.missing,
            mean: if count == 0 { f64::NAN } else { mean },
            variance,
            std_dev: variance.sqrt(),
            min: values.first().copied().unwrap_or(f64::NAN),
            median: quantile_sorted(values, 0.5).unwrap_or(f64::NAN),
            max: values.last().copied().unwrap_or(f64::NAN),
        }
    }
}

/// Linearly interpolated quantile of ascending finite data
///
/// `None` for an empty slice or `q` outside `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let rank = q * (sorted.len() - 1) as f64;
    let below = sorted[rank.floor() as usize];
    let above = sorted[rank.ceil() as usize];
    Some(below + (above - below) * rank.fract())
}

/// Quantile of unsorted data, ignoring non-finite values
pub fn quantile(data: &[f64], q: f64) -> Option<f64> {
    quantile_sorted(&SortedSample::new(data).values, q)
}

/// Minimum, quartiles and maximum, as drawn in a box plot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FiveNumberSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl FiveNumberSummary {
    /// `None` when there are no finite values
    pub fn from_data(data: &[f64]) -> Option<Self> {
        let sample = SortedSample::new(data);
        let at = |q| quantile_sorted(&sample.values, q);
        Some(Self {
            min: at(0.0)?,
            q1: at(0.25)?,
            median: at(0.5)?,
            q3: at(0.75)?,
            max: at(1.0)?,
        })
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-10
    }

    #[test]
    fn test_summary_of_one_to_ten() {
        let data: Vec<f64> = (1..=10).map(f64::from).collect();
        let stats = SummaryStats::from_data(&data);

        assert_eq!(stats.count, 10);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 10.0);
        assert!(close(stats.mean, 5.5));
        assert!(close(stats.median, 5.5));
    }

    #[test]
    fn test_sample_variance_uses_n_minus_one() {
        let stats = SummaryStats::from_data(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        // Squared deviations sum to 32 over 8 values
        assert!(close(stats.variance, 32.0 / 7.0));
        assert!(close(stats.std_dev, (32.0f64 / 7.0).sqrt()));
    }

    #[test]
    fn test_non_finite_values_are_missing() {
        let stats = SummaryStats::from_data(&[1.0, 2.0, f64::NAN, 4.0, f64::INFINITY, 5.0]);
        assert_eq!(stats.count, 4);
        assert_eq!(stats.missing, 2);
        assert_eq!(stats.max, 5.0);
        assert!(close(stats.mean, 3.0));
    }

    #[test]
    fn test_empty_and_single_value() {
        let empty = SummaryStats::from_data(&[]);
        assert_eq!(empty.count, 0);
        assert!(empty.mean.is_nan());
        assert!(empty.median.is_nan());

        let single = SummaryStats::from_data(&[962.0]);
        assert_eq!(single.mean, 962.0);
        assert_eq!(single.median, 962.0);
        assert!(single.std_dev.is_nan());
    }

    #[test]
    fn test_quantile_interpolates() {
        let data = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(quantile(&data, 0.0), Some(1.0));
        assert_eq!(quantile(&data, 0.25), Some(1.75));
        assert_eq!(quantile(&data, 0.5), Some(2.5));
        assert_eq!(quantile(&data, 1.0), Some(4.0));
        assert_eq!(quantile(&data, 1.5), None);
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_five_number_summary() {
        let data: Vec<f64> = (1..=9).map(f64::from).collect();
        let summary = FiveNumberSummary::from_data(&data).unwrap();

        assert_eq!(
            summary,
            FiveNumberSummary {
                min: 1.0,
                q1: 3.0,
                median: 5.0,
                q3: 7.0,
                max: 9.0,
            }
        );
        assert_eq!(summary.iqr(), 4.0);
        assert!(FiveNumberSummary::from_data(&[f64::NAN]).is_none());
    }
}
