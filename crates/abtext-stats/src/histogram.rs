//! Histogram binning
//!
//! Equal-width bins over the data range, or caller-supplied edges.
//! Bins are half-open `[lo, hi)` except the last, which is closed.

use serde::{Deserialize, Serialize};

/// Binned counts of a numeric sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// Bin edges, `counts.len() + 1` of them
    pub edges: Vec<f64>,
    /// Count per bin
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Build an equal-width histogram with `bins` bins over [min, max]
    ///
    /// Non-finite values are ignored. A constant sample gets a single
    /// unit-width bin around the value.
    pub fn from_data(data: &[f64], bins: usize) -> Self {
        let bins = bins.max(1);
        let finite = data.iter().copied().filter(|x| x.is_finite());
        let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
            (lo.min(x), hi.max(x))
        });

        if !min.is_finite() {
            return Self {
                edges: Vec::new(),
                counts: Vec::new(),
            };
        }

        let (min, max, bins) = if min == max {
            (min - 0.5, max + 0.5, 1)
        } else {
            (min, max, bins)
        };

        let width = (max - min) / bins as f64;
        let mut edges: Vec<f64> = (0..bins).map(|i| min + width * i as f64).collect();
        edges.push(max);

        Self::with_edges(data, edges)
    }

    /// Count values into the given ascending edges
    ///
    /// Values outside [first, last] are dropped.
    pub fn with_edges(data: &[f64], edges: Vec<f64>) -> Self {
        let mut histogram = Self {
            counts: vec![0; edges.len().saturating_sub(1)],
            edges,
        };

        for &x in data {
            if let Some(bin) = histogram.bin_index(x) {
                histogram.counts[bin] += 1;
            }
        }

        histogram
    }

    /// Index of the bin containing `x`
    pub fn bin_index(&self, x: f64) -> Option<usize> {
        let bins = self.counts.len();
        if bins == 0 || !x.is_finite() {
            return None;
        }

        let last = self.edges[bins];
        if x < self.edges[0] || x > last {
            return None;
        }
        if x == last {
            return Some(bins - 1);
        }

        // partition_point gives the first edge strictly greater than x
        let upper = self.edges.partition_point(|&edge| edge <= x);
        Some(upper.saturating_sub(1).min(bins - 1))
    }

    /// Number of bins
    pub fn num_bins(&self) -> usize {
        self.counts.len()
    }

    /// Total counted values
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Midpoint of each bin
    pub fn centers(&self) -> Vec<f64> {
        self.edges
            .windows(2)
            .map(|pair| (pair[0] + pair[1]) / 2.0)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_width_bins() {
        let data = vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let histogram = Histogram::from_data(&data, 5);

        assert_eq!(histogram.num_bins(), 5);
        assert_eq!(histogram.edges, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        // Last bin is closed, so 10.0 lands in it
        assert_eq!(histogram.counts, vec![2, 2, 2, 2, 3]);
        assert_eq!(histogram.total(), data.len());
    }

    #[test]
    fn test_custom_edges_drop_outliers() {
        let histogram = Histogram::with_edges(&[-1.0, 0.0, 499.0, 500.0, 900.0], vec![0.0, 500.0, 800.0]);
        assert_eq!(histogram.counts, vec![2, 1]);
        assert_eq!(histogram.centers(), vec![250.0, 650.0]);
    }

    #[test]
    fn test_constant_and_empty_samples() {
        let constant = Histogram::from_data(&[3.0, 3.0], 10);
        assert_eq!(constant.counts, vec![2]);

        let empty = Histogram::from_data(&[f64::NAN], 10);
        assert_eq!(empty.num_bins(), 0);
        assert_eq!(empty.bin_index(1.0), None);
    }
}
