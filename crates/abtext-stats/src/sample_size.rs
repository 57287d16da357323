//! Sample size for comparing two proportions
//!
//! Per-group size needed to detect a change from baseline rate `p1` to
//! target rate `p2` with a two-sided test:
//!
//! ```text
//! n = 2 * ((z_{1-a/2} * sqrt(2 p (1 - p)) + z_power * sqrt(p1 q1 + p2 q2)) / (p2 - p1))^2
//! ```
//!
//! where `p` is the mean of the two rates. The leading factor of 2 makes
//! this a conservative figure, roughly double the textbook per-group size.

use serde::{Deserialize, Serialize};

use crate::error::{check_open_unit, StatsError, StatsResult};
use crate::normal;

/// Inputs to the sample size formula
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleSizeParams {
    /// Two-sided significance level
    pub alpha: f64,
    /// Desired power (1 - beta)
    pub power: f64,
}

impl Default for SampleSizeParams {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            power: 0.8,
        }
    }
}

/// Required per-group sample size, rounded up
pub fn required_sample_size(p1: f64, p2: f64, params: &SampleSizeParams) -> StatsResult<u64> {
    let p1 = check_open_unit("baseline rate", p1)?;
    let p2 = check_open_unit("target rate", p2)?;
    check_open_unit("power", params.power)?;

    if p1 == p2 {
        return Err(StatsError::ZeroEffect(p1));
    }

    let z_alpha = normal::two_sided_critical(params.alpha)?;
    let z_beta = normal::ppf(params.power)?;

    let p_avg = (p1 + p2) / 2.0;
    let numerator = z_alpha * (2.0 * p_avg * (1.0 - p_avg)).sqrt()
        + z_beta * (p1 * (1.0 - p1) + p2 * (1.0 - p2)).sqrt();
    let n = 2.0 * (numerator / (p2 - p1)).powi(2);

    Ok(n.ceil() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_value() {
        let n = required_sample_size(0.5, 0.6, &SampleSizeParams::default()).unwrap();
        assert_eq!(n, 775);
    }

    #[test]
    fn test_decreases_with_effect_size() {
        let params = SampleSizeParams::default();
        let baseline = 0.8486;
        let sizes: Vec<u64> = [0.01, 0.02, 0.03, 0.05]
            .iter()
            .map(|effect| required_sample_size(baseline, baseline + effect, &params).unwrap())
            .collect();

        assert!(sizes.windows(2).all(|pair| pair[0] > pair[1]), "{:?}", sizes);
        assert_eq!(sizes, vec![39_232, 9_527, 4_107, 1_385]);
    }

    #[test]
    fn test_more_power_needs_more_samples() {
        let low = required_sample_size(0.85, 0.87, &SampleSizeParams { alpha: 0.05, power: 0.8 });
        let high = required_sample_size(0.85, 0.87, &SampleSizeParams { alpha: 0.05, power: 0.9 });
        assert!(high.unwrap() > low.unwrap());
    }

    #[test]
    fn test_invalid_inputs() {
        let params = SampleSizeParams::default();
        assert_eq!(
            required_sample_size(0.8, 0.8, &params),
            Err(StatsError::ZeroEffect(0.8))
        );
        assert!(required_sample_size(0.95, 1.0, &params).is_err());
        assert!(required_sample_size(0.5, 0.6, &SampleSizeParams { alpha: 0.0, power: 0.8 }).is_err());
    }
}
