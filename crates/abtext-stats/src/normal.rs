//! Standard normal distribution helpers

use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::{check_open_unit, StatsResult};

/// Cumulative probability P(Z <= z)
pub fn cdf(z: f64) -> f64 {
    Normal::standard().cdf(z)
}

/// Upper tail probability P(Z > z)
pub fn sf(z: f64) -> f64 {
    Normal::standard().sf(z)
}

/// Two-sided tail probability P(|Z| >= |z|)
pub fn two_sided_p_value(z: f64) -> f64 {
    (2.0 * sf(z.abs())).min(1.0)
}

/// Percent point function (inverse CDF) for p in (0, 1)
pub fn ppf(p: f64) -> StatsResult<f64> {
    let p = check_open_unit("p", p)?;
    Ok(Normal::standard().inverse_cdf(p))
}

/// Critical value for a two-sided test at significance `alpha`
pub fn two_sided_critical(alpha: f64) -> StatsResult<f64> {
    let alpha = check_open_unit("alpha", alpha)?;
    ppf(1.0 - alpha / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdf_symmetry() {
        assert!((cdf(0.0) - 0.5).abs() < 1e-12);
        assert!((cdf(1.3) + cdf(-1.3) - 1.0).abs() < 1e-12);
        assert!((sf(1.3) - cdf(-1.3)).abs() < 1e-12);
    }

    #[test]
    fn test_critical_values() {
        assert!((two_sided_critical(0.05).unwrap() - 1.959964).abs() < 1e-5);
        assert!((ppf(0.8).unwrap() - 0.841621).abs() < 1e-5);
        assert!((two_sided_p_value(-1.959964) - 0.05).abs() < 1e-5);
    }

    #[test]
    fn test_ppf_rejects_bounds() {
        assert!(ppf(0.0).is_err());
        assert!(ppf(1.0).is_err());
        assert!(two_sided_critical(1.5).is_err());
    }
}
