//! Tests on two binomial proportions
//!
//! A control and a treatment group each contribute a count of successes
//! (approved projects) out of a total. The tests here work directly on
//! those four counts:
//!
//! - chi-square test of independence on the 2x2 table, with Yates'
//!   continuity correction
//! - pooled two-proportion z-test
//! - Wald confidence interval on the rate difference (unpooled SE)

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::error::{check_open_unit, StatsError, StatsResult};
use crate::normal;

/// Successes out of a total for one group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProportionSample {
    pub successes: u64,
    pub total: u64,
}

impl ProportionSample {
    /// Create a sample, rejecting more successes than observations
    pub fn new(successes: u64, total: u64) -> StatsResult<Self> {
        if successes > total {
            return Err(StatsError::InvalidCounts { successes, total });
        }
        Ok(Self { successes, total })
    }

    /// Count successes in a slice of outcomes
    pub fn from_outcomes(outcomes: &[bool]) -> Self {
        Self {
            successes: outcomes.iter().filter(|&&ok| ok).count() as u64,
            total: outcomes.len() as u64,
        }
    }

    /// Number of failures
    pub fn failures(&self) -> u64 {
        self.total - self.successes
    }

    /// Success rate, NaN for an empty sample
    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            f64::NAN
        } else {
            self.successes as f64 / self.total as f64
        }
    }

    fn require_non_empty(&self, label: &str) -> StatsResult<()> {
        if self.total == 0 {
            Err(StatsError::EmptyGroup(label.to_string()))
        } else {
            Ok(())
        }
    }
}

/// Chi-square test outcome
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareResult {
    /// Test statistic after continuity correction
    pub statistic: f64,
    /// Upper-tail probability with one degree of freedom
    pub p_value: f64,
    /// Degrees of freedom (always 1 for a 2x2 table)
    pub dof: u32,
    /// Expected counts under independence, rows = groups, cols = success/failure
    pub expected: [[f64; 2]; 2],
}

/// Chi-square test of independence on a 2x2 table with Yates' correction
///
/// Each observed count is moved towards its expected count by at most 0.5
/// before the statistic is computed. When a marginal total is zero the
/// table carries no information; the statistic is 0 and the p-value 1.
pub fn chi_square_2x2(
    control: &ProportionSample,
    treatment: &ProportionSample,
) -> StatsResult<ChiSquareResult> {
    control.require_non_empty("control")?;
    treatment.require_non_empty("treatment")?;

    let observed = [
        [control.successes as f64, control.failures() as f64],
        [treatment.successes as f64, treatment.failures() as f64],
    ];
    let row_totals = [control.total as f64, treatment.total as f64];
    let col_totals = [
        observed[0][0] + observed[1][0],
        observed[0][1] + observed[1][1],
    ];
    let grand_total = row_totals[0] + row_totals[1];

    let mut expected = [[0.0; 2]; 2];
    for (i, row) in expected.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = row_totals[i] * col_totals[j] / grand_total;
        }
    }

    if col_totals.iter().any(|&total| total == 0.0) {
        return Ok(ChiSquareResult {
            statistic: 0.0,
            p_value: 1.0,
            dof: 1,
            expected,
        });
    }

    let mut statistic = 0.0;
    for i in 0..2 {
        for j in 0..2 {
            let diff = expected[i][j] - observed[i][j];
            let corrected = observed[i][j] + diff.signum() * diff.abs().min(0.5);
            statistic += (corrected - expected[i][j]).powi(2) / expected[i][j];
        }
    }

    let distribution =
        ChiSquared::new(1.0).map_err(|e| StatsError::Distribution(e.to_string()))?;

    Ok(ChiSquareResult {
        statistic,
        p_value: distribution.sf(statistic),
        dof: 1,
        expected,
    })
}

/// Two-proportion z-test outcome
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZTestResult {
    /// (treatment rate - control rate) / pooled SE
    pub statistic: f64,
    /// Two-sided p-value
    pub p_value: f64,
}

/// Pooled two-proportion z-test
pub fn two_proportion_z_test(
    control: &ProportionSample,
    treatment: &ProportionSample,
) -> StatsResult<ZTestResult> {
    control.require_non_empty("control")?;
    treatment.require_non_empty("treatment")?;

    let n1 = control.total as f64;
    let n2 = treatment.total as f64;
    let pooled = (control.successes + treatment.successes) as f64 / (n1 + n2);
    let se = (pooled * (1.0 - pooled) * (1.0 / n1 + 1.0 / n2)).sqrt();

    if se == 0.0 {
        return Ok(ZTestResult {
            statistic: 0.0,
            p_value: 1.0,
        });
    }

    let statistic = (treatment.rate() - control.rate()) / se;
    Ok(ZTestResult {
        statistic,
        p_value: normal::two_sided_p_value(statistic),
    })
}

/// Confidence interval on a rate difference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    /// Confidence level, e.g. 0.95
    pub level: f64,
}

impl ConfidenceInterval {
    /// Whether the interval contains `value`
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Wald interval on (treatment rate - control rate) using unpooled SE
pub fn difference_confidence_interval(
    control: &ProportionSample,
    treatment: &ProportionSample,
    level: f64,
) -> StatsResult<ConfidenceInterval> {
    control.require_non_empty("control")?;
    treatment.require_non_empty("treatment")?;
    let level = check_open_unit("confidence level", level)?;

    let p1 = control.rate();
    let p2 = treatment.rate();
    let se = (p1 * (1.0 - p1) / control.total as f64 + p2 * (1.0 - p2) / treatment.total as f64)
        .sqrt();
    let margin = normal::two_sided_critical(1.0 - level)? * se;
    let effect = p2 - p1;

    Ok(ConfidenceInterval {
        lower: effect - margin,
        upper: effect + margin,
        level,
    })
}

/// Full comparison of a treatment group against the control
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProportionComparison {
    pub control_rate: f64,
    pub treatment_rate: f64,
    /// treatment_rate - control_rate
    pub effect_size: f64,
    /// Chi-square (Yates) test, the source of `p_value`
    pub chi_square: ChiSquareResult,
    /// Two-proportion z-test, reported alongside
    pub z_test: ZTestResult,
    /// Chi-square p-value
    pub p_value: f64,
    pub confidence_interval: ConfidenceInterval,
    /// p_value < alpha
    pub significant: bool,
}

/// Compare treatment with control at significance level `alpha`
///
/// The confidence interval is built at level `1 - alpha`.
pub fn compare_proportions(
    control: &ProportionSample,
    treatment: &ProportionSample,
    alpha: f64,
) -> StatsResult<ProportionComparison> {
    let alpha = check_open_unit("alpha", alpha)?;
    let chi_square = chi_square_2x2(control, treatment)?;
    let z_test = two_proportion_z_test(control, treatment)?;
    let confidence_interval = difference_confidence_interval(control, treatment, 1.0 - alpha)?;

    let control_rate = control.rate();
    let treatment_rate = treatment.rate();

    Ok(ProportionComparison {
        control_rate,
        treatment_rate,
        effect_size: treatment_rate - control_rate,
        chi_square,
        z_test,
        p_value: chi_square.p_value,
        confidence_interval,
        significant: chi_square.p_value < alpha,
    })
}
