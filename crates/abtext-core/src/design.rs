//! Sample size planning for the experiment design

use abtext_stats::{required_sample_size, SampleSizeParams};
use serde::{Deserialize, Serialize};

use crate::config::DesignConfig;
use crate::error::Result;

/// Required size for one candidate effect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleSizeRow {
    /// Absolute improvement over the baseline rate
    pub effect_size: f64,
    pub target_rate: f64,
    /// Per-group size, `None` when the baseline is 0 or 1 or the target
    /// rate is not below 1
    pub required_per_group: Option<u64>,
}

/// Sample size table plus the chosen test size
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleSizePlan {
    pub baseline_rate: f64,
    pub alpha: f64,
    pub power: f64,
    pub rows: Vec<SampleSizeRow>,
    pub selected_per_group: u64,
    pub num_groups: usize,
    pub total_test_size: u64,
}

/// Compute required sample sizes for each configured effect size
pub fn sample_size_plan(
    baseline_rate: f64,
    design: &DesignConfig,
    num_groups: usize,
) -> Result<SampleSizePlan> {
    let baseline_usable = baseline_rate > 0.0 && baseline_rate < 1.0;
    if !baseline_usable {
        tracing::warn!(
            baseline_rate,
            "baseline approval rate is not strictly between 0 and 1, sample sizes unavailable"
        );
    }

    let params = SampleSizeParams {
        alpha: design.alpha,
        power: design.power,
    };

    let rows = design
        .effect_sizes
        .iter()
        .map(|&effect_size| -> Result<SampleSizeRow> {
            let target_rate = baseline_rate + effect_size;
            let required_per_group = if !baseline_usable {
                None
            } else if target_rate < 1.0 {
                Some(required_sample_size(baseline_rate, target_rate, &params)?)
            } else {
                tracing::warn!(
                    effect_size,
                    baseline_rate,
                    "effect size pushes the target rate to 1 or above, skipping"
                );
                None
            };

            Ok(SampleSizeRow {
                effect_size,
                target_rate,
                required_per_group,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SampleSizePlan {
        baseline_rate,
        alpha: design.alpha,
        power: design.power,
        rows,
        selected_per_group: design.target_sample_size_per_group,
        num_groups,
        total_test_size: design.target_sample_size_per_group * num_groups as u64,
    })
}
