//! Significance of each treatment against the control

use abtext_stats::{compare_proportions, ProportionComparison, ProportionSample};
use serde::{Deserialize, Serialize};

use crate::assignment::Assignment;
use crate::error::Result;

/// Comparison of one treatment group with the control
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreatmentTest {
    pub label: String,
    pub name: String,
    pub display_name: String,
    pub min_essay_length: usize,
    pub treatment: ProportionSample,
    pub comparison: ProportionComparison,
}

impl TreatmentTest {
    pub fn treatment_rate(&self) -> f64 {
        self.comparison.treatment_rate
    }

    pub fn effect_size(&self) -> f64 {
        self.comparison.effect_size
    }

    pub fn significant(&self) -> bool {
        self.comparison.significant
    }
}

/// All treatment comparisons at one significance level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignificanceSummary {
    pub alpha: f64,
    pub control_label: String,
    pub control: ProportionSample,
    pub control_rate: f64,
    pub tests: Vec<TreatmentTest>,
}

impl SignificanceSummary {
    pub fn test(&self, label: &str) -> Option<&TreatmentTest> {
        self.tests.iter().find(|t| t.label == label)
    }
}

/// Compare every treatment group with the control on simulated approvals
pub fn test_treatments(assignment: &Assignment, alpha: f64) -> Result<SignificanceSummary> {
    let control = assignment.outcomes(0);

    let tests = assignment
        .groups()
        .iter()
        .enumerate()
        .skip(1)
        .map(|(index, group)| -> Result<TreatmentTest> {
            let treatment = assignment.outcomes(index);
            let comparison = compare_proportions(&control, &treatment, alpha)?;

            tracing::debug!(
                group = %group.label,
                effect_size = comparison.effect_size,
                p_value = comparison.p_value,
                significant = comparison.significant,
                "treatment compared with control"
            );

            Ok(TreatmentTest {
                label: group.label.clone(),
                name: group.name.clone(),
                display_name: group.display_name(),
                min_essay_length: group.min_essay_length,
                treatment,
                comparison,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SignificanceSummary {
        alpha,
        control_label: assignment.control().label.clone(),
        control,
        control_rate: control.rate(),
        tests,
    })
}
