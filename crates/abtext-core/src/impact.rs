//! Annual funding impact implied by each treatment's rate change

use serde::{Deserialize, Serialize};

use crate::config::ImpactConfig;
use crate::dataset::ProjectTable;
use crate::significance::SignificanceSummary;

/// Projected yearly effect of switching from the control to a treatment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BusinessImpact {
    /// treatment rate - control rate
    pub rate_delta: f64,
    /// rate_delta * annual projects; negative when approvals drop
    pub additional_approved: f64,
    /// additional_approved * average cost
    pub additional_funding: f64,
    /// Approvals lost per year, zero unless the treatment rate is lower
    pub projects_rejected: f64,
    /// additional_funding - projects_rejected * average cost
    pub net_impact: f64,
}

/// Project one rate change onto a year of submissions
pub fn business_impact(
    control_rate: f64,
    treatment_rate: f64,
    config: &ImpactConfig,
) -> BusinessImpact {
    let volume = config.annual_projects as f64;
    let cost = config.avg_project_cost;

    let rate_delta = treatment_rate - control_rate;
    let additional_approved = rate_delta * volume;
    let additional_funding = additional_approved * cost;
    let projects_rejected = if treatment_rate < control_rate {
        (control_rate - treatment_rate) * volume
    } else {
        0.0
    };

    BusinessImpact {
        rate_delta,
        additional_approved,
        additional_funding,
        projects_rejected,
        net_impact: additional_funding - projects_rejected * cost,
    }
}

/// Where the average project cost came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostSource {
    Configured,
    /// Mean of the funding column
    Dataset,
}

/// Impact of one treatment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreatmentImpact {
    pub label: String,
    pub display_name: String,
    pub treatment_rate: f64,
    pub impact: BusinessImpact,
}

/// Impact of every treatment under the same volume and cost figures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactSummary {
    pub annual_projects: u64,
    pub avg_project_cost: f64,
    pub cost_source: CostSource,
    pub control_rate: f64,
    pub treatments: Vec<TreatmentImpact>,
}

/// Resolve the cost figure and project every treatment's rate change
///
/// With `cost_from_data` set, the mean funding amount of the table is
/// used; a table without funding amounts falls back to the configured
/// cost.
pub fn impact_summary(
    significance: &SignificanceSummary,
    table: &ProjectTable,
    config: &ImpactConfig,
) -> ImpactSummary {
    let (avg_project_cost, cost_source) = if config.cost_from_data {
        match table.mean_funding_amount() {
            Some(mean) => (mean, CostSource::Dataset),
            None => {
                tracing::warn!(
                    fallback = config.avg_project_cost,
                    "no funding amounts in dataset, using configured average cost"
                );
                (config.avg_project_cost, CostSource::Configured)
            }
        }
    } else {
        (config.avg_project_cost, CostSource::Configured)
    };

    let resolved = ImpactConfig {
        avg_project_cost,
        ..config.clone()
    };

    let treatments = significance
        .tests
        .iter()
        .map(|test| TreatmentImpact {
            label: test.label.clone(),
            display_name: test.display_name.clone(),
            treatment_rate: test.treatment_rate(),
            impact: business_impact(significance.control_rate, test.treatment_rate(), &resolved),
        })
        .collect();

    ImpactSummary {
        annual_projects: config.annual_projects,
        avg_project_cost,
        cost_source,
        control_rate: significance.control_rate,
        treatments,
    }
}
