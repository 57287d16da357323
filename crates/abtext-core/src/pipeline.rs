//! End-to-end run of the experiment

use std::path::Path;

use chrono::Utc;

use crate::assignment::assign_groups;
use crate::charts::build_charts;
use crate::config::ExperimentConfig;
use crate::dataset::ProjectTable;
use crate::descriptive::describe;
use crate::design::sample_size_plan;
use crate::error::{AbTestError, Result};
use crate::impact::impact_summary;
use crate::recommend::recommend;
use crate::report::AnalysisReport;
use crate::results::analyze_results;
use crate::significance::test_treatments;

/// Run every stage over an already-loaded table
pub fn run(table: &ProjectTable, config: &ExperimentConfig) -> Result<AnalysisReport> {
    config.validate()?;
    if table.is_empty() {
        return Err(AbTestError::EmptyDataset(
            table.source().unwrap_or("<memory>").to_string(),
        ));
    }

    tracing::info!(projects = table.len(), "analyzing current text length patterns");
    let descriptive = describe(table);

    tracing::info!(baseline = descriptive.approval_rate, "designing test");
    let design = sample_size_plan(
        descriptive.approval_rate,
        &config.design,
        config.assignment.groups.len(),
    )?;

    tracing::info!(
        strategy = config.assignment.strategy.as_str(),
        seed = config.assignment.seed,
        "assigning groups"
    );
    let assignment = assign_groups(table, &config.assignment)?;

    tracing::info!("analyzing test results");
    let results = analyze_results(table, &assignment, &config.report)?;

    tracing::info!(alpha = config.design.alpha, "testing significance");
    let significance = test_treatments(&assignment, config.design.alpha)?;

    tracing::info!("estimating business impact");
    let impact = impact_summary(&significance, table, &config.impact);

    let recommendations = recommend(&significance)
        .ok_or_else(|| AbTestError::EmptyGroup("treatments".to_string()))?;
    tracing::info!(
        best = %recommendations.best.label,
        adopt = recommendations.adopt,
        "generated recommendations"
    );

    let charts = build_charts(table, &results, &config.report);

    Ok(AnalysisReport {
        generated_at: Utc::now(),
        source: table.source().map(str::to_string),
        config: config.clone(),
        descriptive,
        design,
        assignment: assignment.summary(),
        results,
        significance,
        impact,
        recommendations,
        charts: Some(charts),
    })
}

/// Load a CSV export and run every stage over it
pub fn run_file(path: impl AsRef<Path>, config: &ExperimentConfig) -> Result<AnalysisReport> {
    config.validate()?;
    tracing::info!(path = %path.as_ref().display(), "loading and preparing data");
    let table = ProjectTable::load(path, &config.columns)?;
    run(&table, config)
}
