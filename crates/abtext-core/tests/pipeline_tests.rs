//! End-to-end runs over CSV fixtures

mod common;

use abtext_core::impact::CostSource;
use abtext_core::{
    run, run_file, AbTestError, AssignmentStrategy, ExperimentConfig, Project, ProjectTable,
};
use abtext_io::IoError;
use common::{project_rows, write_csv};

#[test]
fn test_run_file_defaults() {
    let file = write_csv(&project_rows(800));
    let report = run_file(file.path(), &ExperimentConfig::default()).unwrap();

    assert_eq!(report.descriptive.num_projects, 800);
    assert_eq!(report.descriptive.num_columns, 9);
    assert_eq!(report.design.rows.len(), 4);
    assert_eq!(report.design.total_test_size, 20_000);

    let labels: Vec<&str> = report.results.groups.iter().map(|g| g.label.as_str()).collect();
    assert_eq!(labels, vec!["A", "B", "C", "D"]);
    for group in &report.results.groups {
        assert_eq!(group.count, 200);
    }
    assert_eq!(report.significance.tests.len(), 3);
    assert_eq!(report.impact.treatments.len(), 3);
    assert!(report.charts.is_some());
}

#[test]
fn test_control_group_is_never_altered() {
    let file = write_csv(&project_rows(600));
    let mut config = ExperimentConfig::default();
    config.assignment.rejection_probability = 1.0;
    let report = run_file(file.path(), &config).unwrap();

    let control = &report.results.groups[0];
    assert_eq!(control.approved, control.original_approved);
    assert_eq!(control.affected_projects, 0);

    // Certain rejection removes every short approved essay from treatments
    let lost: usize = report
        .results
        .treatments()
        .map(|g| g.original_approved - g.approved)
        .sum();
    assert_eq!(lost, report.assignment.flipped);
    assert!(lost > 0);
}

#[test]
fn test_same_seed_reproduces_report() {
    let file = write_csv(&project_rows(500));
    let config = ExperimentConfig::default();
    let first = run_file(file.path(), &config).unwrap();
    let second = run_file(file.path(), &config).unwrap();

    let value = |report: &abtext_core::AnalysisReport| {
        serde_json::to_value((&report.assignment, &report.results, &report.significance)).unwrap()
    };
    assert_eq!(value(&first), value(&second));
}

#[test]
fn test_random_strategy_covers_every_row() {
    let file = write_csv(&project_rows(1000));
    let mut config = ExperimentConfig::default();
    config.assignment.strategy = AssignmentStrategy::Random;
    config.assignment.seed = 7;
    let report = run_file(file.path(), &config).unwrap();

    let total: usize = report.assignment.groups.iter().map(|g| g.size).sum();
    assert_eq!(total, 1000);
    assert_eq!(report.assignment.seed, 7);
}

#[test]
fn test_impact_matches_rate_delta() {
    let file = write_csv(&project_rows(800));
    let config = ExperimentConfig::default();
    let report = run_file(file.path(), &config).unwrap();

    for treatment in &report.impact.treatments {
        let delta = treatment.treatment_rate - report.impact.control_rate;
        let expected = delta * config.impact.annual_projects as f64 * config.impact.avg_project_cost;
        assert_eq!(treatment.impact.additional_funding, expected);
        assert_eq!(
            treatment.impact.additional_funding < 0.0,
            delta < 0.0,
            "sign of funding follows the rate change"
        );
    }
}

#[test]
fn test_cost_from_funding_column() {
    let file = write_csv(&project_rows(400));
    let mut config = ExperimentConfig::default();
    config.impact.cost_from_data = true;
    let report = run_file(file.path(), &config).unwrap();

    assert_eq!(report.impact.cost_source, CostSource::Dataset);
    // Prices cycle through 100, 110, ..., 590
    assert!((report.impact.avg_project_cost - 345.0).abs() < 1e-9);
}

#[test]
fn test_custom_column_mapping() {
    let csv = project_rows(400)
        .replacen("cleaned_essays", "essay", 1)
        .replacen("project_is_approved", "approved", 1);
    let file = write_csv(&csv);

    let config = ExperimentConfig::from_toml(
        "[columns]\nessay = \"essay\"\napproval = \"approved\"\n",
    )
    .unwrap();
    let report = run_file(file.path(), &config).unwrap();
    assert_eq!(report.descriptive.num_projects, 400);

    let err = run_file(file.path(), &ExperimentConfig::default()).unwrap_err();
    assert!(matches!(err, AbTestError::Io(IoError::ColumnNotFound(_))));
}

#[test]
fn test_missing_file() {
    let err = run_file("/nonexistent/projects.csv", &ExperimentConfig::default()).unwrap_err();
    assert!(matches!(err, AbTestError::Io(_)));
}

#[test]
fn test_invalid_config_is_rejected_before_loading() {
    let mut config = ExperimentConfig::default();
    config.design.power = 1.5;
    let err = run_file("/nonexistent/projects.csv", &config).unwrap_err();
    assert!(matches!(err, AbTestError::Config(_)));
}

#[test]
fn test_empty_table() {
    let err = run(&ProjectTable::default(), &ExperimentConfig::default()).unwrap_err();
    assert!(matches!(err, AbTestError::EmptyDataset(_)));
}

fn uniform_table(approved: bool) -> ProjectTable {
    ProjectTable::from_projects(
        (0..400)
            .map(|i| Project::new("t", "e".repeat((i * 29) % 2400), "s", approved))
            .collect(),
    )
}

#[test]
fn test_all_rejected_table_still_reports() {
    let report = run(&uniform_table(false), &ExperimentConfig::default()).unwrap();

    assert_eq!(report.design.baseline_rate, 0.0);
    assert!(report.design.rows.iter().all(|r| r.required_per_group.is_none()));
    for test in &report.significance.tests {
        assert_eq!(test.comparison.p_value, 1.0);
        assert!(!test.significant());
    }
    assert!(!report.recommendations.adopt);
    assert!(report.render_text().contains("infeasible"));
}

#[test]
fn test_all_approved_table_still_reports() {
    let report = run(&uniform_table(true), &ExperimentConfig::default()).unwrap();

    assert_eq!(report.design.baseline_rate, 1.0);
    assert!(report.design.rows.iter().all(|r| r.required_per_group.is_none()));
    assert_eq!(report.results.groups[0].approval_rate, 1.0);
    assert_eq!(report.significance.tests.len(), 3);
}

#[test]
fn test_text_and_json_output() {
    let file = write_csv(&project_rows(400));
    let mut report = run_file(file.path(), &ExperimentConfig::default()).unwrap();

    let text = report.render_text();
    for heading in [
        "1. Dataset",
        "3. Test design",
        "6. Statistical significance",
        "8. Recommendations",
        "Charts",
        "Treatment 3 (1200 chars)",
        "2000+",
    ] {
        assert!(text.contains(heading), "missing {:?}", heading);
    }

    report.charts = None;
    assert!(!report.render_text().contains("\nCharts\n"));

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["results"]["groups"].as_array().unwrap().len(), 4);
    assert_eq!(json["assignment"]["strategy"], "balanced");
    assert!(json["recommendations"]["best"]["label"].is_string());
    assert!(json.get("charts").is_none());
}
