//! The analysis report and its text rendering

use chrono::{DateTime, Utc};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use serde::{Deserialize, Serialize};

use crate::assignment::AssignmentSummary;
use crate::charts::ChartSet;
use crate::config::ExperimentConfig;
use crate::descriptive::{DescriptiveSummary, LengthStats};
use crate::design::SampleSizePlan;
use crate::error::Result;
use crate::impact::{CostSource, ImpactSummary};
use crate::recommend::Recommendations;
use crate::results::ExperimentResults;
use crate::significance::SignificanceSummary;

const RULE_WIDTH: usize = 60;

/// Everything one run produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    /// Input file, when loaded from disk
    pub source: Option<String>,
    pub config: ExperimentConfig,
    pub descriptive: DescriptiveSummary,
    pub design: SampleSizePlan,
    pub assignment: AssignmentSummary,
    pub results: ExperimentResults,
    pub significance: SignificanceSummary,
    pub impact: ImpactSummary,
    pub recommendations: Recommendations,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charts: Option<ChartSet>,
}

impl AnalysisReport {
    /// Pretty-printed JSON form of the report
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Human-readable report
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{}\n", "=".repeat(RULE_WIDTH)));
        out.push_str("TEXT LENGTH OPTIMIZATION A/B TESTING\n");
        out.push_str(&format!("{}\n", "=".repeat(RULE_WIDTH)));
        if let Some(source) = &self.source {
            out.push_str(&format!("Source: {}\n", source));
        }
        out.push_str(&format!(
            "Generated: {}\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        let sections = [
            ("1. Dataset", self.render_dataset()),
            ("2. Current text length patterns", self.render_patterns()),
            ("3. Test design", self.render_design()),
            ("4. Group assignment", self.render_assignment()),
            ("5. Test results", self.render_results()),
            ("6. Statistical significance", self.render_significance()),
            ("7. Business impact", self.render_impact()),
            ("8. Recommendations", self.render_recommendations()),
        ];
        for (title, body) in sections {
            out.push_str(&format!("\n{}\n{}\n{}", title, "-".repeat(title.len()), body));
        }

        if let Some(charts) = &self.charts {
            let width = self.config.report.chart_width;
            out.push_str(&format!("\nCharts\n------\n{}", charts.render_text(width)));
        }

        out.push_str(&format!("\n{}\n", "=".repeat(RULE_WIDTH)));
        out.push_str("A/B TEST ANALYSIS COMPLETE\n");
        out.push_str(&format!("{}\n", "=".repeat(RULE_WIDTH)));
        out
    }

    fn render_dataset(&self) -> String {
        let d = &self.descriptive;
        format!(
            "Projects: {}\nColumns: {}\nCurrent approval rate: {}\n",
            format_thousands(d.num_projects as f64),
            d.num_columns,
            format_percent(d.approval_rate)
        )
    }

    fn render_patterns(&self) -> String {
        let mut table = new_table(vec![
            "Status", "Field", "Count", "Mean", "Std", "Min", "Q1", "Median", "Q3", "Max",
        ]);
        for group in &self.descriptive.by_status {
            let status = if group.approved { "Approved" } else { "Not approved" };
            let fields: [(&str, &LengthStats); 4] = [
                ("title", &group.title),
                ("essay", &group.essay),
                ("summary", &group.summary),
                ("total", &group.total),
            ];
            for (field, stats) in fields {
                let q = stats.quartiles;
                table.add_row(vec![
                    Cell::new(status),
                    Cell::new(field),
                    right(format_thousands(group.count as f64)),
                    right(format_number(stats.summary.mean)),
                    right(format_number(stats.summary.std_dev)),
                    right(format_number(q.map_or(f64::NAN, |q| q.min))),
                    right(format_number(q.map_or(f64::NAN, |q| q.q1))),
                    right(format_number(q.map_or(f64::NAN, |q| q.median))),
                    right(format_number(q.map_or(f64::NAN, |q| q.q3))),
                    right(format_number(q.map_or(f64::NAN, |q| q.max))),
                ]);
            }
        }
        format!("Text length statistics by approval status (characters):\n{}\n", table)
    }

    fn render_design(&self) -> String {
        let plan = &self.design;
        let mut table = new_table(vec!["Effect size", "Target rate", "Required per group"]);
        for row in &plan.rows {
            table.add_row(vec![
                right(format!("{:.2} ({:.0}%)", row.effect_size, row.effect_size * 100.0)),
                right(format!("{:.4}", row.target_rate)),
                right(
                    row.required_per_group
                        .map_or("infeasible".to_string(), |n| format_thousands(n as f64)),
                ),
            ]);
        }
        format!(
            "Baseline approval rate: {:.4} (alpha = {}, power = {})\n{}\n\
             Selected sample size per group: {}\nTotal test size: {} ({} groups)\n",
            plan.baseline_rate,
            plan.alpha,
            plan.power,
            table,
            format_thousands(plan.selected_per_group as f64),
            format_thousands(plan.total_test_size as f64),
            plan.num_groups
        )
    }

    fn render_assignment(&self) -> String {
        let a = &self.assignment;
        let mut table = new_table(vec!["Group", "Name", "Min essay length", "Projects"]);
        for group in &a.groups {
            table.add_row(vec![
                Cell::new(&group.label),
                Cell::new(&group.name),
                right(group.min_essay_length.to_string()),
                right(format_thousands(group.size as f64)),
            ]);
        }
        format!(
            "Strategy: {} (seed {})\nRejection probability for short essays: {}\n{}\n\
             Approvals reversed by the simulation: {}\n",
            a.strategy.as_str(),
            a.seed,
            a.rejection_probability,
            table,
            format_thousands(a.flipped as f64)
        )
    }

    fn render_results(&self) -> String {
        let mut groups = new_table(vec![
            "Group",
            "Projects",
            "Approval rate",
            "Original rate",
            "Affected projects",
            "Median essay length",
        ]);
        for group in &self.results.groups {
            groups.add_row(vec![
                Cell::new(&group.display_name),
                right(format_thousands(group.count as f64)),
                right(format_percent(group.approval_rate)),
                right(format_percent(group.original_approval_rate)),
                right(format_thousands(group.affected_projects as f64)),
                right(format_number(group.essay_length.map_or(f64::NAN, |q| q.median))),
            ]);
        }

        let mut bins = new_table(vec!["Essay length", "Projects", "Approval rate"]);
        for bin in &self.results.essay_bins {
            bins.add_row(vec![
                Cell::new(&bin.label),
                right(format_thousands(bin.count as f64)),
                right(format_percent(bin.approval_rate)),
            ]);
        }

        format!("{}\nApproval rate by essay length bin:\n{}\n", groups, bins)
    }

    fn render_significance(&self) -> String {
        let s = &self.significance;
        let level = (1.0 - s.alpha) * 100.0;
        let mut table = new_table(vec![
            "Treatment".to_string(),
            "Approval rate".to_string(),
            "Effect size".to_string(),
            "Chi-square".to_string(),
            "P-value".to_string(),
            format!("{:.0}% CI", level),
            "Significant".to_string(),
        ]);
        for test in &s.tests {
            let c = &test.comparison;
            table.add_row(vec![
                Cell::new(&test.display_name),
                right(format!("{:.4}", c.treatment_rate)),
                right(format!("{:+.4} ({:+.2}%)", c.effect_size, c.effect_size * 100.0)),
                right(format!("{:.4}", c.chi_square.statistic)),
                right(format!("{:.6}", c.p_value)),
                right(format!(
                    "[{:.4}, {:.4}]",
                    c.confidence_interval.lower, c.confidence_interval.upper
                )),
                Cell::new(if c.significant { "Yes" } else { "No" }),
            ]);
        }
        format!(
            "Control group ({}) approval rate: {:.4}\nSignificance level: {}\n{}\n",
            s.control_label, s.control_rate, s.alpha, table
        )
    }

    fn render_impact(&self) -> String {
        let i = &self.impact;
        let mut table = new_table(vec![
            "Treatment",
            "Additional approved",
            "Additional funding",
            "Projects rejected",
            "Net funding impact",
        ]);
        for t in &i.treatments {
            table.add_row(vec![
                Cell::new(&t.display_name),
                right(format_thousands(t.impact.additional_approved)),
                right(format_money(t.impact.additional_funding)),
                right(format_thousands(t.impact.projects_rejected)),
                right(format_money(t.impact.net_impact)),
            ]);
        }
        let source = match i.cost_source {
            CostSource::Configured => "configured",
            CostSource::Dataset => "mean of funding column",
        };
        format!(
            "Control group approval rate: {:.4}\nEstimated annual projects: {}\n\
             Average project cost: {} ({})\n{}\n",
            i.control_rate,
            format_thousands(i.annual_projects as f64),
            format_money(i.avg_project_cost),
            source,
            table
        )
    }

    fn render_recommendations(&self) -> String {
        let r = &self.recommendations;
        let bullet = |items: &[String], mark: &str| -> String {
            items.iter().map(|item| format!("   {} {}\n", mark, item)).collect()
        };

        let mut out = String::new();
        out.push_str(&format!(
            "Best performing treatment: {}\n   Approval rate: {:.4} ({:.2}%)\n   \
             Improvement: {:+.4} ({:+.2}%)\n   Statistically significant: {}\n",
            r.best.display_name,
            r.best.treatment_rate,
            r.best.treatment_rate * 100.0,
            r.best.effect_size,
            r.best.effect_size * 100.0,
            if r.best.significant { "Yes" } else { "No" }
        ));
        out.push_str(&format!(
            "Worst performing treatment: {}\n   Approval rate: {:.4} ({:.2}%)\n   \
             Impact: {:+.4} ({:+.2}%)\n",
            r.worst.display_name,
            r.worst.treatment_rate,
            r.worst.treatment_rate * 100.0,
            r.worst.effect_size,
            r.worst.effect_size * 100.0
        ));
        out.push_str("Recommendation:\n");
        out.push_str(&bullet(&r.actions, if r.adopt { "+" } else { "!" }));
        out.push_str("Next steps:\n");
        out.push_str(&bullet(&r.next_steps, "-"));
        out.push_str("Risk mitigation:\n");
        out.push_str(&bullet(&r.risk_mitigation, "-"));
        out
    }
}

fn new_table<T: ToString>(header: Vec<T>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.iter().map(|h| h.to_string()).collect::<Vec<_>>());
    table
}

fn right(text: impl ToString) -> Cell {
    Cell::new(text.to_string()).set_alignment(CellAlignment::Right)
}

/// Round to an integer and group digits by thousands, e.g. `-1,234`
pub fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}{}", sign, group_digits(&digits))
}

/// Dollar amount with cents, e.g. `-$1,234.50`
pub fn format_money(value: f64) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let cents = format!("{:.2}", value.abs());
    let (whole, fraction) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));
    let sign = if value < 0.0 && cents != "0.00" { "-" } else { "" };
    format!("{}${}.{}", sign, group_digits(whole), fraction)
}

fn format_percent(rate: f64) -> String {
    if rate.is_finite() {
        format!("{:.2}%", rate * 100.0)
    } else {
        "n/a".to_string()
    }
}

fn format_number(value: f64) -> String {
    if value.is_finite() {
        format!("{:.2}", value)
    } else {
        "n/a".to_string()
    }
}

fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.0), "999");
        assert_eq!(format_thousands(1000.0), "1,000");
        assert_eq!(format_thousands(109_248.0), "109,248");
        assert_eq!(format_thousands(-2_401.6), "-2,402");
        assert_eq!(format_thousands(1_234_567.0), "1,234,567");
        assert_eq!(format_thousands(f64::NAN), "n/a");
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(298.12), "$298.12");
        assert_eq!(format_money(1_234_567.891), "$1,234,567.89");
        assert_eq!(format_money(-715_488.0), "-$715,488.00");
        assert_eq!(format_money(-0.001), "$0.00");
        assert_eq!(format_money(f64::INFINITY), "n/a");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.8486), "84.86%");
        assert_eq!(format_percent(f64::NAN), "n/a");
    }
}
