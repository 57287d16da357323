//! Chart data and plain-text rendering
//!
//! Charts are kept as data so the JSON report carries them too; the text
//! form draws horizontal bars scaled to the largest value.

use abtext_stats::Histogram;
use serde::{Deserialize, Serialize};

use crate::config::ReportConfig;
use crate::dataset::ProjectTable;
use crate::results::ExperimentResults;

/// How bar values are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueFormat {
    /// A rate in [0, 1] printed as a percentage
    Percent,
    Count,
}

impl ValueFormat {
    fn format(&self, value: f64) -> String {
        if !value.is_finite() {
            return "n/a".to_string();
        }
        match self {
            ValueFormat::Percent => format!("{:.2}%", value * 100.0),
            ValueFormat::Count => format!("{:.0}", value),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

/// Labelled values drawn as horizontal bars
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarChart {
    pub title: String,
    pub value_format: ValueFormat,
    pub bars: Vec<Bar>,
}

impl BarChart {
    pub fn new(title: impl Into<String>, value_format: ValueFormat) -> Self {
        Self {
            title: title.into(),
            value_format,
            bars: Vec::new(),
        }
    }

    pub fn bar(mut self, label: impl Into<String>, value: f64) -> Self {
        self.bars.push(Bar {
            label: label.into(),
            value,
        });
        self
    }

    /// Render with the longest bar `width` characters wide
    pub fn render_text(&self, width: usize) -> String {
        let max = max_value(self.bars.iter().map(|b| b.value));
        let label_width = self.bars.iter().map(|b| b.label.chars().count()).max().unwrap_or(0);

        let mut out = format!("{}\n", self.title);
        for bar in &self.bars {
            out.push_str(&format!(
                "  {:<label_width$} |{} {}\n",
                bar.label,
                render_bar(bar.value, max, width),
                self.value_format.format(bar.value),
                label_width = label_width,
            ));
        }
        out
    }
}

/// One histogram in a shared-bin chart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramSeries {
    pub name: String,
    pub histogram: Histogram,
}

/// Several samples binned over the same edges
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramChart {
    pub title: String,
    pub series: Vec<HistogramSeries>,
}

impl HistogramChart {
    /// Bin every series over equal-width edges spanning all of the data
    pub fn shared_bins(
        title: impl Into<String>,
        series: Vec<(String, Vec<f64>)>,
        bins: usize,
    ) -> Self {
        let all: Vec<f64> = series.iter().flat_map(|(_, data)| data.iter().copied()).collect();
        let edges = Histogram::from_data(&all, bins).edges;

        Self {
            title: title.into(),
            series: series
                .into_iter()
                .map(|(name, data)| HistogramSeries {
                    name,
                    histogram: Histogram::with_edges(&data, edges.clone()),
                })
                .collect(),
        }
    }

    pub fn render_text(&self, width: usize) -> String {
        let max = max_value(
            self.series
                .iter()
                .flat_map(|s| s.histogram.counts.iter().map(|&c| c as f64)),
        );

        let mut out = format!("{}\n", self.title);
        for series in &self.series {
            out.push_str(&format!("  {} (n = {})\n", series.name, series.histogram.total()));
            let edges = &series.histogram.edges;
            for (i, &count) in series.histogram.counts.iter().enumerate() {
                out.push_str(&format!(
                    "  {:>7.0}-{:<7.0} |{} {}\n",
                    edges[i],
                    edges[i + 1],
                    render_bar(count as f64, max, width),
                    count
                ));
            }
        }
        out
    }
}

/// Every chart of the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSet {
    pub essay_length_by_status: HistogramChart,
    pub group_approval_rates: BarChart,
    pub affected_projects: BarChart,
    pub approval_by_essay_bin: BarChart,
}

impl ChartSet {
    pub fn render_text(&self, width: usize) -> String {
        [
            self.essay_length_by_status.render_text(width),
            self.group_approval_rates.render_text(width),
            self.affected_projects.render_text(width),
            self.approval_by_essay_bin.render_text(width),
        ]
        .join("\n")
    }
}

/// Build the report charts
pub fn build_charts(
    table: &ProjectTable,
    results: &ExperimentResults,
    report: &ReportConfig,
) -> ChartSet {
    let lengths = |approved: bool| -> Vec<f64> {
        table
            .iter()
            .filter(|p| p.approved == approved)
            .map(|p| p.essay_length() as f64)
            .collect()
    };
    let essay_length_by_status = HistogramChart::shared_bins(
        "Essay length distribution by approval status (characters)",
        vec![
            ("Not approved".to_string(), lengths(false)),
            ("Approved".to_string(), lengths(true)),
        ],
        report.histogram_bins,
    );

    let group_approval_rates = results.groups.iter().fold(
        BarChart::new("Approval rates by test group", ValueFormat::Percent),
        |chart, group| chart.bar(group.display_name.clone(), group.approval_rate),
    );

    let affected_projects = results.treatments().fold(
        BarChart::new("Projects affected by minimum length requirements", ValueFormat::Count),
        |chart, group| chart.bar(group.display_name.clone(), group.affected_projects as f64),
    );

    let approval_by_essay_bin = results.essay_bins.iter().fold(
        BarChart::new("Approval rate by essay length bin", ValueFormat::Percent),
        |chart, bin| chart.bar(bin.label.clone(), bin.approval_rate),
    );

    ChartSet {
        essay_length_by_status,
        group_approval_rates,
        affected_projects,
        approval_by_essay_bin,
    }
}

fn max_value(values: impl Iterator<Item = f64>) -> f64 {
    values.filter(|v| v.is_finite()).fold(0.0, f64::max)
}

/// Bar of `value / max * width` blocks, padded to `width`
fn render_bar(value: f64, max: f64, width: usize) -> String {
    let filled = if max > 0.0 && value.is_finite() && value > 0.0 {
        ((value / max) * width as f64).round() as usize
    } else {
        0
    };
    let filled = filled.min(width);
    format!("{}{}", "#".repeat(filled), " ".repeat(width - filled))
}
