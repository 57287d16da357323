//! Text length statistics by approval status

use abtext_stats::{FiveNumberSummary, SummaryStats};
use serde::{Deserialize, Serialize};

use crate::dataset::{ProjectTable, TextFeatures};

/// Statistics of one text length field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LengthStats {
    pub summary: SummaryStats,
    /// Box plot numbers, absent for an empty group
    pub quartiles: Option<FiveNumberSummary>,
}

impl LengthStats {
    fn from_lengths(lengths: &[f64]) -> Self {
        Self {
            summary: SummaryStats::from_data(lengths),
            quartiles: FiveNumberSummary::from_data(lengths),
        }
    }
}

/// Length statistics for projects sharing an approval status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusGroupStats {
    pub approved: bool,
    pub count: usize,
    pub title: LengthStats,
    pub essay: LengthStats,
    pub summary: LengthStats,
    pub total: LengthStats,
}

/// Dataset-level overview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptiveSummary {
    pub num_projects: usize,
    pub num_columns: usize,
    pub approval_rate: f64,
    /// Rejected first, then approved
    pub by_status: Vec<StatusGroupStats>,
}

impl DescriptiveSummary {
    /// Statistics for one approval status
    pub fn status(&self, approved: bool) -> Option<&StatusGroupStats> {
        self.by_status.iter().find(|group| group.approved == approved)
    }
}

/// Summarize text lengths grouped by approval status
pub fn describe(table: &ProjectTable) -> DescriptiveSummary {
    let by_status = [false, true]
        .into_iter()
        .map(|approved| {
            let features: Vec<&TextFeatures> = table
                .iter()
                .filter(|p| p.approved == approved)
                .map(|p| p.features())
                .collect();
            let field = |get: fn(&TextFeatures) -> usize| -> LengthStats {
                let lengths: Vec<f64> = features.iter().map(|f| get(f) as f64).collect();
                LengthStats::from_lengths(&lengths)
            };

            StatusGroupStats {
                approved,
                count: features.len(),
                title: field(|f| f.title_length),
                essay: field(|f| f.essay_length),
                summary: field(|f| f.summary_length),
                total: field(|f| f.total_text_length),
            }
        })
        .collect();

    DescriptiveSummary {
        num_projects: table.len(),
        num_columns: table.num_columns(),
        approval_rate: table.approval_rate(),
        by_status,
    }
}
