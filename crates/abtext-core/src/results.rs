//! Per-group outcomes of the simulated experiment

use abtext_stats::FiveNumberSummary;
use serde::{Deserialize, Serialize};

use crate::assignment::Assignment;
use crate::config::ReportConfig;
use crate::dataset::ProjectTable;
use crate::error::{AbTestError, Result};

/// Outcome of one group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupResult {
    pub label: String,
    pub name: String,
    pub display_name: String,
    pub min_essay_length: usize,
    pub count: usize,
    /// Approvals after the simulation
    pub approved: usize,
    pub approval_rate: f64,
    /// Approvals as recorded in the data
    pub original_approved: usize,
    pub original_approval_rate: f64,
    /// Members whose essay is shorter than the group minimum
    pub affected_projects: usize,
    pub essay_length: Option<FiveNumberSummary>,
}

/// Simulated approval rate within one essay length bin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EssayBinResult {
    pub label: String,
    pub lower: usize,
    /// Inclusive upper bound, `None` for the open-ended last bin
    pub upper: Option<usize>,
    pub count: usize,
    pub approved: usize,
    /// NaN for an empty bin
    pub approval_rate: f64,
}

impl EssayBinResult {
    /// Whether an essay length falls in this bin
    ///
    /// Bins are `(lower, upper]`; the first bin also holds its lower edge.
    pub fn contains(&self, length: usize, first: bool) -> bool {
        let above = length > self.lower || (first && length == self.lower);
        above && self.upper.map_or(true, |upper| length <= upper)
    }
}

/// Group and essay-bin outcomes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResults {
    pub groups: Vec<GroupResult>,
    pub essay_bins: Vec<EssayBinResult>,
}

impl ExperimentResults {
    pub fn group(&self, label: &str) -> Option<&GroupResult> {
        self.groups.iter().find(|g| g.label == label)
    }

    /// Treatment groups only
    pub fn treatments(&self) -> impl Iterator<Item = &GroupResult> {
        self.groups.iter().skip(1)
    }
}

fn rate(count: usize, total: usize) -> f64 {
    if total == 0 {
        f64::NAN
    } else {
        count as f64 / total as f64
    }
}

/// Summarize the simulated outcome of every group and essay length bin
pub fn analyze_results(
    table: &ProjectTable,
    assignment: &Assignment,
    report: &ReportConfig,
) -> Result<ExperimentResults> {
    let projects = table.projects();

    let groups = assignment
        .groups()
        .iter()
        .enumerate()
        .map(|(index, group)| -> Result<GroupResult> {
            let members = assignment.members(index);
            if members.is_empty() {
                return Err(AbTestError::EmptyGroup(group.label.clone()));
            }

            let approved = members
                .iter()
                .filter(|&&row| assignment.simulated_approved(row))
                .count();
            let original_approved = members.iter().filter(|&&row| projects[row].approved).count();
            let affected_projects = members
                .iter()
                .filter(|&&row| projects[row].essay_length() < group.min_essay_length)
                .count();
            let lengths: Vec<f64> = members
                .iter()
                .map(|&row| projects[row].essay_length() as f64)
                .collect();

            Ok(GroupResult {
                label: group.label.clone(),
                name: group.name.clone(),
                display_name: group.display_name(),
                min_essay_length: group.min_essay_length,
                count: members.len(),
                approved,
                approval_rate: rate(approved, members.len()),
                original_approved,
                original_approval_rate: rate(original_approved, members.len()),
                affected_projects,
                essay_length: FiveNumberSummary::from_data(&lengths),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let essay_bins = essay_bins(table, assignment, &report.essay_bin_edges);

    for group in &groups {
        tracing::debug!(
            group = %group.label,
            count = group.count,
            approval_rate = group.approval_rate,
            affected = group.affected_projects,
            "group result"
        );
    }

    Ok(ExperimentResults { groups, essay_bins })
}

/// Simulated approval rates over essay length bins
///
/// `edges` are the lower bounds; the last bin is open-ended and labelled
/// `"{last}+"`. Essays shorter than the first edge are not counted.
pub fn essay_bins(
    table: &ProjectTable,
    assignment: &Assignment,
    edges: &[usize],
) -> Vec<EssayBinResult> {
    let mut bins: Vec<EssayBinResult> = edges
        .iter()
        .enumerate()
        .map(|(i, &lower)| {
            let upper = edges.get(i + 1).copied();
            EssayBinResult {
                label: match upper {
                    Some(upper) => format!("{}-{}", lower, upper),
                    None => format!("{}+", lower),
                },
                lower,
                upper,
                count: 0,
                approved: 0,
                approval_rate: f64::NAN,
            }
        })
        .collect();

    for (row, project) in table.iter().enumerate() {
        let length = project.essay_length();
        if let Some(bin) = bins
            .iter_mut()
            .enumerate()
            .find(|(i, bin)| bin.contains(length, *i == 0))
            .map(|(_, bin)| bin)
        {
            bin.count += 1;
            if assignment.simulated_approved(row) {
                bin.approved += 1;
            }
        }
    }

    for bin in &mut bins {
        bin.approval_rate = rate(bin.approved, bin.count);
    }
    bins
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::assign_groups;
    use crate::config::AssignmentConfig;
    use crate::dataset::Project;

    fn table() -> ProjectTable {
        ProjectTable::from_projects(
            (0..400)
                .map(|i| Project::new("t", "e".repeat((i * 13) % 2500), "s", i % 5 != 0))
                .collect(),
        )
    }

    #[test]
    fn test_group_results() {
        let table = table();
        let assignment = assign_groups(&table, &AssignmentConfig::default()).unwrap();
        let results = analyze_results(&table, &assignment, &ReportConfig::default()).unwrap();

        assert_eq!(results.groups.len(), 4);
        assert_eq!(results.groups.iter().map(|g| g.count).sum::<usize>(), 400);

        let control = results.group("A").unwrap();
        assert_eq!(control.affected_projects, 0);
        assert_eq!(control.approved, control.original_approved);

        for group in results.treatments() {
            assert!(group.approved <= group.original_approved);
            assert!(group.affected_projects > 0);
            assert_eq!(group.display_name, format!("{} ({} chars)", group.name, group.min_essay_length));
        }
        let simulated: usize = results.groups.iter().map(|g| g.original_approved - g.approved).sum();
        assert_eq!(simulated, assignment.flipped());
    }

    #[test]
    fn test_essay_bins_labels_and_bounds() {
        let table = ProjectTable::from_projects(vec![
            Project::new("t", "", "s", true),
            Project::new("t", "e".repeat(500), "s", false),
            Project::new("t", "e".repeat(501), "s", true),
            Project::new("t", "e".repeat(2000), "s", true),
            Project::new("t", "e".repeat(2001), "s", true),
            Project::new("t", "e".repeat(5000), "s", false),
        ]);
        let config = AssignmentConfig {
            rejection_probability: 0.0,
            ..AssignmentConfig::default()
        };
        let assignment = assign_groups(&table, &config).unwrap();
        let bins = essay_bins(&table, &assignment, &ReportConfig::default().essay_bin_edges);

        let labels: Vec<&str> = bins.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["0-500", "500-800", "800-1000", "1000-1200", "1200-1500", "1500-2000", "2000+"]
        );

        assert_eq!(bins[0].count, 2);
        assert_eq!(bins[0].approval_rate, 0.5);
        assert_eq!(bins[1].count, 1);
        assert_eq!(bins[5].count, 1);
        assert_eq!(bins[6].count, 2);
        assert_eq!(bins[6].upper, None);
        assert!(bins[3].approval_rate.is_nan());
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 6);
    }

    #[test]
    fn test_empty_group_is_an_error() {
        let table = ProjectTable::from_projects(vec![
            Project::new("t", "e", "s", true),
            Project::new("t", "e", "s", false),
        ]);
        let assignment = assign_groups(&table, &AssignmentConfig::default()).unwrap();
        let err = analyze_results(&table, &assignment, &ReportConfig::default()).unwrap_err();
        assert!(matches!(err, AbTestError::EmptyGroup(_)));
    }
}
