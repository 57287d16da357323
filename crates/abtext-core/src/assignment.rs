//! Group assignment and outcome simulation
//!
//! Rows are partitioned into the configured groups with a seeded RNG,
//! then each treatment's minimum-essay-length rule is simulated: an
//! approved project whose essay falls short of its group's minimum is
//! rejected with probability `rejection_probability`. Control rows keep
//! their recorded outcome.
//!
//! The same seed, strategy and table always give the same assignment.

use abtext_stats::ProportionSample;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::{AssignmentConfig, AssignmentStrategy, ConfigError, GroupSpec};
use crate::dataset::ProjectTable;
use crate::error::Result;

/// Group membership and simulated outcome of every row
#[derive(Debug, Clone)]
pub struct Assignment {
    groups: Vec<GroupSpec>,
    group_of: Vec<usize>,
    simulated_approved: Vec<bool>,
    flipped: usize,
    strategy: AssignmentStrategy,
    seed: u64,
    rejection_probability: f64,
}

impl Assignment {
    /// Configured groups, control first
    pub fn groups(&self) -> &[GroupSpec] {
        &self.groups
    }

    /// The control group
    pub fn control(&self) -> &GroupSpec {
        &self.groups[0]
    }

    /// Number of assigned rows
    pub fn len(&self) -> usize {
        self.group_of.len()
    }

    pub fn is_empty(&self) -> bool {
        self.group_of.is_empty()
    }

    /// Index of the group a row belongs to
    pub fn group_of(&self, row: usize) -> usize {
        self.group_of[row]
    }

    /// Simulated approval of a row
    pub fn simulated_approved(&self, row: usize) -> bool {
        self.simulated_approved[row]
    }

    /// Rows belonging to a group, in table order
    pub fn members(&self, group: usize) -> Vec<usize> {
        self.group_of
            .iter()
            .enumerate()
            .filter(|(_, &g)| g == group)
            .map(|(row, _)| row)
            .collect()
    }

    /// Row count per group
    pub fn group_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.groups.len()];
        for &g in &self.group_of {
            sizes[g] += 1;
        }
        sizes
    }

    /// Simulated approvals of a group as a proportion sample
    pub fn outcomes(&self, group: usize) -> ProportionSample {
        let mut sample = ProportionSample {
            successes: 0,
            total: 0,
        };
        for (&g, &approved) in self.group_of.iter().zip(&self.simulated_approved) {
            if g == group {
                sample.total += 1;
                if approved {
                    sample.successes += 1;
                }
            }
        }
        sample
    }

    /// Approved projects turned into rejections by the simulation
    pub fn flipped(&self) -> usize {
        self.flipped
    }

    pub fn summary(&self) -> AssignmentSummary {
        AssignmentSummary {
            strategy: self.strategy,
            seed: self.seed,
            rejection_probability: self.rejection_probability,
            groups: self
                .groups
                .iter()
                .zip(self.group_sizes())
                .map(|(group, size)| GroupSize {
                    label: group.label.clone(),
                    name: group.name.clone(),
                    min_essay_length: group.min_essay_length,
                    size,
                })
                .collect(),
            flipped: self.flipped,
        }
    }
}

/// Size of one group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSize {
    pub label: String,
    pub name: String,
    pub min_essay_length: usize,
    pub size: usize,
}

/// Reportable description of an assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentSummary {
    pub strategy: AssignmentStrategy,
    pub seed: u64,
    pub rejection_probability: f64,
    pub groups: Vec<GroupSize>,
    pub flipped: usize,
}

/// Partition the table into groups and simulate each treatment's outcome
pub fn assign_groups(table: &ProjectTable, config: &AssignmentConfig) -> Result<Assignment> {
    config.validate()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let weights: Vec<f64> = config.groups.iter().map(|g| g.weight).collect();

    let group_of = match config.strategy {
        AssignmentStrategy::Balanced => balanced_partition(table.len(), &weights, &mut rng),
        AssignmentStrategy::Random => random_partition(table.len(), &weights, &mut rng)?,
    };

    let mut flipped = 0;
    let simulated_approved = table
        .iter()
        .zip(&group_of)
        .map(|(project, &g)| {
            let group = &config.groups[g];
            let short = project.essay_length() < group.min_essay_length;
            if project.approved && short && rng.gen_bool(config.rejection_probability) {
                flipped += 1;
                false
            } else {
                project.approved
            }
        })
        .collect();

    tracing::debug!(
        strategy = config.strategy.as_str(),
        seed = config.seed,
        flipped,
        "assigned projects to groups"
    );

    Ok(Assignment {
        groups: config.groups.clone(),
        group_of,
        simulated_approved,
        flipped,
        strategy: config.strategy,
        seed: config.seed,
        rejection_probability: config.rejection_probability,
    })
}

/// Shuffle rows, then hand out exact quotas in group order
fn balanced_partition(n: usize, weights: &[f64], rng: &mut StdRng) -> Vec<usize> {
    let quotas = largest_remainder_quotas(n, weights);

    let mut rows: Vec<usize> = (0..n).collect();
    rows.shuffle(rng);

    let mut group_of = vec![0; n];
    let mut cursor = 0;
    for (group, &quota) in quotas.iter().enumerate() {
        for &row in &rows[cursor..cursor + quota] {
            group_of[row] = group;
        }
        cursor += quota;
    }
    group_of
}

/// Independent weighted draw per row
fn random_partition(n: usize, weights: &[f64], rng: &mut StdRng) -> Result<Vec<usize>> {
    let distribution = WeightedIndex::new(weights)
        .map_err(|e| ConfigError::InvalidValue(format!("group weights: {}", e)))?;
    Ok((0..n).map(|_| distribution.sample(rng)).collect())
}

/// Integer quotas summing to `n`, proportional to `weights`
///
/// Each group gets the floor of its exact share; the leftover rows go to
/// the groups with the largest fractional parts, earlier groups first on
/// ties.
fn largest_remainder_quotas(n: usize, weights: &[f64]) -> Vec<usize> {
    let total: f64 = weights.iter().sum();
    let exact: Vec<f64> = weights.iter().map(|w| n as f64 * w / total).collect();
    let mut quotas: Vec<usize> = exact.iter().map(|q| q.floor() as usize).collect();

    // Guard against rounding pushing the floors past n
    while quotas.iter().sum::<usize>() > n {
        if let Some(largest) = quotas.iter_mut().max() {
            *largest -= 1;
        }
    }

    let mut order: Vec<usize> = (0..weights.len()).collect();
    order.sort_by(|&a, &b| {
        let frac_a = exact[a] - exact[a].floor();
        let frac_b = exact[b] - exact[b].floor();
        frac_b.total_cmp(&frac_a).then(a.cmp(&b))
    });

    let leftover = n - quotas.iter().sum::<usize>();
    for k in 0..leftover {
        quotas[order[k % order.len()]] += 1;
    }
    quotas
}
