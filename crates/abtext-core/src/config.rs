//! Configuration for abtext-core
//!
//! Centralized configuration for the experiment: which CSV columns hold
//! which fields, the design assumptions, how groups are formed, and the
//! business figures used for the impact estimate.
//!
//! Every section has defaults, so a config file only needs the values it
//! changes:
//!
//! ```toml
//! [assignment]
//! seed = 7
//! strategy = "random"
//!
//! [impact]
//! annual_projects = 120000
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Full experiment configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// CSV column mapping
    pub columns: ColumnMapping,
    /// Sample size design assumptions
    pub design: DesignConfig,
    /// Group formation and outcome simulation
    pub assignment: AssignmentConfig,
    /// Business impact figures
    pub impact: ImpactConfig,
    /// Report layout
    pub report: ReportConfig,
}

/// Which CSV columns hold the project fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    /// Record identifier (optional)
    pub id: Option<String>,
    pub title: String,
    pub essay: String,
    pub summary: String,
    /// Binary approval indicator
    pub approval: String,
    /// Requested funding amount (optional)
    pub funding: Option<String>,
    /// Categorical attributes carried along when present
    pub categories: Vec<String>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            id: Some("id".to_string()),
            title: "cleaned_titles".to_string(),
            essay: "cleaned_essays".to_string(),
            summary: "cleaned_summary".to_string(),
            approval: "project_is_approved".to_string(),
            funding: Some("price".to_string()),
            categories: vec![
                "school_state".to_string(),
                "project_grade_category".to_string(),
                "teacher_prefix".to_string(),
            ],
        }
    }
}

impl ColumnMapping {
    /// Columns that must exist in the input
    pub fn required(&self) -> [&str; 4] {
        [
            self.title.as_str(),
            self.essay.as_str(),
            self.summary.as_str(),
            self.approval.as_str(),
        ]
    }
}

/// Sample size design assumptions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignConfig {
    /// Two-sided significance level
    pub alpha: f64,
    /// Desired power
    pub power: f64,
    /// Absolute approval-rate improvements to size for
    pub effect_sizes: Vec<f64>,
    /// Per-group sample size chosen for the test
    pub target_sample_size_per_group: u64,
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            power: 0.8,
            effect_sizes: vec![0.01, 0.02, 0.03, 0.05],
            target_sample_size_per_group: 5_000,
        }
    }
}

/// How rows are split into groups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStrategy {
    /// Shuffle, then allocate exact quotas from the weights
    #[default]
    Balanced,
    /// Independent weighted draw per row
    Random,
}

impl AssignmentStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStrategy::Balanced => "balanced",
            AssignmentStrategy::Random => "random",
        }
    }
}

impl std::str::FromStr for AssignmentStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "balanced" => Ok(AssignmentStrategy::Balanced),
            "random" => Ok(AssignmentStrategy::Random),
            other => Err(ConfigError::InvalidValue(format!(
                "unknown assignment strategy '{}'",
                other
            ))),
        }
    }
}

/// One experiment group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSpec {
    /// Short label, e.g. "A"
    pub label: String,
    /// Display name, e.g. "Control"
    pub name: String,
    /// Minimum essay length in characters; 0 for the control
    pub min_essay_length: usize,
    /// Relative allocation weight
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl GroupSpec {
    pub fn new(label: &str, name: &str, min_essay_length: usize) -> Self {
        Self {
            label: label.to_string(),
            name: name.to_string(),
            min_essay_length,
            weight: default_weight(),
        }
    }

    /// The control group applies no minimum
    pub fn is_control(&self) -> bool {
        self.min_essay_length == 0
    }

    /// Name with the rule spelled out, e.g. "Treatment 1 (800 chars)"
    pub fn display_name(&self) -> String {
        if self.is_control() {
            self.name.clone()
        } else {
            format!("{} ({} chars)", self.name, self.min_essay_length)
        }
    }
}

/// Group formation and outcome simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignmentConfig {
    /// RNG seed; the same seed reproduces the same run
    pub seed: u64,
    pub strategy: AssignmentStrategy,
    /// Chance an approved short-essay treatment project is rejected instead
    pub rejection_probability: f64,
    /// Groups, control first
    pub groups: Vec<GroupSpec>,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            strategy: AssignmentStrategy::default(),
            rejection_probability: 0.3,
            groups: vec![
                GroupSpec::new("A", "Control", 0),
                GroupSpec::new("B", "Treatment 1", 800),
                GroupSpec::new("C", "Treatment 2", 1000),
                GroupSpec::new("D", "Treatment 3", 1200),
            ],
        }
    }
}

impl AssignmentConfig {
    /// Validate group layout and probabilities
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.rejection_probability) {
            return Err(ConfigError::OutOfRange(format!(
                "rejection_probability must be between 0.0 and 1.0, got {}",
                self.rejection_probability
            )));
        }

        if self.groups.len() < 2 {
            return Err(ConfigError::InvalidGroups(
                "need a control group and at least one treatment".to_string(),
            ));
        }

        if !self.groups[0].is_control() {
            return Err(ConfigError::InvalidGroups(format!(
                "first group '{}' must be the control (min_essay_length = 0)",
                self.groups[0].label
            )));
        }

        for (i, group) in self.groups.iter().enumerate() {
            if group.label.trim().is_empty() {
                return Err(ConfigError::InvalidGroups(format!("group {} has an empty label", i)));
            }
            if i > 0 && group.is_control() {
                return Err(ConfigError::InvalidGroups(format!(
                    "treatment group '{}' must set a positive min_essay_length",
                    group.label
                )));
            }
            if !(group.weight.is_finite() && group.weight > 0.0) {
                return Err(ConfigError::OutOfRange(format!(
                    "group '{}' weight must be positive, got {}",
                    group.label, group.weight
                )));
            }
            if self.groups[..i].iter().any(|other| other.label == group.label) {
                return Err(ConfigError::InvalidGroups(format!(
                    "duplicate group label '{}'",
                    group.label
                )));
            }
        }

        Ok(())
    }

    /// The control group
    pub fn control(&self) -> Option<&GroupSpec> {
        self.groups.first()
    }
}

/// Business impact figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactConfig {
    /// Estimated projects submitted per year
    pub annual_projects: u64,
    /// Average funding per approved project, in dollars
    pub avg_project_cost: f64,
    /// Use the mean of the funding column instead of `avg_project_cost`
    pub cost_from_data: bool,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            annual_projects: 100_000,
            avg_project_cost: 298.12,
            cost_from_data: false,
        }
    }
}

/// Report layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Lower edges of the essay length bins; the last bin is open-ended
    pub essay_bin_edges: Vec<usize>,
    /// Bins in the essay length histograms
    pub histogram_bins: usize,
    /// Width in characters of the longest chart bar
    pub chart_width: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            essay_bin_edges: vec![0, 500, 800, 1000, 1200, 1500, 2000],
            histogram_bins: 50,
            chart_width: 40,
        }
    }
}

impl ExperimentConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load and validate a configuration file (`.toml` or `.json`)
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&contents)?,
            Some("json") => Self::from_json(&contents)?,
            other => {
                return Err(ConfigError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("alpha", self.design.alpha), ("power", self.design.power)] {
            if !(value > 0.0 && value < 1.0) {
                return Err(ConfigError::OutOfRange(format!(
                    "{} must be between 0.0 and 1.0, got {}",
                    name, value
                )));
            }
        }

        if let Some(effect) = self.design.effect_sizes.iter().find(|e| !(**e > 0.0 && **e < 1.0)) {
            return Err(ConfigError::OutOfRange(format!(
                "effect sizes must be between 0.0 and 1.0, got {}",
                effect
            )));
        }

        if self.design.target_sample_size_per_group == 0 {
            return Err(ConfigError::OutOfRange(
                "target_sample_size_per_group must be positive".to_string(),
            ));
        }

        self.assignment.validate()?;

        if self.impact.annual_projects == 0 {
            return Err(ConfigError::OutOfRange(
                "annual_projects must be positive".to_string(),
            ));
        }

        if !(self.impact.avg_project_cost.is_finite() && self.impact.avg_project_cost > 0.0) {
            return Err(ConfigError::OutOfRange(format!(
                "avg_project_cost must be positive, got {}",
                self.impact.avg_project_cost
            )));
        }

        let edges = &self.report.essay_bin_edges;
        if edges.is_empty() || edges.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ConfigError::InvalidValue(
                "essay_bin_edges must be non-empty and strictly increasing".to_string(),
            ));
        }

        if self.report.histogram_bins == 0 {
            return Err(ConfigError::OutOfRange(
                "histogram_bins must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Value is out of valid range
    #[error("Value out of range: {0}")]
    OutOfRange(String),

    /// Group list is malformed
    #[error("Invalid groups: {0}")]
    InvalidGroups(String),

    /// Value is not acceptable
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// File could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// File could not be read
    #[error("I/O error: {0}")]
    Io(String),

    /// File extension not recognized
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExperimentConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.assignment.groups.len(), 4);
        assert_eq!(config.assignment.control().unwrap().label, "A");
    }

    #[test]
    fn test_toml_round_trip_and_partial_file() {
        let config = ExperimentConfig::default();
        let toml = config.to_toml().unwrap();
        assert_eq!(ExperimentConfig::from_toml(&toml).unwrap(), config);

        let partial = ExperimentConfig::from_toml(
            "[assignment]\nseed = 7\nstrategy = \"random\"\n\n[impact]\nannual_projects = 120000\n",
        )
        .unwrap();
        assert_eq!(partial.assignment.seed, 7);
        assert_eq!(partial.assignment.strategy, AssignmentStrategy::Random);
        assert_eq!(partial.assignment.groups.len(), 4);
        assert_eq!(partial.impact.annual_projects, 120_000);
        assert_eq!(partial.impact.avg_project_cost, 298.12);
    }

    #[test]
    fn test_json_serialization() {
        let config = ExperimentConfig::default();
        let json = config.to_json().unwrap();
        let parsed = ExperimentConfig::from_json(&json).unwrap();
        assert_eq!(parsed.design.effect_sizes, config.design.effect_sizes);
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("Balanced".parse::<AssignmentStrategy>().unwrap(), AssignmentStrategy::Balanced);
        assert_eq!("random".parse::<AssignmentStrategy>().unwrap(), AssignmentStrategy::Random);
        assert!("stratified".parse::<AssignmentStrategy>().is_err());
    }

    #[test]
    fn test_invalid_probabilities() {
        let mut config = ExperimentConfig::default();
        config.assignment.rejection_probability = 1.5;
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::default();
        config.design.alpha = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_groups() {
        let mut config = ExperimentConfig::default();
        config.assignment.groups.swap(0, 1);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidGroups(_))));

        let mut config = ExperimentConfig::default();
        config.assignment.groups[2].label = "B".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidGroups(_))));

        let mut config = ExperimentConfig::default();
        config.assignment.groups.truncate(1);
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::default();
        config.assignment.groups[1].weight = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::OutOfRange(_))));
    }

    #[test]
    fn test_invalid_bin_edges() {
        let mut config = ExperimentConfig::default();
        config.report.essay_bin_edges = vec![0, 800, 500];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_display_name() {
        let config = AssignmentConfig::default();
        assert_eq!(config.groups[0].display_name(), "Control");
        assert_eq!(config.groups[1].display_name(), "Treatment 1 (800 chars)");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("experiment.toml");
        std::fs::write(&path, "[design]\nalpha = 0.01\n").unwrap();
        let config = ExperimentConfig::load(&path).unwrap();
        assert_eq!(config.design.alpha, 0.01);

        let bad = dir.path().join("experiment.yaml");
        std::fs::write(&bad, "alpha: 0.01").unwrap();
        assert!(matches!(
            ExperimentConfig::load(&bad),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}
