//! Project records and derived text features
//!
//! A `ProjectTable` is loaded once from the CSV export and never mutated;
//! the experiment keeps its own per-row state in `Assignment`.

use std::collections::BTreeMap;
use std::path::Path;

use abtext_io::{CsvReader, DataReader, IoError};
use serde::{Deserialize, Serialize};

use crate::config::ColumnMapping;
use crate::error::{AbTestError, Result};

/// Length of a text field in characters (Unicode scalar values)
pub fn text_length(text: &str) -> usize {
    text.chars().count()
}

/// Text lengths derived from a project's title, essay and summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFeatures {
    pub title_length: usize,
    pub essay_length: usize,
    pub summary_length: usize,
    /// Sum of the three lengths
    pub total_text_length: usize,
}

impl TextFeatures {
    pub fn from_texts(title: &str, essay: &str, summary: &str) -> Self {
        let title_length = text_length(title);
        let essay_length = text_length(essay);
        let summary_length = text_length(summary);

        Self {
            title_length,
            essay_length,
            summary_length,
            total_text_length: title_length + essay_length + summary_length,
        }
    }
}

/// One crowdfunding project record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Option<String>,
    pub title: String,
    pub essay: String,
    pub summary: String,
    pub approved: bool,
    pub funding_amount: Option<f64>,
    pub categories: BTreeMap<String, String>,
    features: TextFeatures,
}

impl Project {
    /// Create a project, deriving its text features
    pub fn new(
        title: impl Into<String>,
        essay: impl Into<String>,
        summary: impl Into<String>,
        approved: bool,
    ) -> Self {
        let title = title.into();
        let essay = essay.into();
        let summary = summary.into();
        let features = TextFeatures::from_texts(&title, &essay, &summary);

        Self {
            id: None,
            title,
            essay,
            summary,
            approved,
            funding_amount: None,
            categories: BTreeMap::new(),
            features,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_funding_amount(mut self, amount: f64) -> Self {
        self.funding_amount = Some(amount);
        self
    }

    pub fn with_category(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.categories.insert(name.into(), value.into());
        self
    }

    pub fn features(&self) -> &TextFeatures {
        &self.features
    }

    pub fn essay_length(&self) -> usize {
        self.features.essay_length
    }
}

/// The loaded dataset
#[derive(Debug, Clone, Default)]
pub struct ProjectTable {
    projects: Vec<Project>,
    source: Option<String>,
    num_columns: usize,
}

impl ProjectTable {
    /// Wrap already-built projects
    pub fn from_projects(projects: Vec<Project>) -> Self {
        Self {
            projects,
            source: None,
            num_columns: 0,
        }
    }

    /// Load projects from a CSV (or `.tsv`) export
    ///
    /// Required columns are the title, essay, summary and approval columns
    /// of the mapping. Optional columns that are absent are skipped with a
    /// warning. Empty text cells count as empty strings.
    pub fn load(path: impl AsRef<Path>, mapping: &ColumnMapping) -> Result<Self> {
        let path = path.as_ref();
        let reader = CsvReader::open(path)?;
        let source = path.display().to_string();
        let schema = reader.read_schema()?;

        for column in mapping.required() {
            if !schema.has_column(column) {
                return Err(IoError::ColumnNotFound(column.to_string()).into());
            }
        }

        let optional_present = |column: &Option<String>| -> Option<String> {
            let name = column.as_ref()?;
            if schema.has_column(name) {
                Some(name.clone())
            } else {
                tracing::warn!(column = %name, "optional column missing, skipping");
                None
            }
        };
        let id_column = optional_present(&mapping.id);
        let funding_column = optional_present(&mapping.funding);
        let category_columns: Vec<String> = mapping
            .categories
            .iter()
            .filter_map(|name| optional_present(&Some(name.clone())))
            .collect();

        let mut names: Vec<&str> = mapping.required().to_vec();
        names.extend(id_column.iter().map(String::as_str));
        names.extend(funding_column.iter().map(String::as_str));
        names.extend(category_columns.iter().map(String::as_str));

        let mut slice = reader.read_string_columns(&names)?;

        let approvals = slice.take_column(&mapping.approval)?.to_bool(&mapping.approval)?;
        let funding = match &funding_column {
            Some(name) => Some(slice.take_column(name)?.to_f64()),
            None => None,
        };
        let mut strings = |name: &str| -> Result<Vec<String>> {
            slice
                .take_column(name)?
                .into_strings()
                .ok_or_else(|| {
                    AbTestError::Io(IoError::TypeMismatch {
                        column: name.to_string(),
                        expected: "string",
                        actual: "typed",
                    })
                })
        };

        let titles = strings(&mapping.title)?;
        let essays = strings(&mapping.essay)?;
        let summaries = strings(&mapping.summary)?;
        let ids = id_column.as_deref().map(&mut strings).transpose()?;
        let categories = category_columns
            .iter()
            .map(|name| -> Result<(String, Vec<String>)> {
                Ok((name.clone(), strings(name)?))
            })
            .collect::<Result<Vec<_>>>()?;

        let projects: Vec<Project> = titles
            .into_iter()
            .zip(essays)
            .zip(summaries)
            .zip(approvals)
            .enumerate()
            .map(|(row, (((title, essay), summary), approved))| {
                let mut project = Project::new(title, essay, summary, approved);
                if let Some(ids) = &ids {
                    if !ids[row].is_empty() {
                        project.id = Some(ids[row].clone());
                    }
                }
                if let Some(funding) = &funding {
                    project.funding_amount = funding[row];
                }
                for (name, values) in &categories {
                    if !values[row].is_empty() {
                        project.categories.insert(name.clone(), values[row].clone());
                    }
                }
                project
            })
            .collect();

        if projects.is_empty() {
            return Err(AbTestError::EmptyDataset(source));
        }

        tracing::info!(
            path = %source,
            rows = projects.len(),
            columns = schema.num_columns(),
            "loaded projects"
        );

        Ok(Self {
            projects,
            source: Some(source),
            num_columns: schema.num_columns(),
        })
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn iter(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// File the table was loaded from
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Number of columns in the source file (0 when built in memory)
    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    /// Fraction of approved projects, NaN for an empty table
    pub fn approval_rate(&self) -> f64 {
        if self.projects.is_empty() {
            return f64::NAN;
        }
        let approved = self.projects.iter().filter(|p| p.approved).count();
        approved as f64 / self.projects.len() as f64
    }

    /// Mean funding amount over projects that have one
    pub fn mean_funding_amount(&self) -> Option<f64> {
        let amounts: Vec<f64> = self.projects.iter().filter_map(|p| p.funding_amount).collect();
        if amounts.is_empty() {
            None
        } else {
            Some(amounts.iter().sum::<f64>() / amounts.len() as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_text_length_counts_characters() {
        assert_eq!(text_length(""), 0);
        assert_eq!(text_length("books"), 5);
        // Multi-byte characters count once
        assert_eq!(text_length("café"), 4);
        assert_eq!(text_length("教室"), 2);
    }

    #[test]
    fn test_features_sum() {
        let features = TextFeatures::from_texts("Art", "", "Paint please");
        assert_eq!(features.title_length, 3);
        assert_eq!(features.essay_length, 0);
        assert_eq!(features.summary_length, 12);
        assert_eq!(features.total_text_length, 15);
    }

    #[test]
    fn test_table_rates() {
        let table = ProjectTable::from_projects(vec![
            Project::new("a", "x", "y", true).with_funding_amount(100.0),
            Project::new("b", "x", "y", false).with_funding_amount(300.0),
            Project::new("c", "x", "y", true),
            Project::new("d", "x", "y", true),
        ]);
        assert_eq!(table.len(), 4);
        assert_eq!(table.approval_rate(), 0.75);
        assert_eq!(table.mean_funding_amount(), Some(200.0));
        assert!(ProjectTable::default().approval_rate().is_nan());
    }

    #[test]
    fn test_load_with_default_mapping() {
        let file = write_csv(
            "id,school_state,cleaned_titles,cleaned_essays,cleaned_summary,project_is_approved,price\n\
             p1,CA,Books,\"We read, a lot\",Need books,1,120.5\n\
             p2,NY,,,,0,\n",
        );
        let table = ProjectTable::load(file.path(), &ColumnMapping::default()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.num_columns(), 7);
        let first = &table.projects()[0];
        assert_eq!(first.id.as_deref(), Some("p1"));
        assert_eq!(first.features().essay_length, 14);
        assert_eq!(first.funding_amount, Some(120.5));
        assert_eq!(first.categories.get("school_state").map(String::as_str), Some("CA"));
        assert!(first.approved);

        let second = &table.projects()[1];
        assert_eq!(second.features().total_text_length, 0);
        assert_eq!(second.funding_amount, None);
        assert!(!second.approved);
    }

    #[test]
    fn test_load_missing_required_column() {
        let file = write_csv("cleaned_titles,cleaned_essays,project_is_approved\na,b,1\n");
        let err = ProjectTable::load(file.path(), &ColumnMapping::default()).unwrap_err();
        assert!(matches!(err, AbTestError::Io(IoError::ColumnNotFound(ref c)) if c == "cleaned_summary"));
    }

    #[test]
    fn test_load_malformed_approval() {
        let file = write_csv(
            "cleaned_titles,cleaned_essays,cleaned_summary,project_is_approved\na,b,c,1\na,b,c,pending\n",
        );
        let err = ProjectTable::load(file.path(), &ColumnMapping::default()).unwrap_err();
        assert!(matches!(
            err,
            AbTestError::Io(IoError::MalformedValue { row: 2, .. })
        ));
    }

    #[test]
    fn test_load_empty_file() {
        let file = write_csv("cleaned_titles,cleaned_essays,cleaned_summary,project_is_approved\n");
        let err = ProjectTable::load(file.path(), &ColumnMapping::default()).unwrap_err();
        assert!(matches!(err, AbTestError::EmptyDataset(_)));
    }
}
