//! Column types, schemas and in-memory column data

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::reader::{IoError, IoResult};

/// Layout of a delimited file as found when it was opened
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSchema {
    pub columns: Vec<ColumnDescriptor>,
    /// Data records, header excluded
    pub num_records: usize,
}

impl DataSchema {
    pub fn new(columns: Vec<ColumnDescriptor>, num_records: usize) -> Self {
        Self {
            columns,
            num_records,
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.column_index(name).map(|i| &self.columns[i])
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub dtype: ColumnType,
    /// Whether any cell in the file was empty
    pub nullable: bool,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, dtype: ColumnType) -> Self {
        Self {
            name: name.into(),
            dtype,
            nullable: false,
        }
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}

/// Inferred cell type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Int64,
    Float64,
    Bool,
    String,
}

impl ColumnType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Int64 => "int64",
            Self::Float64 => "float64",
            Self::Bool => "bool",
            Self::String => "string",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Values of one column
#[derive(Debug, Clone, PartialEq)]
pub enum DataColumn {
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    Bool(Vec<bool>),
    String(Vec<String>),
}

impl DataColumn {
    pub fn dtype(&self) -> ColumnType {
        match self {
            Self::Int64(_) => ColumnType::Int64,
            Self::Float64(_) => ColumnType::Float64,
            Self::Bool(_) => ColumnType::Bool,
            Self::String(_) => ColumnType::String,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Int64(v) => v.len(),
            Self::Float64(v) => v.len(),
            Self::Bool(v) => v.len(),
            Self::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric view of the column
    ///
    /// Empty, unparseable and non-finite cells are `None`. Booleans map to
    /// 1 and 0.
    pub fn to_f64(&self) -> Vec<Option<f64>> {
        let finite = |x: f64| Some(x).filter(|x| x.is_finite());
        match self {
            Self::Int64(v) => v.iter().map(|&x| Some(x as f64)).collect(),
            Self::Float64(v) => v.iter().map(|&x| finite(x)).collect(),
            Self::Bool(v) => v.iter().map(|&b| Some(if b { 1.0 } else { 0.0 })).collect(),
            Self::String(v) => v
                .iter()
                .map(|s| s.trim().parse().ok().and_then(finite))
                .collect(),
        }
    }

    /// Strict boolean view of the column
    ///
    /// The first cell that is not a recognised boolean fails the whole
    /// column. Its row number is 1-based and excludes the header.
    pub fn to_bool(&self, column: &str) -> IoResult<Vec<bool>> {
        let check = |row: usize, parsed: Option<bool>, raw: &dyn fmt::Display| {
            parsed.ok_or_else(|| IoError::MalformedValue {
                column: column.to_string(),
                row: row + 1,
                value: raw.to_string(),
            })
        };

        match self {
            Self::Bool(v) => Ok(v.clone()),
            Self::Int64(v) => v
                .iter()
                .enumerate()
                .map(|(row, x)| check(row, int_bool(*x as f64), x))
                .collect(),
            Self::Float64(v) => v
                .iter()
                .enumerate()
                .map(|(row, x)| check(row, int_bool(*x), x))
                .collect(),
            Self::String(v) => v
                .iter()
                .enumerate()
                .map(|(row, s)| check(row, parse_bool(s), s))
                .collect(),
        }
    }

    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_strings(self) -> Option<Vec<String>> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }
}

fn int_bool(x: f64) -> Option<bool> {
    if x == 1.0 {
        Some(true)
    } else if x == 0.0 {
        Some(false)
    } else {
        None
    }
}

/// Parse one boolean cell: `true/false`, `yes/no`, `1/0` or `1.0/0.0`,
/// ignoring case and surrounding whitespace
pub fn parse_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    ["true", "yes", "1", "1.0"]
        .iter()
        .any(|t| value.eq_ignore_ascii_case(t))
        .then_some(true)
        .or_else(|| {
            ["false", "no", "0", "0.0"]
                .iter()
                .any(|f| value.eq_ignore_ascii_case(f))
                .then_some(false)
        })
}

/// Named columns covering the same run of records
#[derive(Debug, Clone, Default)]
pub struct DataSlice {
    /// Position of the first record in the file
    pub start: usize,
    pub num_rows: usize,
    pub columns: HashMap<String, DataColumn>,
}

impl DataSlice {
    pub fn new(start: usize) -> Self {
        Self {
            start,
            ..Self::default()
        }
    }

    /// The first column added fixes the row count
    pub fn add_column(&mut self, name: impl Into<String>, data: DataColumn) {
        if self.columns.is_empty() {
            self.num_rows = data.len();
        }
        self.columns.insert(name.into(), data);
    }

    pub fn column(&self, name: &str) -> Option<&DataColumn> {
        self.columns.get(name)
    }

    /// Move a column out of the slice
    pub fn take_column(&mut self, name: &str) -> IoResult<DataColumn> {
        self.columns
            .remove(name)
            .ok_or_else(|| IoError::ColumnNotFound(name.to_string()))
    }
}
