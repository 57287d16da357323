//! Reader trait, supported file formats and I/O errors

use std::ops::Range;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::csv_reader::{CsvOptions, CsvReader};
use crate::schema::{DataColumn, DataSchema, DataSlice};

/// Errors raised while reading a project export
#[derive(Debug, Error)]
pub enum IoError {
    #[error("no such file: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("unsupported file type {extension:?}, expected .csv or .tsv")]
    UnsupportedFormat { extension: String },

    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    #[error("column '{column}' holds {actual} values, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("malformed value {value:?} in column '{column}' at row {row}")]
    MalformedValue {
        column: String,
        row: usize,
        value: String,
    },

    #[error("rows {}..{} out of range ({records} records)", .rows.start, .rows.end)]
    RowRange { rows: Range<usize>, records: usize },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type IoResult<T> = Result<T, IoError>;

/// Delimited text formats, told apart by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Tsv,
}

impl FileFormat {
    /// Detect the format from a path's extension (case-insensitive)
    pub fn from_path(path: &Path) -> IoResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Ok(Self::Csv),
            "tsv" | "tab" => Ok(Self::Tsv),
            _ => Err(IoError::UnsupportedFormat { extension }),
        }
    }

    pub fn delimiter(self) -> u8 {
        match self {
            Self::Csv => b',',
            Self::Tsv => b'\t',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Tsv => "TSV",
        }
    }
}

/// Uniform access to a tabular file
pub trait DataReader {
    /// Column names, inferred types and record count
    fn read_schema(&self) -> IoResult<DataSchema>;

    /// One column, converted to its inferred type
    fn read_column(&self, name: &str) -> IoResult<DataColumn>;

    /// All columns for the records in `rows`
    fn read_rows(&self, rows: Range<usize>) -> IoResult<DataSlice>;

    fn path(&self) -> Option<&Path> {
        None
    }

    fn format_name(&self) -> &'static str;
}

pub type BoxedReader = Box<dyn DataReader>;

/// Open a project export, picking the reader from the file extension
pub fn open_file(path: impl AsRef<Path>) -> IoResult<BoxedReader> {
    let path = path.as_ref();
    let format = FileFormat::from_path(path)?;
    Ok(Box::new(CsvReader::with_options(path, CsvOptions::from(format))?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(FileFormat::from_path(Path::new("projects.csv")).unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::from_path(Path::new("data/PROJECTS.TSV")).unwrap(), FileFormat::Tsv);
        assert_eq!(FileFormat::Tsv.delimiter(), b'\t');

        let err = FileFormat::from_path(Path::new("projects.xlsx")).unwrap_err();
        assert!(matches!(err, IoError::UnsupportedFormat { ref extension } if extension == "xlsx"));
        assert!(FileFormat::from_path(Path::new("projects")).is_err());
    }

    #[test]
    fn test_open_file_errors() {
        assert!(matches!(
            open_file("projects.parquet"),
            Err(IoError::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            open_file("/definitely/not/here/projects.csv"),
            Err(IoError::FileNotFound(_))
        ));
    }
}
