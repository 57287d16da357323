//! Delimited text reader with type inference

use std::fs::File;
use std::ops::Range;
use std::path::{Path, PathBuf};

use csv::StringRecord;

use crate::reader::{DataReader, FileFormat, IoError, IoResult};
use crate::schema::{ColumnDescriptor, ColumnType, DataColumn, DataSchema, DataSlice};

/// Leading records used to infer column types
const INFERENCE_ROWS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub has_header: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        FileFormat::Csv.into()
    }
}

impl From<FileFormat> for CsvOptions {
    fn from(format: FileFormat) -> Self {
        Self {
            delimiter: format.delimiter(),
            has_header: true,
        }
    }
}

/// Reader over a CSV or TSV file
///
/// Opening scans the whole file once to count records and infer types.
/// Every later read streams the file again.
pub struct CsvReader {
    path: PathBuf,
    options: CsvOptions,
    schema: DataSchema,
}

impl CsvReader {
    /// Open a file, taking the delimiter from its extension
    ///
    /// Unknown extensions are read as comma-separated.
    pub fn open(path: impl AsRef<Path>) -> IoResult<Self> {
        let path = path.as_ref();
        let format = FileFormat::from_path(path).unwrap_or(FileFormat::Csv);
        Self::with_options(path, format.into())
    }

    pub fn with_options(path: impl AsRef<Path>, options: CsvOptions) -> IoResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(IoError::FileNotFound(path));
        }

        let mut reader = csv_reader(&path, options)?;
        let schema = scan_schema(&mut reader, options.has_header)?;
        tracing::debug!(
            path = %path.display(),
            columns = schema.num_columns(),
            records = schema.num_records,
            "scanned delimited file"
        );

        Ok(Self {
            path,
            options,
            schema,
        })
    }

    fn index_of(&self, name: &str) -> IoResult<usize> {
        self.schema
            .column_index(name)
            .ok_or_else(|| IoError::ColumnNotFound(name.to_string()))
    }

    /// Stream every data record with its 0-based position
    fn each_record(&self, mut visit: impl FnMut(usize, &StringRecord) -> bool) -> IoResult<()> {
        let mut reader = csv_reader(&self.path, self.options)?;
        let mut record = StringRecord::new();
        let mut position = 0;
        while reader.read_record(&mut record)? {
            if !visit(position, &record) {
                break;
            }
            position += 1;
        }
        Ok(())
    }

    /// Read several columns as raw strings in one pass
    ///
    /// Free text goes through here so its content is never coerced by type
    /// inference. Missing trailing cells read as empty strings.
    pub fn read_string_columns(&self, names: &[&str]) -> IoResult<DataSlice> {
        let indices = names
            .iter()
            .map(|name| self.index_of(name))
            .collect::<IoResult<Vec<_>>>()?;

        let mut columns = vec![Vec::with_capacity(self.schema.num_records); names.len()];
        self.each_record(|_, record| {
            for (values, &index) in columns.iter_mut().zip(&indices) {
                values.push(cell(record, index));
            }
            true
        })?;

        let mut slice = DataSlice::new(0);
        for (name, values) in names.iter().zip(columns) {
            slice.add_column(*name, DataColumn::String(values));
        }
        Ok(slice)
    }
}

impl DataReader for CsvReader {
    fn read_schema(&self) -> IoResult<DataSchema> {
        Ok(self.schema.clone())
    }

    fn read_column(&self, name: &str) -> IoResult<DataColumn> {
        let index = self.index_of(name)?;
        let mut values = Vec::with_capacity(self.schema.num_records);
        self.each_record(|_, record| {
            values.push(cell(record, index));
            true
        })?;
        convert(values, &self.schema.columns[index], 0)
    }

    fn read_rows(&self, rows: Range<usize>) -> IoResult<DataSlice> {
        let records = self.schema.num_records;
        if rows.start > rows.end || rows.end > records {
            return Err(IoError::RowRange { rows, records });
        }

        let width = self.schema.num_columns();
        let mut columns = vec![Vec::with_capacity(rows.len()); width];
        self.each_record(|position, record| {
            if rows.contains(&position) {
                for (index, values) in columns.iter_mut().enumerate() {
                    values.push(cell(record, index));
                }
            }
            position + 1 < rows.end
        })?;

        let mut slice = DataSlice::new(rows.start);
        for (descriptor, values) in self.schema.columns.iter().zip(columns) {
            slice.add_column(&descriptor.name, convert(values, descriptor, rows.start)?);
        }
        Ok(slice)
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn format_name(&self) -> &'static str {
        match self.options.delimiter {
            b'\t' => FileFormat::Tsv.name(),
            _ => FileFormat::Csv.name(),
        }
    }
}

fn csv_reader(path: &Path, options: CsvOptions) -> IoResult<csv::Reader<File>> {
    Ok(csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(options.has_header)
        .flexible(true)
        .from_reader(File::open(path)?))
}

fn cell(record: &StringRecord, index: usize) -> String {
    record.get(index).unwrap_or_default().to_string()
}

/// Count records and infer each column's type from the leading rows
///
/// Nullability is tracked over the whole file.
fn scan_schema(reader: &mut csv::Reader<File>, has_header: bool) -> IoResult<DataSchema> {
    let mut names: Vec<String> = if has_header {
        reader.headers()?.iter().map(str::to_string).collect()
    } else {
        Vec::new()
    };
    let mut samplers = vec![TypeSampler::default(); names.len()];

    let mut record = StringRecord::new();
    let mut num_records = 0;
    while reader.read_record(&mut record)? {
        if num_records == 0 && !has_header {
            names = (0..record.len()).map(|i| format!("col_{}", i)).collect();
            samplers = vec![TypeSampler::default(); names.len()];
        }
        let sampling = num_records < INFERENCE_ROWS;
        for (index, sampler) in samplers.iter_mut().enumerate() {
            match record.get(index) {
                None | Some("") => sampler.nullable = true,
                Some(value) if sampling => sampler.observe(value),
                Some(_) => {}
            }
        }
        num_records += 1;
    }

    let columns = names
        .into_iter()
        .zip(samplers)
        .map(|(name, sampler)| {
            ColumnDescriptor::new(name, sampler.column_type()).with_nullable(sampler.nullable)
        })
        .collect();
    Ok(DataSchema::new(columns, num_records))
}

/// Narrowest type that every observed value parses as
#[derive(Debug, Clone)]
struct TypeSampler {
    observed: usize,
    int: bool,
    float: bool,
    boolean: bool,
    nullable: bool,
}

impl Default for TypeSampler {
    fn default() -> Self {
        Self {
            observed: 0,
            int: true,
            float: true,
            boolean: true,
            nullable: false,
        }
    }
}

impl TypeSampler {
    fn observe(&mut self, value: &str) {
        self.observed += 1;
        self.int &= value.parse::<i64>().is_ok();
        self.float &= value.parse::<f64>().is_ok();
        self.boolean &= matches!(
            value.to_ascii_lowercase().as_str(),
            "true" | "false" | "yes" | "no"
        );
    }

    /// Integer columns with empty cells widen to Float64 (empty as NaN);
    /// boolean columns with empty cells stay raw strings
    fn column_type(&self) -> ColumnType {
        match self {
            Self { observed: 0, .. } => ColumnType::String,
            Self { int: true, nullable: false, .. } => ColumnType::Int64,
            Self { float: true, .. } => ColumnType::Float64,
            Self { boolean: true, nullable: false, .. } => ColumnType::Bool,
            _ => ColumnType::String,
        }
    }
}

/// Convert raw cells to the column's inferred type
///
/// Types come from the leading rows only, so a later cell may not fit. That
/// cell is a `MalformedValue` with its 1-based data row. Empty Float64 cells
/// are NaN.
fn convert(
    values: Vec<String>,
    column: &ColumnDescriptor,
    first_row: usize,
) -> IoResult<DataColumn> {
    let malformed = |i: usize, value: &str| IoError::MalformedValue {
        column: column.name.clone(),
        row: first_row + i + 1,
        value: value.to_string(),
    };

    Ok(match column.dtype {
        ColumnType::Int64 => DataColumn::Int64(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| v.parse::<i64>().map_err(|_| malformed(i, v)))
                .collect::<IoResult<_>>()?,
        ),
        ColumnType::Float64 => DataColumn::Float64(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| match v.as_str() {
                    "" => Ok(f64::NAN),
                    _ => v.parse::<f64>().map_err(|_| malformed(i, v)),
                })
                .collect::<IoResult<_>>()?,
        ),
        ColumnType::Bool => DataColumn::Bool(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| match v.to_ascii_lowercase().as_str() {
                    "true" | "yes" => Ok(true),
                    "false" | "no" => Ok(false),
                    _ => Err(malformed(i, v)),
                })
                .collect::<IoResult<_>>()?,
        ),
        ColumnType::String => DataColumn::String(values),
    })
}
