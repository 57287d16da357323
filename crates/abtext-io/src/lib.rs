//! abtext-io - Data I/O for tabular project datasets
//!
//! This crate provides readers for delimited text exports:
//!
//! - **CSV**: Comma-separated values with type inference
//! - **TSV**: Tab-separated values (same reader, different delimiter)
//!
//! # Design
//!
//! Readers implement the `DataReader` trait. `open_file` picks one from
//! the file extension through `FileFormat`.
//! Free-text columns can be pulled as raw strings in a single pass with
//! `CsvReader::read_string_columns`, which never coerces their contents.

pub mod csv_reader;
pub mod reader;
pub mod schema;

pub use csv_reader::{CsvOptions, CsvReader};
pub use reader::*;
pub use schema::*;
