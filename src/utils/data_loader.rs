//! CSV loading and saving for tabular datasets

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Data loader for CSV files
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Rows used by polars to infer column types
    infer_schema_length: usize,
    /// Field separator
    separator: u8,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: 100,
            separator: b',',
        }
    }

    /// Set the number of rows scanned for type inference
    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows;
        self
    }

    /// Set the field separator
    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    /// Load a CSV file with a header row
    pub fn load_csv(&self, path: &Path) -> Result<DataFrame> {
        let file = File::open(path)
            .map_err(|e| PipelineError::data_access(format!("cannot open {}", path.display()), e))?;

        let parse_opts = CsvParseOptions::default().with_separator(self.separator);

        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| PipelineError::data_access(format!("cannot parse {}", path.display()), e))
    }
}

/// Save DataFrames as CSV
pub struct DataSaver;

impl DataSaver {
    /// Write a frame (with header) to any writer
    pub fn write_csv<W: Write>(df: &DataFrame, writer: W) -> std::result::Result<(), PolarsError> {
        let mut df = df.clone();
        CsvWriter::new(writer)
            .include_header(true)
            .finish(&mut df)
    }
}
