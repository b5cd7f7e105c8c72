//! CSV Data Loader Module
//! Decodes benchmark result files into validated `ResultTable`s using Polars.

use super::table::{ResultTable, TableError};
use polars::prelude::*;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("{path}: file not found")]
    NotFound { path: PathBuf },
    #[error("{path}: cannot read file: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: failed to parse CSV: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
    #[error("{path}: missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: String },
    #[error("{path}: column '{column}' row {row}: '{value}' is not a number")]
    NonNumeric {
        path: PathBuf,
        column: String,
        row: usize,
        value: String,
    },
    #[error("{path}: column '{column}' row {row}: missing value")]
    MissingValue {
        path: PathBuf,
        column: String,
        row: usize,
    },
    #[error("{path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: TableError,
    },
}

/// Loads result files that must carry a size column and a fixed set of
/// series columns. Extra columns are ignored.
pub struct DataLoader {
    size_columns: Vec<String>,
    series: Vec<String>,
}

impl DataLoader {
    /// `size_columns` lists the accepted names of the x-axis column,
    /// preferred name first.
    pub fn new(size_columns: &[&str], series: &[String]) -> Self {
        Self {
            size_columns: size_columns.iter().map(|s| s.to_string()).collect(),
            series: series.to_vec(),
        }
    }

    /// Load a CSV file. Rows are kept in file order.
    pub fn load_csv(&self, file_path: &Path) -> Result<ResultTable, LoadError> {
        let path = file_path.to_path_buf();

        match fs::metadata(file_path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                return Err(LoadError::Unreadable {
                    path,
                    source: std::io::Error::new(ErrorKind::InvalidInput, "not a regular file"),
                })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(LoadError::NotFound { path }),
            Err(source) => return Err(LoadError::Unreadable { path, source }),
        }

        let df = LazyCsvReader::new(file_path)
            .with_has_header(true)
            .with_infer_schema_length(None)
            .finish()
            .and_then(|lf| lf.collect())
            .map_err(|source| decode_error(&path, source))?;

        debug!(path = %path.display(), rows = df.height(), columns = df.width(), "decoded csv");

        let size_column = self
            .size_columns
            .iter()
            .find_map(|name| find_column(&df, name))
            .ok_or_else(|| LoadError::MissingColumn {
                path: path.clone(),
                column: self.size_columns.first().cloned().unwrap_or_default(),
            })?;
        let sizes = numeric_values(&path, size_column)?;

        let mut series = Vec::with_capacity(self.series.len());
        for id in &self.series {
            let column = find_column(&df, id).ok_or_else(|| LoadError::MissingColumn {
                path: path.clone(),
                column: id.clone(),
            })?;
            series.push((id.clone(), numeric_values(&path, column)?));
        }

        let table = ResultTable::from_columns(sizes, series)
            .map_err(|source| LoadError::Invalid {
                path: path.clone(),
                source,
            })?;

        info!(path = %path.display(), rows = table.len(), "loaded results");
        Ok(table)
    }
}

/// I/O failures while decoding are read errors, not parse errors.
fn decode_error(path: &Path, source: PolarsError) -> LoadError {
    match source {
        PolarsError::IO { error, .. } => LoadError::Unreadable {
            path: path.to_path_buf(),
            source: std::io::Error::new(error.kind(), error.to_string()),
        },
        source => LoadError::Csv {
            path: path.to_path_buf(),
            source,
        },
    }
}

/// Header names are matched after trimming, so `size, avl` works.
fn find_column<'a>(df: &'a DataFrame, name: &str) -> Option<&'a Column> {
    df.get_columns()
        .iter()
        .find(|col| col.name().as_str().trim() == name)
}

fn numeric_values(path: &Path, column: &Column) -> Result<Vec<f64>, LoadError> {
    let name = column.name().as_str().trim().to_string();
    let missing = |row: usize| LoadError::MissingValue {
        path: path.to_path_buf(),
        column: name.clone(),
        row,
    };
    let csv_err = |source: PolarsError| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    match column.dtype() {
        DataType::Float32
        | DataType::Float64
        | DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => {
            let cast = column.cast(&DataType::Float64).map_err(csv_err)?;
            let values = cast.f64().map_err(csv_err)?;
            values
                .into_iter()
                .enumerate()
                .map(|(i, v)| v.ok_or_else(|| missing(i + 1)))
                .collect()
        }
        // Cells padded with spaces are inferred as text; parse them by hand.
        DataType::String => {
            let values = column.str().map_err(csv_err)?;
            values
                .into_iter()
                .enumerate()
                .map(|(i, cell)| match cell.map(str::trim) {
                    None | Some("") => Err(missing(i + 1)),
                    Some(text) => text.parse::<f64>().map_err(|_| LoadError::NonNumeric {
                        path: path.to_path_buf(),
                        column: name.clone(),
                        row: i + 1,
                        value: text.to_string(),
                    }),
                })
                .collect()
        }
        DataType::Null => Err(missing(1)),
        other => {
            let first = column
                .get(0)
                .map(|v| v.to_string().trim_matches('"').to_string())
                .unwrap_or_else(|_| other.to_string());
            Err(LoadError::NonNumeric {
                path: path.to_path_buf(),
                column: name.clone(),
                row: 1,
                value: first,
            })
        }
    }
}
