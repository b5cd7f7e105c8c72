//! Result Table Module
//! Validated, immutable benchmark results keyed by column name.

use polars::prelude::*;
use thiserror::Error;

/// Canonical name of the x-axis column inside a loaded table.
pub const SIZE_COLUMN: &str = "size";

#[derive(Error, Debug)]
pub enum TableError {
    #[error("table has no data rows")]
    Empty,
    #[error("column '{0}' is declared twice")]
    DuplicateColumn(String),
    #[error("column '{column}' has {found} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
    #[error("column '{column}' row {row}: value {value} is not finite")]
    NotFinite {
        column: String,
        row: usize,
        value: f64,
    },
    #[error("column '{column}' row {row}: negative cost {value}")]
    NegativeValue {
        column: String,
        row: usize,
        value: f64,
    },
    #[error("size must be strictly increasing: row {row} has {value} after {previous}")]
    SizeNotIncreasing {
        row: usize,
        previous: f64,
        value: f64,
    },
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Benchmark results for one workload: a `size` column plus one cost column
/// per structure, rows in sweep order.
///
/// Rows are 1-based in every error, matching data lines after the header.
#[derive(Debug, Clone)]
pub struct ResultTable {
    df: DataFrame,
}

impl ResultTable {
    /// Build a table from in-memory columns, enforcing the sweep invariants:
    /// at least one row, equal column lengths, strictly increasing sizes and
    /// finite non-negative costs.
    pub fn from_columns(
        sizes: Vec<f64>,
        series: Vec<(String, Vec<f64>)>,
    ) -> Result<Self, TableError> {
        if sizes.is_empty() {
            return Err(TableError::Empty);
        }

        for (i, pair) in sizes.windows(2).enumerate() {
            if !(pair[1] > pair[0]) {
                return Err(TableError::SizeNotIncreasing {
                    row: i + 2,
                    previous: pair[0],
                    value: pair[1],
                });
            }
        }
        Self::check_finite(SIZE_COLUMN, &sizes)?;

        let mut columns = vec![Column::new(SIZE_COLUMN.into(), sizes.as_slice())];
        let mut seen: Vec<&str> = Vec::with_capacity(series.len());

        for (name, values) in &series {
            if name == SIZE_COLUMN || seen.contains(&name.as_str()) {
                return Err(TableError::DuplicateColumn(name.clone()));
            }
            seen.push(name);

            if values.len() != sizes.len() {
                return Err(TableError::LengthMismatch {
                    column: name.clone(),
                    expected: sizes.len(),
                    found: values.len(),
                });
            }
            Self::check_finite(name, values)?;
            if let Some((i, &v)) = values.iter().enumerate().find(|(_, v)| **v < 0.0) {
                return Err(TableError::NegativeValue {
                    column: name.clone(),
                    row: i + 1,
                    value: v,
                });
            }

            columns.push(Column::new(name.as_str().into(), values.as_slice()));
        }

        let df = DataFrame::new(columns)?;
        Ok(Self { df })
    }

    fn check_finite(column: &str, values: &[f64]) -> Result<(), TableError> {
        match values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            Some((i, &v)) => Err(TableError::NotFinite {
                column: column.to_string(),
                row: i + 1,
                value: v,
            }),
            None => Ok(()),
        }
    }

    /// Number of measurement rows.
    pub fn len(&self) -> usize {
        self.df.height()
    }

    /// Input sizes in sweep order.
    pub fn sizes(&self) -> Vec<f64> {
        self.column_values(SIZE_COLUMN).unwrap_or_default()
    }

    /// Cost values of one series, or `None` if the table has no such column.
    pub fn series(&self, id: &str) -> Option<Vec<f64>> {
        if id == SIZE_COLUMN {
            return None;
        }
        self.column_values(id)
    }

    /// Series identifiers in column order.
    pub fn series_ids(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .filter(|s| s != SIZE_COLUMN)
            .collect()
    }

    fn column_values(&self, name: &str) -> Option<Vec<f64>> {
        let column = self.df.column(name).ok()?;
        let values = column.f64().ok()?;
        Some(values.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(ids: &[&str], rows: &[Vec<f64>]) -> Vec<(String, Vec<f64>)> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| (id.to_string(), rows.iter().map(|r| r[i]).collect()))
            .collect()
    }

    #[test]
    fn keeps_column_order_and_values() {
        let table = ResultTable::from_columns(
            vec![10.0, 20.0],
            columns(&["rb", "avl"], &[vec![5.0, 4.0], vec![9.0, 8.0]]),
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.sizes(), vec![10.0, 20.0]);
        assert_eq!(table.series_ids(), vec!["rb", "avl"]);
        assert_eq!(table.series("avl"), Some(vec![4.0, 8.0]));
        assert_eq!(table.series("size"), None);
        assert_eq!(table.series("b5"), None);
    }

    #[test]
    fn rejects_non_increasing_sizes() {
        let err = ResultTable::from_columns(
            vec![10.0, 20.0, 20.0],
            columns(&["avl"], &[vec![1.0], vec![2.0], vec![3.0]]),
        )
        .unwrap_err();

        assert!(matches!(err, TableError::SizeNotIncreasing { row: 3, .. }));
    }

    #[test]
    fn rejects_negative_costs() {
        let err = ResultTable::from_columns(
            vec![1.0, 2.0],
            columns(&["avl"], &[vec![1.0], vec![-2.0]]),
        )
        .unwrap_err();

        assert!(matches!(err, TableError::NegativeValue { row: 2, .. }));
    }

    #[test]
    fn rejects_ragged_columns() {
        let err = ResultTable::from_columns(
            vec![1.0, 2.0],
            vec![("avl".to_string(), vec![1.0])],
        )
        .unwrap_err();

        assert!(matches!(
            err,
            TableError::LengthMismatch {
                expected: 2,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn rejects_empty_table() {
        let err = ResultTable::from_columns(Vec::new(), Vec::new()).unwrap_err();
        assert!(matches!(err, TableError::Empty));
    }
}
