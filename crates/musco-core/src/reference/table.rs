//! Time-series tables
//!
//! [`TimeSeriesTableVec3`] stores one 3-vector per time point and column.
//! Column labels are not required to be unique when a table is built; use
//! [`check_redundant_labels`] before resolving labels to model entities.
//!
//! Reference files are JSON documents of the form
//!
//! ```text
//! { "times": [t₀, t₁, ...],
//!   "labels": ["/bodyset/a", ...],
//!   "data": [[[x, y, z], ...one per label], ...one per time] }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ReferenceError;

/// Table of scalar columns sharing one time column
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeSeriesTable {
    times: Vec<f64>,
    labels: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl TimeSeriesTable {
    pub fn new(times: Vec<f64>) -> Self {
        Self {
            times,
            labels: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn append_column(
        &mut self,
        label: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), ReferenceError> {
        let label = label.into();
        if values.len() != self.times.len() {
            return Err(ReferenceError::ColumnLength {
                label,
                expected: self.times.len(),
                got: values.len(),
            });
        }
        self.labels.push(label);
        self.columns.push(values);
        Ok(())
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, label: &str) -> Option<&[f64]> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.columns[i].as_slice())
    }

    /// Columns in label order
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.labels
            .iter()
            .zip(&self.columns)
            .map(|(l, c)| (l.as_str(), c.as_slice()))
    }
}

/// Table of 3-vector columns sharing one time column
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeSeriesTableVec3 {
    times: Vec<f64>,
    labels: Vec<String>,
    columns: Vec<Vec<Vector3<f64>>>,
}

/// On-disk layout: row-major, one row per time point
#[derive(Debug, Deserialize)]
struct TableFile {
    times: Vec<f64>,
    labels: Vec<String>,
    data: Vec<Vec<[f64; 3]>>,
}

impl TimeSeriesTableVec3 {
    pub fn new(times: Vec<f64>) -> Self {
        Self {
            times,
            labels: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Read a table from a JSON reference file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ReferenceError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|source| ReferenceError::Io {
            path: display.clone(),
            source,
        })?;
        let file: TableFile = serde_json::from_str(&text).map_err(|source| {
            ReferenceError::Parse {
                path: display,
                source,
            }
        })?;
        let table = Self::from_rows(file.times, file.labels, file.data)?;
        debug!(
            path = %path.display(),
            rows = table.num_rows(),
            columns = table.num_columns(),
            "loaded reference table"
        );
        Ok(table)
    }

    /// Build a table from row-major data
    pub fn from_rows(
        times: Vec<f64>,
        labels: Vec<String>,
        rows: Vec<Vec<[f64; 3]>>,
    ) -> Result<Self, ReferenceError> {
        if rows.len() != times.len() {
            return Err(ReferenceError::ColumnLength {
                label: labels.first().cloned().unwrap_or_default(),
                expected: times.len(),
                got: rows.len(),
            });
        }
        let mut columns = vec![Vec::with_capacity(times.len()); labels.len()];
        for (row_index, row) in rows.iter().enumerate() {
            if row.len() != labels.len() {
                return Err(ReferenceError::RowWidth {
                    row: row_index,
                    expected: labels.len(),
                    got: row.len(),
                });
            }
            for (column, v) in columns.iter_mut().zip(row) {
                column.push(Vector3::new(v[0], v[1], v[2]));
            }
        }
        Ok(Self {
            times,
            labels,
            columns,
        })
    }

    pub fn append_column(
        &mut self,
        label: impl Into<String>,
        values: Vec<Vector3<f64>>,
    ) -> Result<(), ReferenceError> {
        let label = label.into();
        if values.len() != self.times.len() {
            return Err(ReferenceError::ColumnLength {
                label,
                expected: self.times.len(),
                got: values.len(),
            });
        }
        self.labels.push(label);
        self.columns.push(values);
        Ok(())
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn num_rows(&self) -> usize {
        self.times.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// First column with this label
    pub fn column(&self, label: &str) -> Option<&[Vector3<f64>]> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.columns[i].as_slice())
    }

    /// New table holding exactly the requested columns, in request order
    pub fn select(&self, labels: &[String]) -> Result<Self, ReferenceError> {
        let mut selected = Self::new(self.times.clone());
        for label in labels {
            let column = self
                .column(label)
                .ok_or_else(|| ReferenceError::MissingColumn(label.clone()))?;
            selected.labels.push(label.clone());
            selected.columns.push(column.to_vec());
        }
        Ok(selected)
    }

    /// Split every column into three scalar columns `label + suffix`
    pub fn flatten(&self, suffixes: [&str; 3]) -> TimeSeriesTable {
        let mut flat = TimeSeriesTable::new(self.times.clone());
        for (label, column) in self.labels.iter().zip(&self.columns) {
            for (axis, suffix) in suffixes.iter().enumerate() {
                flat.labels.push(format!("{}{}", label, suffix));
                flat.columns.push(column.iter().map(|v| v[axis]).collect());
            }
        }
        flat
    }
}

/// Fail on the first label that appears more than once
pub fn check_redundant_labels(labels: &[String]) -> Result<(), ReferenceError> {
    let mut seen = HashSet::with_capacity(labels.len());
    for label in labels {
        if !seen.insert(label.as_str()) {
            return Err(ReferenceError::RedundantColumn(label.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_frame_table() -> TimeSeriesTableVec3 {
        let mut table = TimeSeriesTableVec3::new(vec![0.0, 0.5, 1.0]);
        table
            .append_column("/bodyset/a", vec![Vector3::new(1.0, 2.0, 3.0); 3])
            .unwrap();
        table
            .append_column("/bodyset/b", vec![Vector3::zeros(); 3])
            .unwrap();
        table
    }

    #[test]
    fn test_append_checks_length() {
        let mut table = TimeSeriesTableVec3::new(vec![0.0, 1.0]);
        let err = table
            .append_column("/bodyset/a", vec![Vector3::zeros()])
            .unwrap_err();
        assert!(matches!(
            err,
            ReferenceError::ColumnLength { expected: 2, got: 1, .. }
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn test_select_keeps_request_order() {
        let table = two_frame_table();
        let selected = table
            .select(&["/bodyset/b".to_string(), "/bodyset/a".to_string()])
            .unwrap();
        assert_eq!(selected.labels(), &["/bodyset/b", "/bodyset/a"]);
        assert_eq!(selected.column("/bodyset/a").unwrap()[0].x, 1.0);
    }

    #[test]
    fn test_select_missing_column() {
        let table = two_frame_table();
        let err = table.select(&["/bodyset/c".to_string()]).unwrap_err();
        assert!(matches!(err, ReferenceError::MissingColumn(ref l) if l == "/bodyset/c"));
    }

    #[test]
    fn test_flatten_component_labels() {
        let flat = two_frame_table().flatten(["_x", "_y", "_z"]);
        assert_eq!(flat.num_columns(), 6);
        assert_eq!(flat.labels()[1], "/bodyset/a_y");
        assert_eq!(flat.column("/bodyset/a_z").unwrap(), &[3.0, 3.0, 3.0]);
    }

    #[test]
    fn test_redundant_labels() {
        let mut table = two_frame_table();
        table
            .append_column("/bodyset/a", vec![Vector3::zeros(); 3])
            .unwrap();
        assert!(matches!(
            check_redundant_labels(table.labels()),
            Err(ReferenceError::RedundantColumn(ref l)) if l == "/bodyset/a"
        ));
        assert!(check_redundant_labels(two_frame_table().labels()).is_ok());
    }

    #[test]
    fn test_from_rows_checks_width() {
        let err = TimeSeriesTableVec3::from_rows(
            vec![0.0],
            vec!["a".to_string(), "b".to_string()],
            vec![vec![[0.0; 3]]],
        )
        .unwrap_err();
        assert!(matches!(err, ReferenceError::RowWidth { row: 0, expected: 2, got: 1 }));
    }

    #[test]
    fn test_json_file_roundtrip() {
        let path = std::env::temp_dir().join(format!(
            "musco_reference_{}.json",
            std::process::id()
        ));
        fs::write(
            &path,
            r#"{"times": [0.0, 1.0],
                "labels": ["/bodyset/a"],
                "data": [[[1.0, 0.0, 0.0]], [[2.0, 0.0, 0.0]]]}"#,
        )
        .unwrap();

        let table = TimeSeriesTableVec3::from_json_file(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.column("/bodyset/a").unwrap()[1].x, 2.0);
    }

    #[test]
    fn test_missing_file() {
        let err = TimeSeriesTableVec3::from_json_file("/nonexistent/reference.json").unwrap_err();
        assert!(matches!(err, ReferenceError::Io { .. }));
    }
}
