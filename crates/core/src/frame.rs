//! In-memory tabular data.
//!
//! A [`Frame`] is an ordered list of column names plus rows of [`FieldValue`]
//! cells. Every row also carries a *row label*: `0..n` for a freshly built or
//! freshly read frame, preserved by row selection, concatenation and
//! de-duplication, and turned into a leading `index` column by
//! [`Frame::reset_index`].

use std::collections::HashSet;
use std::fmt;

use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::value::{ColumnKind, FieldValue};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<FieldValue>>,
    labels: Vec<usize>,
}

impl Frame {
    /// Build a frame, checking that every row has one cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<FieldValue>>) -> Result<Self, CoreError> {
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(CoreError::ShapeMismatch(format!(
                "row {} has {} cells, expected {}",
                i,
                row.len(),
                columns.len()
            )));
        }
        let labels = (0..rows.len()).collect();
        Ok(Self {
            columns,
            rows,
            labels,
        })
    }

    /// A frame with columns but no rows.
    pub fn empty(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            labels: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<FieldValue>] {
        &self.rows
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Finds the zero-based index of a column by name (case-sensitive).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn require_column(&self, name: &str) -> Result<usize, CoreError> {
        self.column_index(name)
            .ok_or_else(|| CoreError::ColumnNotFound(name.to_string()))
    }

    /// Retrieves the cell at the given row position and column name.
    pub fn get_value(&self, row: usize, col: &str) -> Option<&FieldValue> {
        let col_idx = self.column_index(col)?;
        self.rows.get(row)?.get(col_idx)
    }

    /// All cells of one column, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<&FieldValue>, CoreError> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Inferred storage kind of every column, in column order.
    pub fn column_kinds(&self) -> Vec<ColumnKind> {
        (0..self.columns.len())
            .map(|i| ColumnKind::infer(self.rows.iter().map(|row| &row[i])))
            .collect()
    }

    /// New frame with the rows at `positions`, in that order, labels kept.
    pub fn select_rows(&self, positions: &[usize]) -> Frame {
        Frame {
            columns: self.columns.clone(),
            rows: positions.iter().map(|&p| self.rows[p].clone()).collect(),
            labels: positions.iter().map(|&p| self.labels[p]).collect(),
        }
    }

    /// Convert `column` to integers in place. Fails on the first cell that
    /// has no integer reading (nulls included).
    pub fn cast_integer(&mut self, column: &str) -> Result<(), CoreError> {
        let idx = self.require_column(column)?;
        for (row_pos, row) in self.rows.iter_mut().enumerate() {
            let cell = &mut row[idx];
            let value = cell.to_i64().ok_or_else(|| CoreError::NonNumeric {
                column: column.to_string(),
                row: row_pos,
                value: cell.to_json().to_string(),
            })?;
            *cell = FieldValue::Integer(value);
        }
        Ok(())
    }

    /// Narrow every cell to its column's inferred kind, so that any subset of
    /// rows is stored with the same column types as the whole frame.
    pub fn unify_kinds(&mut self) {
        let kinds = self.column_kinds();
        for row in &mut self.rows {
            for (cell, kind) in row.iter_mut().zip(&kinds) {
                *cell = cell.coerce(*kind);
            }
        }
    }

    /// Row-wise concatenation. Columns are the union in first-seen order;
    /// cells missing from a source frame are null. Row labels are kept.
    pub fn concat(frames: &[&Frame]) -> Frame {
        let mut columns: Vec<String> = Vec::new();
        for frame in frames {
            for col in &frame.columns {
                if !columns.contains(col) {
                    columns.push(col.clone());
                }
            }
        }

        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for frame in frames {
            let mapping: Vec<Option<usize>> =
                columns.iter().map(|c| frame.column_index(c)).collect();
            for (row, &label) in frame.rows.iter().zip(&frame.labels) {
                rows.push(
                    mapping
                        .iter()
                        .map(|m| m.map(|i| row[i].clone()).unwrap_or(FieldValue::Null))
                        .collect(),
                );
                labels.push(label);
            }
        }

        Frame {
            columns,
            rows,
            labels,
        }
    }

    /// Remove rows equal in every column to an earlier row. Labels are not
    /// part of the comparison; the first occurrence keeps its label.
    pub fn drop_duplicates(&self) -> Frame {
        let mut seen: HashSet<&[FieldValue]> = HashSet::with_capacity(self.rows.len());
        let positions: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| seen.insert(row.as_slice()))
            .map(|(i, _)| i)
            .collect();
        self.select_rows(&positions)
    }

    /// Move the row labels into a leading column and renumber rows `0..n`.
    ///
    /// The column is named `index`, or `level_0` when `index` is taken.
    pub fn reset_index(&self) -> Result<Frame, CoreError> {
        let name = ["index", "level_0"]
            .into_iter()
            .find(|n| self.column_index(n).is_none())
            .ok_or_else(|| {
                CoreError::ShapeMismatch("cannot reset index: 'index' and 'level_0' both exist".into())
            })?;

        let mut columns = Vec::with_capacity(self.columns.len() + 1);
        columns.push(name.to_string());
        columns.extend(self.columns.iter().cloned());

        let rows = self
            .rows
            .iter()
            .zip(&self.labels)
            .map(|(row, &label)| {
                let mut out = Vec::with_capacity(row.len() + 1);
                out.push(FieldValue::Integer(label as i64));
                out.extend(row.iter().cloned());
                out
            })
            .collect();

        Frame::new(columns, rows)
    }

    /// One JSON object per row, keys in column order.
    pub fn to_json_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(col, cell)| (col.clone(), cell.to_json()))
                    .collect()
            })
            .collect()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.columns.is_empty() {
            return write!(f, "(empty frame)");
        }

        // Compute column widths (minimum = header length).
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.len()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.to_string().len());
            }
        }

        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{:<width$}", col, width = widths[i])?;
        }
        writeln!(f)?;

        for (i, w) in widths.iter().enumerate() {
            if i > 0 {
                write!(f, "-+-")?;
            }
            write!(f, "{}", "-".repeat(*w))?;
        }
        writeln!(f)?;

        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    write!(f, " | ")?;
                }
                write!(f, "{:<width$}", cell.to_string(), width = widths[i])?;
            }
            writeln!(f)?;
        }

        write!(f, "({} rows)", self.rows.len())
    }
}
