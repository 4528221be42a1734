//! Column-oriented tables.
//!
//! A [`Table`] is an ordered set of equally long, uniquely named
//! [`Column`]s. It is deliberately small: just enough to hold one ISARIC
//! project table (presentation, outcome, daily, or an events table) and to
//! support the selection, filtering and column edits the toolkit needs.
//!
//! # Example
//!
//! ```
//! use isaric_core::{Column, Table, Value};
//!
//! let mut table = Table::from_columns(vec![
//!     Column::new("subjid", vec!["A-1".into(), "A-2".into()]),
//!     Column::new("age", vec![Value::Number(34.0), Value::Null]),
//! ])
//! .unwrap();
//!
//! assert_eq!(table.n_rows(), 2);
//! table.remove_column("age").unwrap();
//! assert_eq!(table.column_names(), vec!["subjid"]);
//! ```

use std::collections::HashSet;
use std::io::Write;

use crate::error::{Error, Result};
use crate::value::Value;

/// A named column of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name (the data dictionary `field_name`).
    pub name: String,
    /// One value per row.
    pub values: Vec<Value>,
}

impl Column {
    /// Creates a column.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Number of values in the column.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the column holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of missing values.
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// Iterate over the non-missing values.
    pub fn non_null(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().filter(|v| !v.is_null())
    }
}

/// An ordered collection of equally long, uniquely named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    /// Creates an empty table with no columns and no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from columns.
    ///
    /// Fails if two columns share a name or the columns differ in length.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let n_rows = columns.first().map(Column::len).unwrap_or(0);
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(Error::duplicate_field(column.name.as_str(), None));
            }
            if column.len() != n_rows {
                return Err(Error::LengthMismatch {
                    expected: n_rows,
                    actual: column.len(),
                });
            }
        }
        Ok(Self { columns, n_rows })
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// All columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Look up a column by name for modification.
    ///
    /// The column length must not be changed through this reference.
    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Position of a column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Returns `true` if a column with this name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Append a column at the end.
    pub fn add_column(&mut self, column: Column) -> Result<()> {
        let at = self.columns.len();
        self.insert_column(at, column)
    }

    /// Insert a column at `index` (clamped to the number of columns).
    ///
    /// The first column added to an empty, column-less table sets the row count.
    pub fn insert_column(&mut self, index: usize, column: Column) -> Result<()> {
        if self.has_column(&column.name) {
            return Err(Error::duplicate_field(column.name, None));
        }
        if self.columns.is_empty() {
            self.n_rows = column.len();
        } else if column.len() != self.n_rows {
            return Err(Error::LengthMismatch {
                expected: self.n_rows,
                actual: column.len(),
            });
        }
        let index = index.min(self.columns.len());
        self.columns.insert(index, column);
        Ok(())
    }

    /// Remove a column and return it.
    pub fn remove_column(&mut self, name: &str) -> Result<Column> {
        let index = self
            .column_index(name)
            .ok_or_else(|| Error::unknown_field(name, None))?;
        Ok(self.columns.remove(index))
    }

    /// New table holding only the named columns, in the order given.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Table> {
        let columns = names
            .iter()
            .map(|name| {
                self.column(name.as_ref())
                    .cloned()
                    .ok_or_else(|| Error::unknown_field(name.as_ref(), None))
            })
            .collect::<Result<Vec<_>>>()?;
        Table::from_columns(columns)
    }

    /// New table holding the rows at `indices`, in the order given.
    ///
    /// Out-of-range indices are skipped.
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        let indices: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < self.n_rows)
            .collect();
        let columns = self
            .columns
            .iter()
            .map(|c| {
                let values = indices.iter().map(|&i| c.values[i].clone()).collect();
                Column::new(c.name.clone(), values)
            })
            .collect();
        Table {
            columns,
            n_rows: indices.len(),
        }
    }

    /// New table holding the rows where `mask` is true.
    pub fn filter(&self, mask: &[bool]) -> Result<Table> {
        if mask.len() != self.n_rows {
            return Err(Error::LengthMismatch {
                expected: self.n_rows,
                actual: mask.len(),
            });
        }
        let indices: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, keep)| keep.then_some(i))
            .collect();
        Ok(self.take_rows(&indices))
    }

    /// Row view at `index`, or `None` when out of range.
    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        (index < self.n_rows).then_some(Row { table: self, index })
    }

    /// Iterate over all rows.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.n_rows).map(move |index| Row { table: self, index })
    }

    /// Write the table as CSV with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.column_names())?;
        for row in self.rows() {
            wtr.write_record(self.columns.iter().map(|c| c.values[row.index].as_text()))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Row<'a> {
    /// Row position in the table.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Value of the named column in this row.
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.table.column(name).map(|c| &c.values[self.index])
    }
}
