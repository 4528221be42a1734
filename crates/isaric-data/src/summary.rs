//! Descriptive statistics for project tables.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::NaiveDateTime;
use isaric_core::value::DATETIME_DISPLAY_FORMAT;
use isaric_core::{Column, SUBJECT_ID_FIELD, Table, Value};

use crate::core::IsaricData;
use crate::dictionary::{DataDictionary, FieldType};

/// Statistics for one column, chosen by the kind of values it holds.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnStats {
    /// All non-missing values are numbers.
    Numeric {
        /// Arithmetic mean.
        mean: f64,
        /// Sample standard deviation; `None` with fewer than two values.
        std: Option<f64>,
        /// Smallest value.
        min: f64,
        /// Median.
        median: f64,
        /// Largest value.
        max: f64,
    },
    /// Text, categorical, or mixed values.
    Categorical {
        /// Number of distinct values.
        unique: usize,
        /// Most frequent value (first seen wins ties).
        top: String,
        /// Frequency of `top`.
        freq: usize,
    },
    /// All non-missing values are datetimes.
    DateTime {
        /// Earliest value.
        min: NaiveDateTime,
        /// Latest value.
        max: NaiveDateTime,
    },
    /// All non-missing values are booleans.
    Boolean {
        /// Number of true values.
        n_true: usize,
    },
    /// Every value is missing.
    Empty,
}

/// Summary of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    /// Column name.
    pub name: String,
    /// Type recorded in the dictionary, if any.
    pub field_type: Option<FieldType>,
    /// Number of non-missing values.
    pub count: usize,
    /// Number of missing values.
    pub missing: usize,
    /// Statistics.
    pub stats: ColumnStats,
}

impl ColumnSummary {
    /// Summarise a column.
    pub fn of(column: &Column, field_type: Option<FieldType>) -> Self {
        let present: Vec<&Value> = column.non_null().collect();
        Self {
            name: column.name.clone(),
            field_type,
            count: present.len(),
            missing: column.null_count(),
            stats: stats_for(&present),
        }
    }
}

fn stats_for(values: &[&Value]) -> ColumnStats {
    if values.is_empty() {
        return ColumnStats::Empty;
    }
    if values.iter().all(|v| matches!(v, Value::Number(_))) {
        let numbers: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
        return numeric_stats(numbers);
    }
    if values.iter().all(|v| matches!(v, Value::Bool(_))) {
        let n_true = values.iter().filter(|v| v.as_bool() == Some(true)).count();
        return ColumnStats::Boolean { n_true };
    }
    let datetimes: Vec<NaiveDateTime> = values
        .iter()
        .filter_map(|v| match v {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        })
        .collect();
    if datetimes.len() == values.len() {
        if let (Some(min), Some(max)) = (datetimes.iter().min(), datetimes.iter().max()) {
            return ColumnStats::DateTime {
                min: *min,
                max: *max,
            };
        }
    }
    categorical_stats(values)
}

fn numeric_stats(mut numbers: Vec<f64>) -> ColumnStats {
    let n = numbers.len() as f64;
    let mean = numbers.iter().sum::<f64>() / n;
    let std = (numbers.len() > 1).then(|| {
        let ss: f64 = numbers.iter().map(|x| (x - mean).powi(2)).sum();
        (ss / (n - 1.0)).sqrt()
    });
    numbers.sort_by(f64::total_cmp);
    let mid = numbers.len() / 2;
    let median = if numbers.len() % 2 == 0 {
        (numbers[mid - 1] + numbers[mid]) / 2.0
    } else {
        numbers[mid]
    };
    ColumnStats::Numeric {
        mean,
        std,
        min: numbers[0],
        median,
        max: numbers[numbers.len() - 1],
    }
}

fn categorical_stats(values: &[&Value]) -> ColumnStats {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    for value in values {
        let text = value.as_text();
        let count = counts.entry(text.clone()).or_insert(0);
        if *count == 0 {
            order.push(text);
        }
        *count += 1;
    }
    let mut top = String::new();
    let mut freq = 0;
    for text in order {
        let count = counts[&text];
        if count > freq {
            freq = count;
            top = text;
        }
    }
    ColumnStats::Categorical {
        unique: counts.len(),
        top,
        freq,
    }
}

/// Summary of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSummary {
    /// Table name.
    pub name: String,
    /// Number of rows.
    pub n_rows: usize,
    /// Number of distinct subjects.
    pub n_subjects: usize,
    /// One summary per column other than the subject identifier.
    pub columns: Vec<ColumnSummary>,
}

impl TableSummary {
    /// Summarise a table, taking field types from the dictionary.
    pub fn of(name: &str, table: &Table, dictionary: &DataDictionary) -> Self {
        let columns = table
            .columns()
            .iter()
            .filter(|c| c.name != SUBJECT_ID_FIELD)
            .map(|c| {
                let field_type = dictionary
                    .entry_in(name, &c.name)
                    .map(|e| e.field_type.clone());
                ColumnSummary::of(c, field_type)
            })
            .collect();
        Self {
            name: name.to_string(),
            n_rows: table.n_rows(),
            n_subjects: count_subjects(table),
            columns,
        }
    }

    /// Summary of a named column.
    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| c.name == name)
    }
}

fn count_subjects(table: &Table) -> usize {
    table
        .column(SUBJECT_ID_FIELD)
        .map(|ids| {
            ids.non_null()
                .map(Value::as_text)
                .collect::<HashSet<_>>()
                .len()
        })
        .unwrap_or(0)
}

/// Summary of a whole project.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSummary {
    /// Number of data dictionary entries.
    pub n_dictionary_fields: usize,
    /// Number of distinct subjects in the presentation table.
    pub n_subjects: usize,
    /// One summary per loaded table.
    pub tables: Vec<TableSummary>,
}

impl DataSummary {
    /// Summarise every table of the project.
    pub fn of(data: &IsaricData) -> Self {
        let tables = data
            .table_names()
            .iter()
            .filter_map(|name| {
                data.table(name)
                    .ok()
                    .map(|t| TableSummary::of(name, t, &data.data_dictionary))
            })
            .collect();
        Self {
            n_dictionary_fields: data.data_dictionary.len(),
            n_subjects: count_subjects(&data.presentation),
            tables,
        }
    }

    /// Summary of a named table.
    pub fn table(&self, name: &str) -> Option<&TableSummary> {
        self.tables.iter().find(|t| t.name == name)
    }
}

impl fmt::Display for DataSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} table(s), {} dictionary field(s), {} subject(s)",
            self.tables.len(),
            self.n_dictionary_fields,
            self.n_subjects
        )?;
        for table in &self.tables {
            write!(f, "{table}")?;
        }
        Ok(())
    }
}

impl fmt::Display for TableSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "\n{} ({} rows, {} subjects, {} columns)",
            self.name,
            self.n_rows,
            self.n_subjects,
            self.columns.len()
        )?;
        let width = self.columns.iter().map(|c| c.name.len()).max().unwrap_or(0);
        for column in &self.columns {
            let field_type = column
                .field_type
                .as_ref()
                .map(FieldType::name)
                .unwrap_or("-");
            writeln!(
                f,
                "  {:width$}  {:<12} count={} missing={} {}",
                column.name,
                field_type,
                column.count,
                column.missing,
                column.stats,
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for ColumnStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric {
                mean,
                std,
                min,
                median,
                max,
            } => {
                write!(f, "mean={mean:.2}")?;
                if let Some(std) = std {
                    write!(f, " std={std:.2}")?;
                }
                write!(f, " min={min} median={median} max={max}")
            }
            Self::Categorical { unique, top, freq } => {
                write!(f, "unique={unique} top={top:?} freq={freq}")
            }
            Self::DateTime { min, max } => write!(
                f,
                "min={} max={}",
                min.format(DATETIME_DISPLAY_FORMAT),
                max.format(DATETIME_DISPLAY_FORMAT)
            ),
            Self::Boolean { n_true } => write!(f, "true={n_true}"),
            Self::Empty => Ok(()),
        }
    }
}
