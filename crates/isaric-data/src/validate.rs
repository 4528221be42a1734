//! Full validation of project data against its data dictionary.

use std::collections::{HashMap, HashSet};
use std::fmt;

use isaric_core::{SUBJECT_ID_FIELD, Table, Value};

use crate::core::{IsaricData, PRESENTATION};
use crate::dictionary::{DictionaryEntry, FieldType};

/// How many offending values to quote in one issue.
const MAX_EXAMPLES: usize = 3;

/// Severity of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Suspicious but usable.
    Warning,
    /// The data does not match its schema.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One problem found during validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// How serious the problem is.
    pub severity: Severity,
    /// Table concerned, if any.
    pub table: Option<String>,
    /// Field concerned, if any.
    pub field: Option<String>,
    /// Description.
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.severity)?;
        match (&self.table, &self.field) {
            (Some(table), Some(field)) => write!(f, " {table}.{field}:")?,
            (Some(table), None) => write!(f, " {table}:")?,
            (None, Some(field)) => write!(f, " {field}:")?,
            (None, None) => {}
        }
        write!(f, " {}", self.message)
    }
}

/// All issues found in one validation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Run every check against `data`.
    pub fn check(data: &IsaricData) -> Self {
        let mut report = Self::default();

        report.check_structure(data);
        report.check_dictionary_duplicates(data);
        report.check_subjects(data);
        for table_name in data.table_names() {
            if let Ok(table) = data.table(&table_name) {
                report.check_columns(data, &table_name, table);
            }
        }
        report.check_unknown_dictionary_tables(data);
        report
    }

    /// All issues in the order found.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Error-severity issues.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    /// Warning-severity issues.
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    /// Returns `true` if there are no errors.
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    fn push(
        &mut self,
        severity: Severity,
        table: Option<&str>,
        field: Option<&str>,
        message: impl Into<String>,
    ) {
        self.issues.push(ValidationIssue {
            severity,
            table: table.map(str::to_string),
            field: field.map(str::to_string),
            message: message.into(),
        });
    }

    fn check_structure(&mut self, data: &IsaricData) {
        if let Err(e) = data.validate_metadata() {
            self.push(Severity::Error, None, None, e.to_string());
        }
        if let Err(e) = data.validate_data_dictionary() {
            self.push(Severity::Error, None, None, e.to_string());
        }
        for table_name in data.table_names() {
            if data.validate_table(&table_name).is_err() {
                self.push(
                    Severity::Error,
                    Some(&table_name),
                    Some(SUBJECT_ID_FIELD),
                    "subject identifier column is missing",
                );
            }
        }
    }

    fn check_dictionary_duplicates(&mut self, data: &IsaricData) {
        let mut seen = HashSet::new();
        for entry in data.data_dictionary.entries() {
            if !seen.insert((entry.table_name.as_str(), entry.field_name.as_str())) {
                self.push(
                    Severity::Error,
                    Some(&entry.table_name),
                    Some(&entry.field_name),
                    "field is defined more than once in the data dictionary",
                );
            }
        }
    }

    fn check_subjects(&mut self, data: &IsaricData) {
        let Some(ids) = data.presentation.column(SUBJECT_ID_FIELD) else {
            return;
        };
        let known: HashSet<String> = ids.non_null().map(Value::as_text).collect();
        if ids.null_count() > 0 {
            self.push(
                Severity::Error,
                Some(PRESENTATION),
                Some(SUBJECT_ID_FIELD),
                format!("{} rows have no subject identifier", ids.null_count()),
            );
        }

        for table_name in data.table_names() {
            if table_name == PRESENTATION {
                continue;
            }
            let Some(column) = data
                .table(&table_name)
                .ok()
                .and_then(|t| t.column(SUBJECT_ID_FIELD))
            else {
                continue;
            };
            let mut unknown: Vec<String> = column
                .non_null()
                .map(Value::as_text)
                .filter(|id| !known.contains(id))
                .collect();
            unknown.sort();
            unknown.dedup();
            if !unknown.is_empty() {
                self.push(
                    Severity::Error,
                    Some(&table_name),
                    Some(SUBJECT_ID_FIELD),
                    format!(
                        "{} subject(s) not present in {PRESENTATION}: {}",
                        unknown.len(),
                        examples(&unknown)
                    ),
                );
            }
        }
    }

    fn check_columns(&mut self, data: &IsaricData, table_name: &str, table: &Table) {
        let entries: HashMap<&str, &DictionaryEntry> = data
            .data_dictionary
            .fields_for_table(table_name)
            .map(|e| (e.field_name.as_str(), e))
            .collect();

        for column in table.columns() {
            if column.name == SUBJECT_ID_FIELD {
                continue;
            }
            let Some(entry) = entries.get(column.name.as_str()) else {
                self.push(
                    Severity::Warning,
                    Some(table_name),
                    Some(&column.name),
                    "column is not described in the data dictionary",
                );
                continue;
            };
            self.check_values(table_name, entry, &column.values);
        }

        for entry in data.data_dictionary.fields_for_table(table_name) {
            if !table.has_column(&entry.field_name) {
                self.push(
                    Severity::Warning,
                    Some(table_name),
                    Some(&entry.field_name),
                    "dictionary field has no column in the table",
                );
            }
        }
    }

    fn check_values(&mut self, table_name: &str, entry: &DictionaryEntry, values: &[Value]) {
        let field = Some(entry.field_name.as_str());
        let non_null = values.iter().filter(|v| !v.is_null());

        match &entry.field_type {
            FieldType::Categorical => {
                let options = match entry.options() {
                    Ok(options) => options,
                    Err(e) => {
                        self.push(Severity::Error, Some(table_name), field, e.to_string());
                        return;
                    }
                };
                if options.is_empty() {
                    return;
                }
                let mut invalid: Vec<String> = non_null
                    .map(Value::as_text)
                    .filter(|text| !options.iter().any(|o| o.matches(text)))
                    .collect();
                invalid.sort();
                invalid.dedup();
                if !invalid.is_empty() {
                    self.push(
                        Severity::Error,
                        Some(table_name),
                        field,
                        format!("values not among the field options: {}", examples(&invalid)),
                    );
                }
            }
            FieldType::Numeric => {
                let bad = non_null.filter(|v| !matches!(v, Value::Number(_))).count();
                if bad > 0 {
                    self.push(
                        Severity::Error,
                        Some(table_name),
                        field,
                        format!("{bad} non-numeric value(s)"),
                    );
                }
            }
            FieldType::Datetime => {
                let bad = non_null.filter(|v| !matches!(v, Value::DateTime(_))).count();
                if bad > 0 {
                    self.push(
                        Severity::Error,
                        Some(table_name),
                        field,
                        format!("{bad} value(s) are not dates"),
                    );
                }
            }
            FieldType::Binary => {
                let bad = non_null
                    .filter(|v| match v {
                        Value::Bool(_) => false,
                        Value::Number(n) => *n != 0.0 && *n != 1.0,
                        _ => true,
                    })
                    .count();
                if bad > 0 {
                    self.push(
                        Severity::Warning,
                        Some(table_name),
                        field,
                        format!("{bad} value(s) are not boolean"),
                    );
                }
            }
            FieldType::Freetext | FieldType::Other(_) => {}
        }
    }

    fn check_unknown_dictionary_tables(&mut self, data: &IsaricData) {
        let loaded: HashSet<String> = data.table_names().into_iter().collect();
        let mut unknown: Vec<&str> = data
            .data_dictionary
            .entries()
            .iter()
            .map(|e| e.table_name.as_str())
            .filter(|t| !t.is_empty() && !loaded.contains(*t))
            .collect();
        unknown.sort_unstable();
        unknown.dedup();
        for table_name in unknown {
            self.push(
                Severity::Warning,
                Some(table_name),
                None,
                "data dictionary describes a table that was not loaded",
            );
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors = self.errors().count();
        let warnings = self.warnings().count();
        writeln!(f, "{errors} error(s), {warnings} warning(s)")?;
        for issue in &self.issues {
            writeln!(f, "  {issue}")?;
        }
        Ok(())
    }
}

fn examples(values: &[String]) -> String {
    let shown: Vec<&str> = values.iter().take(MAX_EXAMPLES).map(String::as_str).collect();
    let mut text = shown.join(", ");
    if values.len() > MAX_EXAMPLES {
        text.push_str(&format!(" (and {} more)", values.len() - MAX_EXAMPLES));
    }
    text
}
