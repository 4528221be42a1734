//! The [`IsaricData`] container.
//!
//! `IsaricData` holds everything loaded from one project: the metadata,
//! the data dictionary, the required presentation and outcome tables, and
//! the optional daily and events tables. It offers:
//!
//! - structural validation on construction and full validation on demand
//! - a statistical description of every table
//! - views of the data for one subject, a set of fields, or a field type
//! - adding and removing fields, keeping the dictionary in step

use std::collections::BTreeMap;

use isaric_core::{Column, Error, Result, Row, SUBJECT_ID_FIELD, Table, Value};
use tracing::debug;

use crate::dictionary::{DataDictionary, DictionaryEntry, FieldOption, FieldType};
use crate::metadata::Metadata;
use crate::summary::{DataSummary, TableSummary};
use crate::validate::ValidationReport;

/// Name of the presentation (admission) table.
pub const PRESENTATION: &str = "presentation";
/// Name of the outcome table.
pub const OUTCOME: &str = "outcome";
/// Name of the daily table.
pub const DAILY: &str = "daily";

/// All data of one ISARIC project.
#[derive(Debug, Clone, PartialEq)]
pub struct IsaricData {
    /// Parsed `metadata.json`.
    pub metadata: Metadata,
    /// Field definitions.
    pub data_dictionary: DataDictionary,
    /// One row per subject at presentation.
    pub presentation: Table,
    /// Outcome records.
    pub outcome: Table,
    /// Daily follow-up records, if collected.
    pub daily: Option<Table>,
    /// Events tables by name, if any.
    pub events: Option<BTreeMap<String, Table>>,
}

impl IsaricData {
    /// Assemble project data and run the structural checks.
    ///
    /// # Errors
    ///
    /// Fails when the metadata names a file with an empty filename or lists
    /// a table both at the top level and under `events`, when the
    /// dictionary is empty or has entries without a table, or when either
    /// required table lacks the `subjid` column.
    pub fn new(
        metadata: Metadata,
        data_dictionary: DataDictionary,
        presentation: Table,
        outcome: Table,
    ) -> Result<Self> {
        let data = Self {
            metadata,
            data_dictionary,
            presentation,
            outcome,
            daily: None,
            events: None,
        };
        data.validate_metadata()?;
        data.validate_data_dictionary()?;
        for table_name in [PRESENTATION, OUTCOME] {
            data.validate_table(table_name)?;
        }
        Ok(data)
    }

    /// Attach the daily table.
    pub fn with_daily(mut self, daily: Table) -> Result<Self> {
        self.daily = Some(daily);
        self.validate_table(DAILY)?;
        Ok(self)
    }

    /// Attach events tables.
    pub fn with_events(mut self, events: BTreeMap<String, Table>) -> Result<Self> {
        let names: Vec<String> = events.keys().cloned().collect();
        self.events = Some(events);
        for name in &names {
            self.validate_table(name)?;
        }
        Ok(self)
    }

    // ------------------------------------------------------------------------
    // Structural validation
    // ------------------------------------------------------------------------

    /// Check the metadata describes files consistently.
    pub fn validate_metadata(&self) -> Result<()> {
        let files = &self.metadata.files;
        let named = files
            .data_dictionary
            .iter()
            .map(|spec| ("data_dictionary", spec))
            .chain(files.tables.iter().map(|(n, s)| (n.as_str(), s)))
            .chain(files.events.iter().map(|(n, s)| (n.as_str(), s)));
        for (name, spec) in named {
            if spec.filename.as_deref().is_some_and(|f| f.trim().is_empty()) {
                return Err(Error::validation_field(
                    format!("files.{name}.filename"),
                    "filename must not be empty",
                ));
            }
        }
        if let Some(name) = files.tables.keys().find(|n| files.events.contains_key(*n)) {
            return Err(Error::validation_field(
                format!("files.{name}"),
                "table is listed both as a table and as an events table",
            ));
        }
        Ok(())
    }

    /// Check the data dictionary is usable.
    pub fn validate_data_dictionary(&self) -> Result<()> {
        if self.data_dictionary.is_empty() {
            return Err(Error::validation("data dictionary has no entries"));
        }
        if let Some(entry) = self
            .data_dictionary
            .entries()
            .iter()
            .find(|e| e.table_name.trim().is_empty())
        {
            return Err(Error::validation_field(
                entry.field_name.clone(),
                "data dictionary entry has no table name",
            ));
        }
        Ok(())
    }

    /// Check a named table exists and carries the subject identifier.
    pub fn validate_table(&self, table_name: &str) -> Result<()> {
        let table = self.table(table_name)?;
        if !table.has_column(SUBJECT_ID_FIELD) {
            return Err(Error::validation_field(
                table_name,
                format!("table {table_name} has no {SUBJECT_ID_FIELD} column"),
            ));
        }
        Ok(())
    }

    /// Run every validation check and return the report.
    ///
    /// # Errors
    ///
    /// Fails if the report contains any error-severity issue; warnings are
    /// logged and returned in the report.
    pub fn validate(&self) -> Result<ValidationReport> {
        let report = ValidationReport::check(self);
        for issue in report.warnings() {
            tracing::warn!("{issue}");
        }
        if report.is_valid() {
            debug!(
                warnings = report.warnings().count(),
                "Project data passed validation"
            );
            Ok(report)
        } else {
            let errors: Vec<String> = report.errors().map(ToString::to_string).collect();
            Err(Error::validation(format!(
                "{} validation error(s): {}",
                errors.len(),
                errors.join("; ")
            )))
        }
    }

    // ------------------------------------------------------------------------
    // Table access
    // ------------------------------------------------------------------------

    /// Look up a table by name.
    pub fn table(&self, table_name: &str) -> Result<&Table> {
        let found = match table_name {
            PRESENTATION => Some(&self.presentation),
            OUTCOME => Some(&self.outcome),
            DAILY => self.daily.as_ref(),
            other => self.events.as_ref().and_then(|events| events.get(other)),
        };
        found.ok_or_else(|| Error::UnknownTable {
            name: table_name.to_string(),
        })
    }

    /// Look up a table by name for modification.
    pub fn table_mut(&mut self, table_name: &str) -> Result<&mut Table> {
        let found = match table_name {
            PRESENTATION => Some(&mut self.presentation),
            OUTCOME => Some(&mut self.outcome),
            DAILY => self.daily.as_mut(),
            other => self.events.as_mut().and_then(|events| events.get_mut(other)),
        };
        found.ok_or_else(|| Error::UnknownTable {
            name: table_name.to_string(),
        })
    }

    /// Names of all loaded tables.
    pub fn table_names(&self) -> Vec<String> {
        let mut names = vec![PRESENTATION.to_string(), OUTCOME.to_string()];
        if self.daily.is_some() {
            names.push(DAILY.to_string());
        }
        if let Some(events) = &self.events {
            names.extend(events.keys().cloned());
        }
        names
    }

    // ------------------------------------------------------------------------
    // Description and views
    // ------------------------------------------------------------------------

    /// Summary statistics for every table.
    pub fn describe(&self) -> DataSummary {
        DataSummary::of(self)
    }

    /// Summary statistics for one table.
    pub fn describe_table(&self, table_name: &str) -> Result<TableSummary> {
        let table = self.table(table_name)?;
        Ok(TableSummary::of(table_name, table, &self.data_dictionary))
    }

    /// Options recorded in the dictionary for a field.
    pub fn get_field_options(&self, field_name: &str) -> Result<Vec<FieldOption>> {
        self.data_dictionary.field_options(field_name)
    }

    /// Rows of one table belonging to a subject.
    pub fn get_subject(&self, subjid: &str, table_name: &str) -> Result<Table> {
        let table = self.table(table_name)?;
        let ids = subject_column(table, table_name)?;
        let mask: Vec<bool> = ids.values.iter().map(|v| v.as_text() == subjid).collect();
        table.filter(&mask)
    }

    /// The subject identifier plus the named fields of one table.
    pub fn get_fields<S: AsRef<str>>(&self, field_names: &[S], table_name: &str) -> Result<Table> {
        let table = self.table(table_name)?;
        let mut names = vec![SUBJECT_ID_FIELD];
        for name in field_names {
            let name = name.as_ref();
            if !table.has_column(name) {
                return Err(Error::unknown_field(name, Some(table_name)));
            }
            if !names.contains(&name) {
                names.push(name);
            }
        }
        table.select(&names)
    }

    /// The subject identifier plus every field of one type in one table.
    pub fn get_type(&self, field_type: &FieldType, table_name: &str) -> Result<Table> {
        let table = self.table(table_name)?;
        let fields: Vec<&str> = self
            .data_dictionary
            .fields_of_type(table_name, field_type)
            .into_iter()
            .filter(|name| *name != SUBJECT_ID_FIELD && table.has_column(name))
            .collect();
        self.get_fields(&fields, table_name)
    }

    // ------------------------------------------------------------------------
    // Field editing
    // ------------------------------------------------------------------------

    /// Add a column with a matching dictionary entry.
    ///
    /// The entry's `table_name` selects the table. Fails if the table
    /// already has the column or the dictionary already has the entry.
    pub fn add_field(&mut self, entry: DictionaryEntry, values: Vec<Value>) -> Result<()> {
        let table_name = entry.table_name.clone();
        if self.data_dictionary.contains(&table_name, &entry.field_name) {
            return Err(Error::duplicate_field(entry.field_name, Some(&table_name)));
        }
        let table = self.table_mut(&table_name)?;
        table
            .add_column(Column::new(entry.field_name.clone(), values))
            .map_err(|e| e.with_table(&table_name))?;
        debug!(table = %table_name, field = %entry.field_name, "Added field");
        self.data_dictionary.push(entry)
    }

    /// Add a field computed from each row of the table.
    ///
    /// # Example
    ///
    /// ```
    /// # use isaric_data::{DataDictionary, DictionaryEntry, FieldType, IsaricData, Metadata};
    /// # use isaric_core::{Column, Table, Value};
    /// # let table = |ages: Vec<Value>| Table::from_columns(vec![
    /// #     Column::new("subjid", vec!["S1".into(), "S2".into()]),
    /// #     Column::new("age", ages),
    /// # ]).unwrap();
    /// # let dd = DataDictionary::new(vec![
    /// #     DictionaryEntry::new("presentation", "age", FieldType::Numeric),
    /// # ]);
    /// # let mut data = IsaricData::new(
    /// #     Metadata::default(), dd,
    /// #     table(vec![Value::Number(70.0), Value::Number(30.0)]),
    /// #     table(vec![Value::Null, Value::Null]),
    /// # ).unwrap();
    /// data.add_derived_field("age_over_65", "presentation", FieldType::Binary, |row| {
    ///     match row.get("age").and_then(Value::as_f64) {
    ///         Some(age) => Value::Bool(age > 65.0),
    ///         None => Value::Null,
    ///     }
    /// })
    /// .unwrap();
    /// ```
    pub fn add_derived_field<F>(
        &mut self,
        field_name: &str,
        table_name: &str,
        field_type: FieldType,
        derive: F,
    ) -> Result<()>
    where
        F: Fn(&Row<'_>) -> Value,
    {
        let values: Vec<Value> = self.table(table_name)?.rows().map(|row| derive(&row)).collect();
        self.add_custom_field(field_name, table_name, field_type, values)
    }

    /// Add a field from supplied values, one per row.
    pub fn add_custom_field(
        &mut self,
        field_name: &str,
        table_name: &str,
        field_type: FieldType,
        values: Vec<Value>,
    ) -> Result<()> {
        let entry = DictionaryEntry::new(table_name, field_name, field_type);
        self.add_field(entry, values)
    }

    /// Remove a field from a table and from the dictionary.
    ///
    /// The subject identifier cannot be removed.
    pub fn remove_field(&mut self, field_name: &str, table_name: &str) -> Result<Column> {
        if field_name == SUBJECT_ID_FIELD {
            return Err(Error::validation_field(
                field_name,
                "the subject identifier cannot be removed",
            ));
        }
        let column = self
            .table_mut(table_name)?
            .remove_column(field_name)
            .map_err(|_| Error::unknown_field(field_name, Some(table_name)))?;
        self.data_dictionary.remove(table_name, field_name);
        debug!(table = %table_name, field = %field_name, "Removed field");
        Ok(column)
    }
}

fn subject_column<'a>(table: &'a Table, table_name: &str) -> Result<&'a Column> {
    table
        .column(SUBJECT_ID_FIELD)
        .ok_or_else(|| Error::unknown_field(SUBJECT_ID_FIELD, Some(table_name)))
}
