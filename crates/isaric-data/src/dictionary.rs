//! The project data dictionary.
//!
//! Each row of the data dictionary describes one field: the table it lives
//! in, its type, a human-readable label, the allowed options for
//! categorical fields, and the skip logic that decides when the field
//! applies. The dictionary is read from CSV with every cell as text, then
//! converted into typed [`DictionaryEntry`] values here.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use isaric_core::{Column, Error, Result, Table, Value};
use serde::{Deserialize, Serialize};

/// Column holding the table a field belongs to.
pub const TABLE_NAME_COLUMN: &str = "table_name";
/// Older spelling of [`TABLE_NAME_COLUMN`].
pub const DATAFRAME_NAME_COLUMN: &str = "dataframe_name";
/// Column holding the field name.
pub const FIELD_NAME_COLUMN: &str = "field_name";
/// Column holding the field type.
pub const FIELD_TYPE_COLUMN: &str = "field_type";
/// Column holding the field label.
pub const FIELD_LABEL_COLUMN: &str = "field_label";
/// Column holding the field options.
pub const FIELD_OPTIONS_COLUMN: &str = "field_options";
/// Column holding the skip logic expression.
pub const SKIP_LOGIC_COLUMN: &str = "skip_logic";
/// REDCap spelling of [`SKIP_LOGIC_COLUMN`].
pub const BRANCHING_LOGIC_COLUMN: &str = "branching_logic";
/// Column linking a one-hot column to its source field.
pub const PARENT_FIELD_COLUMN: &str = "parent_field";
/// Column holding the option value a one-hot column stands for.
pub const OPTION_VALUE_COLUMN: &str = "option_value";

const KNOWN_COLUMNS: &[&str] = &[
    TABLE_NAME_COLUMN,
    DATAFRAME_NAME_COLUMN,
    FIELD_NAME_COLUMN,
    FIELD_TYPE_COLUMN,
    FIELD_LABEL_COLUMN,
    FIELD_OPTIONS_COLUMN,
    SKIP_LOGIC_COLUMN,
    BRANCHING_LOGIC_COLUMN,
    PARENT_FIELD_COLUMN,
    OPTION_VALUE_COLUMN,
];

// ============================================================================
// FieldType
// ============================================================================

/// Type of a field as recorded in the data dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Free text.
    Freetext,
    /// One of a fixed set of options.
    Categorical,
    /// Number.
    Numeric,
    /// Date or date and time.
    Datetime,
    /// True/false.
    Binary,
    /// Any other type, kept verbatim.
    Other(String),
}

impl FieldType {
    /// Returns `true` for types whose cells are read as plain text.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Freetext | Self::Categorical)
    }

    /// Canonical lowercase name.
    pub fn name(&self) -> &str {
        match self {
            Self::Freetext => "freetext",
            Self::Categorical => "categorical",
            Self::Numeric => "numeric",
            Self::Datetime => "datetime",
            Self::Binary => "binary",
            Self::Other(name) => name,
        }
    }
}

impl FromStr for FieldType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Ok(match lowered.as_str() {
            "freetext" | "text" | "notes" => Self::Freetext,
            "categorical" | "radio" | "dropdown" | "list" => Self::Categorical,
            "numeric" | "number" | "integer" | "float" | "calc" => Self::Numeric,
            "datetime" | "date" | "date_dmy" | "datetime_dmy" => Self::Datetime,
            "binary" | "boolean" | "yesno" | "checkbox" => Self::Binary,
            _ => Self::Other(lowered),
        })
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// FieldOption
// ============================================================================

/// One allowed value of a categorical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    /// Stored value (code).
    pub value: String,
    /// Display label, when different from the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl FieldOption {
    /// Option whose label is its value.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: None,
        }
    }

    /// Option with a separate label.
    pub fn labelled(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: Some(label.into()),
        }
    }

    /// Returns `true` if `text` is this option's value or label.
    pub fn matches(&self, text: &str) -> bool {
        self.value == text || self.label.as_deref() == Some(text)
    }
}

/// Parse the `field_options` cell of a dictionary row.
///
/// Accepted forms:
/// - a JSON list of strings or numbers: `["Yes", "No"]`
/// - a JSON list of objects: `[{"value": 1, "label": "Yes"}]`
/// - a JSON object of value to label: `{"1": "Yes", "2": "No"}`
/// - REDCap choices: `1, Yes | 2, No`
///
/// Blank text yields no options.
///
/// # Examples
///
/// ```
/// use isaric_data::dictionary::{parse_field_options, FieldOption};
///
/// let options = parse_field_options(r#"["Yes", "No"]"#).unwrap();
/// assert_eq!(options, vec![FieldOption::new("Yes"), FieldOption::new("No")]);
///
/// let options = parse_field_options("1, Male | 2, Female").unwrap();
/// assert_eq!(options[1], FieldOption::labelled("2", "Female"));
/// ```
pub fn parse_field_options(text: &str) -> Result<Vec<FieldOption>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(json) => options_from_json(&json),
        Err(_) if trimmed.contains(',') || trimmed.contains('|') => {
            Ok(options_from_choices(trimmed))
        }
        Err(e) => Err(Error::parse(format!("invalid field options '{trimmed}': {e}"))),
    }
}

fn options_from_json(json: &serde_json::Value) -> Result<Vec<FieldOption>> {
    use serde_json::Value as Json;

    match json {
        Json::Array(items) => items
            .iter()
            .map(|item| match item {
                Json::Object(obj) => {
                    let value = obj
                        .get("value")
                        .and_then(scalar_text)
                        .ok_or_else(|| Error::parse("field option object needs a 'value'"))?;
                    let label = obj.get("label").and_then(scalar_text);
                    Ok(FieldOption { value, label })
                }
                other => scalar_text(other)
                    .map(FieldOption::new)
                    .ok_or_else(|| Error::parse(format!("unsupported field option {other}"))),
            })
            .collect(),
        Json::Object(obj) => Ok(obj
            .iter()
            .map(|(value, label)| FieldOption {
                value: value.clone(),
                label: scalar_text(label),
            })
            .collect()),
        other => Err(Error::parse(format!(
            "field options must be a list or object, got {other}"
        ))),
    }
}

fn scalar_text(json: &serde_json::Value) -> Option<String> {
    match json {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn options_from_choices(text: &str) -> Vec<FieldOption> {
    text.split('|')
        .map(str::trim)
        .filter(|choice| !choice.is_empty())
        .map(|choice| match choice.split_once(',') {
            Some((value, label)) => FieldOption::labelled(value.trim(), label.trim()),
            None => FieldOption::new(choice),
        })
        .collect()
}

// ============================================================================
// DictionaryEntry
// ============================================================================

/// One row of the data dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryEntry {
    /// Table the field belongs to.
    pub table_name: String,
    /// Field (column) name.
    pub field_name: String,
    /// Field type.
    pub field_type: FieldType,
    /// Human-readable label.
    pub field_label: Option<String>,
    /// Raw `field_options` text; see [`parse_field_options`].
    pub field_options: Option<String>,
    /// Skip logic expression.
    pub skip_logic: Option<String>,
    /// For one-hot columns, the field they were encoded from.
    pub parent_field: Option<String>,
    /// For one-hot columns, the option value they stand for.
    pub option_value: Option<String>,
    /// Any other dictionary columns.
    pub extra: BTreeMap<String, String>,
}

impl DictionaryEntry {
    /// Creates an entry with only the required columns filled in.
    pub fn new(
        table_name: impl Into<String>,
        field_name: impl Into<String>,
        field_type: FieldType,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            field_name: field_name.into(),
            field_type,
            field_label: None,
            field_options: None,
            skip_logic: None,
            parent_field: None,
            option_value: None,
            extra: BTreeMap::new(),
        }
    }

    /// Sets the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.field_label = Some(label.into());
        self
    }

    /// Sets the options from a list, stored as JSON.
    pub fn with_options(mut self, options: &[FieldOption]) -> Self {
        self.field_options = serde_json::to_string(options).ok();
        self
    }

    /// Sets the skip logic expression.
    pub fn with_skip_logic(mut self, logic: impl Into<String>) -> Self {
        self.skip_logic = Some(logic.into());
        self
    }

    /// Parsed options; empty when none are recorded.
    pub fn options(&self) -> Result<Vec<FieldOption>> {
        match &self.field_options {
            Some(text) => parse_field_options(text),
            None => Ok(Vec::new()),
        }
    }
}

// ============================================================================
// DataDictionary
// ============================================================================

/// All field definitions of a project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataDictionary {
    entries: Vec<DictionaryEntry>,
}

impl DataDictionary {
    /// Creates a dictionary from entries.
    pub fn new(entries: Vec<DictionaryEntry>) -> Self {
        Self { entries }
    }

    /// Build the dictionary from a table of text cells.
    ///
    /// `field_name` and `field_type` columns are required, as is one of
    /// `table_name` or `dataframe_name`.
    pub fn from_table(table: &Table) -> Result<Self> {
        let required = |name: &str| {
            table
                .column(name)
                .ok_or_else(|| Error::validation_field(name, "data dictionary column is missing"))
        };
        let field_names = required(FIELD_NAME_COLUMN)?;
        let field_types = required(FIELD_TYPE_COLUMN)?;
        let table_names = table
            .column(TABLE_NAME_COLUMN)
            .or_else(|| table.column(DATAFRAME_NAME_COLUMN))
            .ok_or_else(|| {
                Error::validation_field(TABLE_NAME_COLUMN, "data dictionary column is missing")
            })?;
        let optional = |primary: &str, alias: Option<&str>| {
            table
                .column(primary)
                .or_else(|| alias.and_then(|a| table.column(a)))
        };
        let labels = optional(FIELD_LABEL_COLUMN, None);
        let options = optional(FIELD_OPTIONS_COLUMN, None);
        let skip_logic = optional(SKIP_LOGIC_COLUMN, Some(BRANCHING_LOGIC_COLUMN));
        let parents = optional(PARENT_FIELD_COLUMN, None);
        let option_values = optional(OPTION_VALUE_COLUMN, None);
        let extra_columns: Vec<&Column> = table
            .columns()
            .iter()
            .filter(|c| !KNOWN_COLUMNS.contains(&c.name.as_str()))
            .collect();

        let cell = |column: Option<&Column>, row: usize| -> Option<String> {
            column
                .map(|c| c.values[row].as_text())
                .filter(|s| !s.trim().is_empty())
        };

        let mut entries = Vec::with_capacity(table.n_rows());
        for row in 0..table.n_rows() {
            let field_name = cell(Some(field_names), row).ok_or_else(|| {
                Error::validation_field(
                    FIELD_NAME_COLUMN,
                    format!("data dictionary row {} has no field name", row + 1),
                )
            })?;
            let table_name = cell(Some(table_names), row).unwrap_or_default();
            let field_type = cell(Some(field_types), row)
                .map(|t| t.parse::<FieldType>().unwrap_or_else(|never| match never {}))
                .unwrap_or(FieldType::Other(String::new()));

            let mut entry = DictionaryEntry::new(table_name, field_name, field_type);
            entry.field_label = cell(labels, row);
            entry.field_options = cell(options, row);
            entry.skip_logic = cell(skip_logic, row);
            entry.parent_field = cell(parents, row);
            entry.option_value = cell(option_values, row);
            for column in &extra_columns {
                if let Some(value) = cell(Some(*column), row) {
                    entry.extra.insert(column.name.clone(), value);
                }
            }
            entries.push(entry);
        }
        Ok(Self { entries })
    }

    /// Render the dictionary as a table of text cells.
    pub fn to_table(&self) -> Table {
        let text = |v: Option<&String>| v.map(|s| Value::Text(s.clone())).unwrap_or(Value::Null);
        let mut columns = vec![
            Column::new(
                TABLE_NAME_COLUMN,
                self.entries.iter().map(|e| Value::from(e.table_name.as_str())).collect(),
            ),
            Column::new(
                FIELD_NAME_COLUMN,
                self.entries.iter().map(|e| Value::from(e.field_name.as_str())).collect(),
            ),
            Column::new(
                FIELD_TYPE_COLUMN,
                self.entries.iter().map(|e| Value::from(e.field_type.name())).collect(),
            ),
            Column::new(
                FIELD_LABEL_COLUMN,
                self.entries.iter().map(|e| text(e.field_label.as_ref())).collect(),
            ),
            Column::new(
                FIELD_OPTIONS_COLUMN,
                self.entries.iter().map(|e| text(e.field_options.as_ref())).collect(),
            ),
            Column::new(
                SKIP_LOGIC_COLUMN,
                self.entries.iter().map(|e| text(e.skip_logic.as_ref())).collect(),
            ),
            Column::new(
                PARENT_FIELD_COLUMN,
                self.entries.iter().map(|e| text(e.parent_field.as_ref())).collect(),
            ),
            Column::new(
                OPTION_VALUE_COLUMN,
                self.entries.iter().map(|e| text(e.option_value.as_ref())).collect(),
            ),
        ];

        let mut extra_names: Vec<&String> =
            self.entries.iter().flat_map(|e| e.extra.keys()).collect();
        extra_names.sort();
        extra_names.dedup();
        for name in extra_names {
            columns.push(Column::new(
                name.clone(),
                self.entries.iter().map(|e| text(e.extra.get(name))).collect(),
            ));
        }

        let mut table = Table::new();
        for column in columns {
            // Names are distinct and lengths equal by construction.
            let _ = table.add_column(column);
        }
        table
    }

    /// All entries in dictionary order.
    pub fn entries(&self) -> &[DictionaryEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry with this field name, in any table.
    pub fn entry(&self, field_name: &str) -> Option<&DictionaryEntry> {
        self.entries.iter().find(|e| e.field_name == field_name)
    }

    /// Entry for a field in a specific table.
    pub fn entry_in(&self, table_name: &str, field_name: &str) -> Option<&DictionaryEntry> {
        self.entries
            .iter()
            .find(|e| e.table_name == table_name && e.field_name == field_name)
    }

    /// Mutable entry for a field in a specific table.
    pub fn entry_in_mut(
        &mut self,
        table_name: &str,
        field_name: &str,
    ) -> Option<&mut DictionaryEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.table_name == table_name && e.field_name == field_name)
    }

    /// Returns `true` if the table has an entry for this field.
    pub fn contains(&self, table_name: &str, field_name: &str) -> bool {
        self.entry_in(table_name, field_name).is_some()
    }

    /// Entries belonging to one table.
    pub fn fields_for_table<'a>(
        &'a self,
        table_name: &'a str,
    ) -> impl Iterator<Item = &'a DictionaryEntry> + 'a {
        self.entries.iter().filter(move |e| e.table_name == table_name)
    }

    /// Names of the fields of one type in one table.
    pub fn fields_of_type<'a>(&'a self, table_name: &str, field_type: &FieldType) -> Vec<&'a str> {
        self.entries
            .iter()
            .filter(|e| e.table_name == table_name && &e.field_type == field_type)
            .map(|e| e.field_name.as_str())
            .collect()
    }

    /// Entries created by one-hot encoding `parent_field` in `table_name`.
    pub fn children_of<'a>(
        &'a self,
        table_name: &'a str,
        parent_field: &'a str,
    ) -> impl Iterator<Item = &'a DictionaryEntry> + 'a {
        self.fields_for_table(table_name)
            .filter(move |e| e.parent_field.as_deref() == Some(parent_field))
    }

    /// Options of a field, looked up by name in any table.
    pub fn field_options(&self, field_name: &str) -> Result<Vec<FieldOption>> {
        self.entry(field_name)
            .ok_or_else(|| Error::unknown_field(field_name, None))?
            .options()
    }

    /// Append an entry; fails if the table already defines the field.
    pub fn push(&mut self, entry: DictionaryEntry) -> Result<()> {
        if self.contains(&entry.table_name, &entry.field_name) {
            return Err(Error::duplicate_field(entry.field_name, Some(&entry.table_name)));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Insert an entry at `index` (clamped); fails on duplicates.
    pub fn insert(&mut self, index: usize, entry: DictionaryEntry) -> Result<()> {
        if self.contains(&entry.table_name, &entry.field_name) {
            return Err(Error::duplicate_field(entry.field_name, Some(&entry.table_name)));
        }
        let index = index.min(self.entries.len());
        self.entries.insert(index, entry);
        Ok(())
    }

    /// Position of a table's field entry.
    pub fn position(&self, table_name: &str, field_name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.table_name == table_name && e.field_name == field_name)
    }

    /// Remove and return a table's field entry, if present.
    pub fn remove(&mut self, table_name: &str, field_name: &str) -> Option<DictionaryEntry> {
        self.position(table_name, field_name)
            .map(|index| self.entries.remove(index))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn text_column(name: &str, cells: &[&str]) -> Column {
        Column::new(name, cells.iter().map(|c| isaric_core::value::parse_text(c)).collect())
    }

    fn sample_table() -> Table {
        Table::from_columns(vec![
            text_column("dataframe_name", &["presentation", "presentation", "outcome"]),
            text_column("field_name", &["subjid", "demog_sex", "outco_outcome"]),
            text_column("field_type", &["freetext", "radio", "categorical"]),
            text_column("field_label", &["Subject", "Sex", ""]),
            text_column(
                "field_options",
                &["", r#"["Male", "Female"]"#, "1, Discharged | 2, Death"],
            ),
            text_column("branching_logic", &["", "", "[demog_sex] = 'Female'"]),
            text_column("section", &["ids", "demog", ""]),
        ])
        .unwrap()
    }

    #[test]
    fn test_field_type_aliases() {
        assert_eq!("Radio".parse::<FieldType>().unwrap(), FieldType::Categorical);
        assert_eq!("date".parse::<FieldType>().unwrap(), FieldType::Datetime);
        assert_eq!("yesno".parse::<FieldType>().unwrap(), FieldType::Binary);
        assert_eq!(
            "slider".parse::<FieldType>().unwrap(),
            FieldType::Other("slider".into())
        );
        assert!(FieldType::Freetext.is_text());
        assert!(!FieldType::Numeric.is_text());
    }

    #[test]
    fn test_parse_options_json_objects() {
        let options =
            parse_field_options(r#"[{"value": 1, "label": "Yes"}, {"value": "0"}]"#).unwrap();
        assert_eq!(
            options,
            vec![FieldOption::labelled("1", "Yes"), FieldOption::new("0")]
        );
    }

    #[test]
    fn test_parse_options_json_map() {
        let options = parse_field_options(r#"{"1": "Yes", "0": "No"}"#).unwrap();
        assert_eq!(options.len(), 2);
        assert!(options.iter().any(|o| o.matches("Yes")));
    }

    #[test]
    fn test_parse_options_blank_and_invalid() {
        assert!(parse_field_options("  ").unwrap().is_empty());
        assert!(parse_field_options("42").is_err());
        assert!(parse_field_options("not json").is_err());
    }

    #[test]
    fn test_from_table_with_aliases() {
        let dd = DataDictionary::from_table(&sample_table()).unwrap();
        assert_eq!(dd.len(), 3);

        let sex = dd.entry_in("presentation", "demog_sex").unwrap();
        assert_eq!(sex.field_type, FieldType::Categorical);
        assert_eq!(sex.field_label.as_deref(), Some("Sex"));
        assert_eq!(sex.extra.get("section").map(String::as_str), Some("demog"));

        let outcome = dd.entry("outco_outcome").unwrap();
        assert_eq!(outcome.table_name, "outcome");
        assert_eq!(outcome.field_label, None);
        assert_eq!(outcome.skip_logic.as_deref(), Some("[demog_sex] = 'Female'"));
    }

    #[test]
    fn test_from_table_requires_field_name() {
        let table = Table::from_columns(vec![
            text_column("table_name", &["presentation"]),
            text_column("field_type", &["numeric"]),
        ])
        .unwrap();
        let err = DataDictionary::from_table(&table).unwrap_err();
        assert!(err.to_string().contains("Validation"));
    }

    #[test]
    fn test_from_table_requires_table_column() {
        let table = Table::from_columns(vec![
            text_column("field_name", &["age"]),
            text_column("field_type", &["numeric"]),
        ])
        .unwrap();
        assert!(DataDictionary::from_table(&table).is_err());
    }

    #[test]
    fn test_field_options_lookup() {
        let dd = DataDictionary::from_table(&sample_table()).unwrap();
        let options = dd.field_options("demog_sex").unwrap();
        assert_eq!(options, vec![FieldOption::new("Male"), FieldOption::new("Female")]);
        assert!(dd.field_options("subjid").unwrap().is_empty());
        assert!(dd.field_options("nope").is_err());
    }

    #[test]
    fn test_to_table_keeps_extra_columns() {
        let dd = DataDictionary::from_table(&sample_table()).unwrap();
        let table = dd.to_table();
        assert!(table.has_column("section"));
        assert_eq!(table.n_rows(), 3);
        let reparsed = DataDictionary::from_table(&table).unwrap();
        assert_eq!(reparsed, dd);
    }

    #[test]
    fn test_push_rejects_duplicates_and_remove() {
        let mut dd = DataDictionary::from_table(&sample_table()).unwrap();
        let err = dd
            .push(DictionaryEntry::new("presentation", "demog_sex", FieldType::Freetext))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateField { .. }));

        dd.push(DictionaryEntry::new("outcome", "demog_sex", FieldType::Freetext))
            .unwrap();
        assert_eq!(dd.len(), 4);

        assert!(dd.remove("outcome", "demog_sex").is_some());
        assert!(dd.remove("outcome", "demog_sex").is_none());
        assert_eq!(dd.len(), 3);
    }

    #[test]
    fn test_fields_of_type() {
        let dd = DataDictionary::from_table(&sample_table()).unwrap();
        assert_eq!(
            dd.fields_of_type("presentation", &FieldType::Categorical),
            vec!["demog_sex"]
        );
        assert!(dd.fields_of_type("outcome", &FieldType::Numeric).is_empty());
    }

    #[test]
    fn test_fields_of_type_outlive_table_name() {
        let dd = DataDictionary::from_table(&sample_table()).unwrap();
        let fields = {
            let table = String::from("presentation");
            dd.fields_of_type(&table, &FieldType::Categorical)
        };
        assert_eq!(fields, vec!["demog_sex"]);
    }
}
