//! Field encoders.
//!
//! - one-hot encoding of categorical fields into boolean columns
//! - inverting a one-hot encoding back into a categorical field
//! - converting yes/no/unknown fields into booleans
//!
//! Every encoder takes ownership of the data, rewrites the named fields of
//! one table together with their dictionary entries, and returns the data.
//! One-hot columns are named `<field>___<value>`, with the value sanitised.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use isaric_core::{Column, Error, Result, Value, sanitise_string, sanitise_values};
use isaric_data::{DictionaryEntry, FieldOption, FieldType, IsaricData};

/// Separator between a field name and its option in one-hot columns.
pub const ONE_HOT_SEPARATOR: &str = "___";

/// Value used for categories collapsed into one.
pub const OTHER_VALUE: &str = "other";

/// Share of non-missing rows below which a category is collapsed when no
/// threshold is given.
pub const DEFAULT_COLLAPSE_THRESHOLD: f64 = 0.05;

// ============================================================================
// Options and methods
// ============================================================================

/// Options shared by the one-hot encoders.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OneHotOptions {
    /// Collapse rare categories into `other`.
    pub collapse_to_other: bool,
    /// Share of non-missing rows below which a category is rare.
    pub collapse_threshold: Option<f64>,
}

impl OneHotOptions {
    /// Options that collapse categories below `threshold`.
    pub fn collapsing(threshold: f64) -> Self {
        Self {
            collapse_to_other: true,
            collapse_threshold: Some(threshold),
        }
    }

    fn threshold(&self) -> Option<f64> {
        self.collapse_to_other
            .then(|| self.collapse_threshold.unwrap_or(DEFAULT_COLLAPSE_THRESHOLD))
    }
}

/// The available encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodeMethod {
    /// [`one_hot_encode`]
    OneHotEncode,
    /// [`inverse_one_hot_encode`]
    InverseOneHotEncode,
    /// [`categorical_ynu_to_boolean`]
    CategoricalYnuToBoolean,
}

impl EncodeMethod {
    /// Every method, in display order.
    pub const ALL: [EncodeMethod; 3] = [
        Self::OneHotEncode,
        Self::InverseOneHotEncode,
        Self::CategoricalYnuToBoolean,
    ];

    /// The method's name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OneHotEncode => "one-hot-encode",
            Self::InverseOneHotEncode => "inverse-one-hot-encode",
            Self::CategoricalYnuToBoolean => "categorical_ynu-to-boolean",
        }
    }

    /// Run the method on the named fields of a table.
    pub fn apply<S: AsRef<str>>(
        self,
        data: IsaricData,
        table_name: &str,
        field_names: &[S],
        options: OneHotOptions,
    ) -> Result<IsaricData> {
        match self {
            Self::OneHotEncode => one_hot_encode(data, table_name, field_names, options),
            Self::InverseOneHotEncode => {
                inverse_one_hot_encode(data, table_name, field_names, options)
            }
            Self::CategoricalYnuToBoolean => {
                categorical_ynu_to_boolean(data, table_name, field_names)
            }
        }
    }
}

impl FromStr for EncodeMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "one-hot-encode" => Ok(Self::OneHotEncode),
            "inverse-one-hot-encode" => Ok(Self::InverseOneHotEncode),
            "categorical_ynu-to-boolean" | "categorical-ynu-to-boolean" => {
                Ok(Self::CategoricalYnuToBoolean)
            }
            other => Err(Error::UnknownMethod {
                method: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for EncodeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Encode fields with the method called `method`.
///
/// # Errors
///
/// Returns `UnknownMethod` for an unrecognised method name, and whatever
/// the method itself returns.
pub fn encode<S: AsRef<str>>(
    data: IsaricData,
    method: &str,
    table_name: &str,
    field_names: &[S],
    options: OneHotOptions,
) -> Result<IsaricData> {
    let method: EncodeMethod = method.parse()?;
    method.apply(data, table_name, field_names, options)
}

// ============================================================================
// One-hot encoding
// ============================================================================

/// Replace categorical fields with one boolean column per category.
///
/// Categories come from the field's dictionary options, in order, followed
/// by any other values found in the data in first-seen order. Values in the
/// data may be option values or labels. Rows where the field is missing are
/// missing in every new column.
///
/// With `collapse_to_other`, categories whose share of non-missing rows is
/// below the threshold share a single `<field>___other` column.
///
/// # Errors
///
/// Returns `UnknownField` if the table or dictionary lacks the field,
/// `Encoding` if it is not categorical, and `DuplicateField` if a new column
/// name is already taken.
pub fn one_hot_encode<S: AsRef<str>>(
    mut data: IsaricData,
    table_name: &str,
    field_names: &[S],
    options: OneHotOptions,
) -> Result<IsaricData> {
    for field_name in field_names {
        one_hot_encode_field(&mut data, table_name, field_name.as_ref(), options)?;
    }
    Ok(data)
}

/// A category of a field being one-hot encoded.
struct Category {
    value: String,
    label: Option<String>,
    count: usize,
}

fn one_hot_encode_field(
    data: &mut IsaricData,
    table_name: &str,
    field_name: &str,
    options: OneHotOptions,
) -> Result<()> {
    let entry = data
        .data_dictionary
        .entry_in(table_name, field_name)
        .ok_or_else(|| Error::unknown_field(field_name, Some(table_name)))?
        .clone();
    if entry.field_type != FieldType::Categorical {
        return Err(Error::encoding(
            field_name,
            format!("field type is {}, expected categorical", entry.field_type),
        ));
    }
    let dictionary_options = entry.options()?;

    let table = data.table(table_name)?;
    let index = table
        .column_index(field_name)
        .ok_or_else(|| Error::unknown_field(field_name, Some(table_name)))?;
    let values = &table.columns()[index].values;

    // Category index for each row; None where the value is missing.
    let mut categories: Vec<Category> = dictionary_options
        .iter()
        .map(|o| Category {
            value: o.value.clone(),
            label: o.label.clone(),
            count: 0,
        })
        .collect();
    let mut row_category: Vec<Option<usize>> = Vec::with_capacity(values.len());
    for value in values {
        if value.is_null() {
            row_category.push(None);
            continue;
        }
        let text = value.as_text();
        let position = match dictionary_options.iter().position(|o| o.matches(&text)) {
            Some(position) => position,
            None => match categories.iter().position(|c| c.value == text) {
                Some(position) => position,
                None => {
                    categories.push(Category {
                        value: text,
                        label: None,
                        count: 0,
                    });
                    categories.len() - 1
                }
            },
        };
        categories[position].count += 1;
        row_category.push(Some(position));
    }

    let collapsed = collapsed_categories(&categories, options);
    let kept: Vec<usize> = (0..categories.len())
        .filter(|i| !collapsed.contains(i))
        .collect();

    let (sanitised, _) = sanitise_values(
        &kept
            .iter()
            .map(|&i| categories[i].value.as_str())
            .collect::<Vec<_>>(),
    );
    let mut new_columns: Vec<(Column, DictionaryEntry)> = Vec::new();
    let parent_label = entry.field_label.as_deref().unwrap_or(field_name);
    for (&category_index, suffix) in kept.iter().zip(&sanitised) {
        let category = &categories[category_index];
        let name = one_hot_name(field_name, suffix);
        let column_values = row_category
            .iter()
            .map(|row| {
                row.map(|c| Value::Bool(c == category_index))
                    .unwrap_or_default()
            })
            .collect();
        let option_label = category.label.as_deref().unwrap_or(&category.value);
        let mut child = DictionaryEntry::new(table_name, &name, FieldType::Binary)
            .with_label(format!("{parent_label}: {option_label}"));
        child.parent_field = Some(field_name.to_string());
        child.option_value = Some(category.value.clone());
        child.skip_logic = entry.skip_logic.clone();
        new_columns.push((Column::new(name, column_values), child));
    }
    if !collapsed.is_empty() {
        let name = one_hot_name(field_name, OTHER_VALUE);
        let column_values = row_category
            .iter()
            .map(|row| {
                row.map(|c| Value::Bool(collapsed.contains(&c)))
                    .unwrap_or_default()
            })
            .collect();
        let mut child = DictionaryEntry::new(table_name, &name, FieldType::Binary)
            .with_label(format!("{parent_label}: Other"));
        child.parent_field = Some(field_name.to_string());
        child.skip_logic = entry.skip_logic.clone();
        new_columns.push((Column::new(name, column_values), child));
    }

    replace_columns(
        data,
        table_name,
        &[field_name.to_string()],
        index,
        new_columns,
    )?;
    tracing::info!(
        table = table_name,
        field = field_name,
        categories = kept.len(),
        collapsed = collapsed.len(),
        "One-hot encoded field"
    );
    Ok(())
}

fn one_hot_name(field_name: &str, suffix: &str) -> String {
    format!("{field_name}{ONE_HOT_SEPARATOR}{suffix}")
}

/// Indices of the categories to collapse into `other`.
fn collapsed_categories(categories: &[Category], options: OneHotOptions) -> HashSet<usize> {
    let Some(threshold) = options.threshold() else {
        return HashSet::new();
    };
    let total: usize = categories.iter().map(|c| c.count).sum();
    if total == 0 {
        return HashSet::new();
    }
    categories
        .iter()
        .enumerate()
        .filter(|(_, c)| {
            (c.count as f64 / total as f64) < threshold
                || sanitise_string(&c.value) == OTHER_VALUE
        })
        .map(|(i, _)| i)
        .collect()
}

/// Remove `old` columns and their dictionary entries, then insert `new`
/// columns and entries where the first old column was.
fn replace_columns(
    data: &mut IsaricData,
    table_name: &str,
    old: &[String],
    column_index: usize,
    new: Vec<(Column, DictionaryEntry)>,
) -> Result<()> {
    let entry_index = old
        .iter()
        .filter_map(|name| data.data_dictionary.position(table_name, name))
        .min();

    let table = data.table_mut(table_name)?;
    for name in old {
        table
            .remove_column(name)
            .map_err(|e| e.with_table(table_name))?;
    }
    let (columns, entries): (Vec<Column>, Vec<DictionaryEntry>) = new.into_iter().unzip();
    for (offset, column) in columns.into_iter().enumerate() {
        table
            .insert_column(column_index + offset, column)
            .map_err(|e| e.with_table(table_name))?;
    }

    for name in old {
        data.data_dictionary.remove(table_name, name);
    }
    let mut position = entry_index.unwrap_or(data.data_dictionary.len());
    for entry in entries {
        data.data_dictionary.insert(position, entry)?;
        position += 1;
    }
    Ok(())
}

// ============================================================================
// Inverse one-hot encoding
// ============================================================================

/// Rebuild categorical fields from their one-hot columns.
///
/// The one-hot columns of `field` are those whose dictionary entries name
/// it as `parent_field`, or failing that, the table's `<field>___*`
/// columns. A row takes the value of its one true column; rows with no
/// true column are missing. The value of a column is its `option_value`,
/// or else its name suffix.
///
/// # Errors
///
/// Returns `UnknownField` if no one-hot columns are found, and `Encoding`
/// if a row has more than one true column.
pub fn inverse_one_hot_encode<S: AsRef<str>>(
    mut data: IsaricData,
    table_name: &str,
    field_names: &[S],
    options: OneHotOptions,
) -> Result<IsaricData> {
    for field_name in field_names {
        inverse_one_hot_encode_field(&mut data, table_name, field_name.as_ref(), options)?;
    }
    Ok(data)
}

/// A one-hot column and the category it stands for.
struct OneHotColumn {
    name: String,
    value: String,
}

fn one_hot_columns(
    data: &IsaricData,
    table_name: &str,
    field_name: &str,
) -> Result<Vec<OneHotColumn>> {
    let table = data.table(table_name)?;
    let from_dictionary: Vec<OneHotColumn> = data
        .data_dictionary
        .children_of(table_name, field_name)
        .filter(|e| table.has_column(&e.field_name))
        .map(|e| OneHotColumn {
            name: e.field_name.clone(),
            value: e
                .option_value
                .clone()
                .unwrap_or_else(|| suffix_of(field_name, &e.field_name).to_string()),
        })
        .collect();
    if !from_dictionary.is_empty() {
        return Ok(from_dictionary);
    }

    let prefix = one_hot_name(field_name, "");
    let from_names: Vec<OneHotColumn> = table
        .column_names()
        .into_iter()
        .filter(|name| name.starts_with(&prefix) && name.len() > prefix.len())
        .map(|name| OneHotColumn {
            name: name.to_string(),
            value: name[prefix.len()..].to_string(),
        })
        .collect();
    if from_names.is_empty() {
        return Err(Error::unknown_field(field_name, Some(table_name)));
    }
    Ok(from_names)
}

fn suffix_of<'a>(field_name: &str, column_name: &'a str) -> &'a str {
    column_name
        .strip_prefix(field_name)
        .and_then(|rest| rest.strip_prefix(ONE_HOT_SEPARATOR))
        .unwrap_or(column_name)
}

fn is_set(value: &Value) -> Option<bool> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(*n != 0.0),
        other => match other.as_text().trim().to_lowercase().as_str() {
            "" => None,
            "0" | "false" | "no" | "n" => Some(false),
            _ => Some(true),
        },
    }
}

fn inverse_one_hot_encode_field(
    data: &mut IsaricData,
    table_name: &str,
    field_name: &str,
    options: OneHotOptions,
) -> Result<()> {
    let children = one_hot_columns(data, table_name, field_name)?;
    let table = data.table(table_name)?;
    if table.has_column(field_name) {
        return Err(Error::duplicate_field(field_name, Some(table_name)));
    }

    let mut column_index = usize::MAX;
    let mut child_values: Vec<&[Value]> = Vec::with_capacity(children.len());
    for child in &children {
        let index = table
            .column_index(&child.name)
            .ok_or_else(|| Error::unknown_field(&child.name, Some(table_name)))?;
        column_index = column_index.min(index);
        child_values.push(&table.columns()[index].values);
    }

    let mut rebuilt: Vec<Option<usize>> = Vec::with_capacity(table.n_rows());
    for row in 0..table.n_rows() {
        let set: Vec<usize> = child_values
            .iter()
            .enumerate()
            .filter(|(_, values)| is_set(&values[row]) == Some(true))
            .map(|(i, _)| i)
            .collect();
        match set.as_slice() {
            [] => rebuilt.push(None),
            [only] => rebuilt.push(Some(*only)),
            several => {
                let names: Vec<&str> =
                    several.iter().map(|&i| children[i].name.as_str()).collect();
                return Err(Error::encoding(
                    field_name,
                    format!(
                        "row {} has more than one one-hot column set: {}",
                        row + 1,
                        names.join(", ")
                    ),
                ));
            }
        }
    }

    let categories: Vec<Category> = children
        .iter()
        .enumerate()
        .map(|(i, child)| Category {
            value: child.value.clone(),
            label: None,
            count: rebuilt.iter().filter(|r| **r == Some(i)).count(),
        })
        .collect();
    let collapsed = collapsed_categories(&categories, options);
    let category_values: Vec<&str> = categories
        .iter()
        .enumerate()
        .map(|(i, c)| {
            if collapsed.contains(&i) {
                OTHER_VALUE
            } else {
                c.value.as_str()
            }
        })
        .collect();

    let values: Vec<Value> = rebuilt
        .iter()
        .map(|row| {
            row.map(|i| Value::Text(category_values[i].to_string()))
                .unwrap_or_default()
        })
        .collect();

    let mut seen = HashSet::new();
    let field_options: Vec<FieldOption> = category_values
        .iter()
        .filter(|value| seen.insert(**value))
        .map(|value| FieldOption::new(*value))
        .collect();

    let first_child = data.data_dictionary.entry_in(table_name, &children[0].name);
    let label = first_child
        .and_then(|e| e.field_label.as_deref())
        .and_then(|l| l.rsplit_once(": ").map(|(parent, _)| parent.to_string()));
    let skip_logic = first_child.and_then(|e| e.skip_logic.clone());

    let mut entry = DictionaryEntry::new(table_name, field_name, FieldType::Categorical)
        .with_options(&field_options);
    entry.field_label = label;
    entry.skip_logic = skip_logic;

    let old: Vec<String> = children.iter().map(|c| c.name.clone()).collect();
    replace_columns(
        data,
        table_name,
        &old,
        column_index,
        vec![(Column::new(field_name, values), entry)],
    )?;
    tracing::info!(
        table = table_name,
        field = field_name,
        columns = old.len(),
        collapsed = collapsed.len(),
        "Inverted one-hot encoding"
    );
    Ok(())
}

// ============================================================================
// Yes/No/Unknown to boolean
// ============================================================================

/// Convert yes/no/unknown fields to booleans.
///
/// `yes`, `y`, `1` and `true` become true; `no`, `n`, `0` and `false`
/// become false; `unknown`, `u`, `unk`, `99` and missing values become
/// missing. Matching ignores case and surrounding whitespace. The
/// dictionary entry, if any, becomes `binary` with no options.
///
/// # Errors
///
/// Returns `UnknownField` if the table lacks the field, and `Encoding`
/// listing every distinct value that is not yes, no or unknown.
pub fn categorical_ynu_to_boolean<S: AsRef<str>>(
    mut data: IsaricData,
    table_name: &str,
    field_names: &[S],
) -> Result<IsaricData> {
    for field_name in field_names {
        let field_name = field_name.as_ref();
        let column = data
            .table_mut(table_name)?
            .column_mut(field_name)
            .ok_or_else(|| Error::unknown_field(field_name, Some(table_name)))?;

        let mut counts: HashMap<&'static str, usize> = HashMap::new();
        let mut invalid: Vec<String> = Vec::new();
        let converted: Vec<Value> = column
            .values
            .iter()
            .map(|value| match ynu_to_boolean(value) {
                Ok(converted) => {
                    *counts.entry(converted.kind()).or_insert(0) += 1;
                    converted
                }
                Err(text) => {
                    if !invalid.contains(&text) {
                        invalid.push(text);
                    }
                    Value::Null
                }
            })
            .collect();
        if !invalid.is_empty() {
            let listed: Vec<String> = invalid.iter().map(|text| format!("'{text}'")).collect();
            return Err(Error::encoding(
                field_name,
                format!("{} not yes, no or unknown", listed.join(", ")),
            ));
        }
        column.values = converted;

        if let Some(entry) = data.data_dictionary.entry_in_mut(table_name, field_name) {
            entry.field_type = FieldType::Binary;
            entry.field_options = None;
        }
        tracing::info!(
            table = table_name,
            field = field_name,
            booleans = counts.get("bool").copied().unwrap_or(0),
            missing = counts.get("null").copied().unwrap_or(0),
            "Converted yes/no/unknown field to boolean"
        );
    }
    Ok(data)
}

fn ynu_to_boolean(value: &Value) -> std::result::Result<Value, String> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Bool(b) => Ok(Value::Bool(*b)),
        other => {
            let text = other.as_text();
            match text.trim().to_lowercase().as_str() {
                "yes" | "y" | "1" | "true" => Ok(Value::Bool(true)),
                "no" | "n" | "0" | "false" => Ok(Value::Bool(false)),
                "unknown" | "u" | "unk" | "99" | "" => Ok(Value::Null),
                _ => Err(text),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use isaric_core::{SUBJECT_ID_FIELD, Table};
    use isaric_data::{DataDictionary, Metadata, OUTCOME, PRESENTATION};

    const PLAIN: OneHotOptions = OneHotOptions {
        collapse_to_other: false,
        collapse_threshold: None,
    };

    fn text(cells: &[&str]) -> Vec<Value> {
        cells.iter().map(|c| isaric_core::value::parse_text(c)).collect()
    }

    fn sample() -> IsaricData {
        let dictionary = DataDictionary::new(vec![
            DictionaryEntry::new(PRESENTATION, "country", FieldType::Categorical)
                .with_label("Country")
                .with_options(&[
                    FieldOption::new("GBR"),
                    FieldOption::new("VNM"),
                    FieldOption::new("USA"),
                ]),
            DictionaryEntry::new(PRESENTATION, "sex", FieldType::Categorical)
                .with_label("Sex")
                .with_options(&[
                    FieldOption::labelled("1", "Male"),
                    FieldOption::labelled("2", "Female"),
                ]),
            DictionaryEntry::new(PRESENTATION, "fever", FieldType::Categorical),
            DictionaryEntry::new(PRESENTATION, "age", FieldType::Numeric),
            DictionaryEntry::new(OUTCOME, "outcome", FieldType::Categorical),
        ]);
        let presentation = Table::from_columns(vec![
            Column::new(SUBJECT_ID_FIELD, text(&["S1", "S2", "S3", "S4", "S5"])),
            Column::new("country", text(&["GBR", "GBR", "Peru", "", "GBR"])),
            Column::new("sex", text(&["Male", "2", "Female", "1", ""])),
            Column::new("fever", text(&["Yes", "no", "Unknown", "", "Y"])),
            Column::new("age", vec![Value::Number(1.0); 5]),
        ])
        .unwrap();
        let outcome = Table::from_columns(vec![
            Column::new(SUBJECT_ID_FIELD, text(&["S1"])),
            Column::new("outcome", text(&["Death"])),
        ])
        .unwrap();
        IsaricData::new(Metadata::default(), dictionary, presentation, outcome).unwrap()
    }

    fn bools(data: &IsaricData, column: &str) -> Vec<Option<bool>> {
        data.presentation
            .column(column)
            .unwrap()
            .values
            .iter()
            .map(Value::as_bool)
            .collect()
    }

    #[test]
    fn test_method_names() {
        for method in EncodeMethod::ALL {
            assert_eq!(method.name().parse::<EncodeMethod>().unwrap(), method);
        }
        assert_eq!(
            "categorical-ynu-to-boolean".parse::<EncodeMethod>().unwrap(),
            EncodeMethod::CategoricalYnuToBoolean
        );
        let err = "label-encode".parse::<EncodeMethod>().unwrap_err();
        let Error::UnknownMethod { method } = err else {
            unreachable!("Expected UnknownMethod");
        };
        assert_eq!(method, "label-encode");
    }

    #[test]
    fn test_one_hot_encode_columns_and_order() {
        let data = one_hot_encode(sample(), PRESENTATION, &["country"], PLAIN).unwrap();
        assert_eq!(
            data.presentation.column_names(),
            vec![
                SUBJECT_ID_FIELD,
                "country___gbr",
                "country___vnm",
                "country___usa",
                "country___peru",
                "sex",
                "fever",
                "age"
            ]
        );
        assert_eq!(
            bools(&data, "country___gbr"),
            vec![Some(true), Some(true), Some(false), None, Some(true)]
        );
        assert_eq!(
            bools(&data, "country___vnm"),
            vec![Some(false), Some(false), Some(false), None, Some(false)]
        );
        assert_eq!(
            bools(&data, "country___peru"),
            vec![Some(false), Some(false), Some(true), None, Some(false)]
        );
    }

    #[test]
    fn test_one_hot_encode_updates_dictionary() {
        let data = one_hot_encode(sample(), PRESENTATION, &["sex"], PLAIN).unwrap();
        let dictionary = &data.data_dictionary;
        assert!(dictionary.entry_in(PRESENTATION, "sex").is_none());

        let male = dictionary.entry_in(PRESENTATION, "sex___1").unwrap();
        assert_eq!(male.field_type, FieldType::Binary);
        assert_eq!(male.parent_field.as_deref(), Some("sex"));
        assert_eq!(male.option_value.as_deref(), Some("1"));
        assert_eq!(male.field_label.as_deref(), Some("Sex: Male"));

        // Labels in the data match their option values.
        assert_eq!(
            bools(&data, "sex___1"),
            vec![Some(true), Some(false), Some(false), Some(true), None]
        );
        assert_eq!(dictionary.position(PRESENTATION, "sex___1"), Some(1));
        assert_eq!(dictionary.position(PRESENTATION, "sex___2"), Some(2));
    }

    #[test]
    fn test_one_hot_encode_collapse_to_other() {
        // GBR is 3/4 of non-missing rows, Peru 1/4, VNM and USA 0.
        let options = OneHotOptions::collapsing(0.3);
        let data = one_hot_encode(sample(), PRESENTATION, &["country"], options).unwrap();
        let names = data.presentation.column_names();
        assert!(names.contains(&"country___gbr"));
        assert!(names.contains(&"country___other"));
        assert!(!names.contains(&"country___peru"));
        assert_eq!(
            bools(&data, "country___other"),
            vec![Some(false), Some(false), Some(true), None, Some(false)]
        );
        let other = data
            .data_dictionary
            .entry_in(PRESENTATION, "country___other")
            .unwrap();
        assert_eq!(other.option_value, None);
    }

    #[test]
    fn test_one_hot_encode_folds_values_named_other() {
        let mut data = sample();
        let country = data.presentation.column_mut("country").unwrap();
        country.values = text(&["Other.", "Other.", "Other.", "GBR", "Peru"]);
        let options = OneHotOptions::collapsing(0.3);
        let data = one_hot_encode(data, PRESENTATION, &["country"], options).unwrap();
        let one_hot: Vec<&str> = data
            .presentation
            .column_names()
            .into_iter()
            .filter(|name| name.starts_with("country___"))
            .collect();
        assert_eq!(one_hot, vec!["country___other"]);
        assert_eq!(
            bools(&data, "country___other"),
            vec![Some(true), Some(true), Some(true), Some(true), Some(true)]
        );
    }

    #[test]
    fn test_one_hot_encode_default_threshold() {
        let options = OneHotOptions {
            collapse_to_other: true,
            collapse_threshold: None,
        };
        assert_eq!(options.threshold(), Some(DEFAULT_COLLAPSE_THRESHOLD));
        assert_eq!(OneHotOptions::default().threshold(), None);
    }

    #[test]
    fn test_one_hot_encode_errors() {
        let err = one_hot_encode(sample(), PRESENTATION, &["age"], PLAIN).unwrap_err();
        assert!(matches!(err, Error::Encoding { .. }));

        let err = one_hot_encode(sample(), PRESENTATION, &["weight"], PLAIN).unwrap_err();
        assert!(matches!(err, Error::UnknownField { .. }));

        let err = one_hot_encode(sample(), "vitals", &["weight"], PLAIN).unwrap_err();
        assert!(matches!(err, Error::UnknownField { .. }));
    }

    #[test]
    fn test_inverse_restores_field() {
        let original = sample();
        let encoded = one_hot_encode(original.clone(), PRESENTATION, &["country"], PLAIN).unwrap();
        let decoded = inverse_one_hot_encode(encoded, PRESENTATION, &["country"], PLAIN).unwrap();

        assert_eq!(
            decoded.presentation.column_names(),
            original.presentation.column_names()
        );
        assert_eq!(
            decoded.presentation.column("country"),
            original.presentation.column("country")
        );
        let entry = decoded.data_dictionary.entry_in(PRESENTATION, "country").unwrap();
        assert_eq!(entry.field_type, FieldType::Categorical);
        assert_eq!(entry.field_label.as_deref(), Some("Country"));
        let values: Vec<String> = entry
            .options()
            .unwrap()
            .into_iter()
            .map(|o| o.value)
            .collect();
        assert_eq!(values, vec!["GBR", "VNM", "USA", "Peru"]);
        assert_eq!(decoded.data_dictionary.position(PRESENTATION, "country"), Some(0));
    }

    #[test]
    fn test_inverse_from_column_names() {
        let mut data = sample();
        let table = &mut data.presentation;
        table
            .add_column(Column::new(
                "symptom___cough",
                vec![
                    true.into(),
                    false.into(),
                    Value::Null,
                    Value::Number(0.0),
                    "1".into(),
                ],
            ))
            .unwrap();
        table
            .add_column(Column::new(
                "symptom___rash",
                vec![
                    false.into(),
                    true.into(),
                    Value::Null,
                    Value::Number(0.0),
                    "0".into(),
                ],
            ))
            .unwrap();

        let data = inverse_one_hot_encode(data, PRESENTATION, &["symptom"], PLAIN).unwrap();
        assert_eq!(
            data.presentation.column("symptom").unwrap().values,
            vec![
                Value::Text("cough".into()),
                Value::Text("rash".into()),
                Value::Null,
                Value::Null,
                Value::Text("cough".into()),
            ]
        );
        assert!(!data.presentation.has_column("symptom___cough"));
        assert!(data.data_dictionary.contains(PRESENTATION, "symptom"));
    }

    #[test]
    fn test_inverse_rejects_several_set() {
        let mut data = sample();
        for name in ["x___a", "x___b"] {
            data.presentation
                .add_column(Column::new(name, vec![true.into(); 5]))
                .unwrap();
        }
        let err = inverse_one_hot_encode(data, PRESENTATION, &["x"], PLAIN).unwrap_err();
        let Error::Encoding { field, message } = err else {
            unreachable!("Expected Encoding");
        };
        assert_eq!(field, "x");
        assert!(message.contains("x___a, x___b"));
    }

    #[test]
    fn test_inverse_collapses_rare_values() {
        let encoded = one_hot_encode(sample(), PRESENTATION, &["country"], PLAIN).unwrap();
        let options = OneHotOptions::collapsing(0.3);
        let decoded = inverse_one_hot_encode(encoded, PRESENTATION, &["country"], options).unwrap();
        assert_eq!(
            decoded.presentation.column("country").unwrap().values,
            text(&["GBR", "GBR", "other", "", "GBR"])
        );
        let entry = decoded.data_dictionary.entry_in(PRESENTATION, "country").unwrap();
        let values: Vec<String> = entry
            .options()
            .unwrap()
            .into_iter()
            .map(|o| o.value)
            .collect();
        assert_eq!(values, vec!["GBR", "other"]);
    }

    #[test]
    fn test_inverse_without_columns() {
        let err = inverse_one_hot_encode(sample(), PRESENTATION, &["nothing"], PLAIN).unwrap_err();
        assert!(matches!(err, Error::UnknownField { .. }));
    }

    #[test]
    fn test_ynu_to_boolean() {
        let data = categorical_ynu_to_boolean(sample(), PRESENTATION, &["fever"]).unwrap();
        assert_eq!(
            data.presentation.column("fever").unwrap().values,
            vec![
                Value::Bool(true),
                Value::Bool(false),
                Value::Null,
                Value::Null,
                Value::Bool(true)
            ]
        );
        let entry = data.data_dictionary.entry_in(PRESENTATION, "fever").unwrap();
        assert_eq!(entry.field_type, FieldType::Binary);
    }

    #[test]
    fn test_ynu_rejects_other_values() {
        let err = categorical_ynu_to_boolean(sample(), PRESENTATION, &["country"]).unwrap_err();
        let Error::Encoding { field, message } = err else {
            unreachable!("Expected Encoding");
        };
        assert_eq!(field, "country");
        assert_eq!(message, "'GBR', 'Peru' not yes, no or unknown");
    }

    #[test]
    fn test_ynu_mapping() {
        for (raw, expected) in [
            ("YES", Some(true)),
            (" n ", Some(false)),
            ("1", Some(true)),
            ("False", Some(false)),
            ("unk", None),
            ("99", None),
            ("U", None),
        ] {
            let converted = ynu_to_boolean(&Value::Text(raw.into())).unwrap();
            assert_eq!(converted.as_bool(), expected, "{raw}");
        }
        assert_eq!(ynu_to_boolean(&Value::Number(1.0)).unwrap(), Value::Bool(true));
        assert!(ynu_to_boolean(&Value::Number(2.0)).is_err());
    }

    #[test]
    fn test_encode_dispatch() {
        let method = "categorical_ynu-to-boolean";
        let data = encode(sample(), method, PRESENTATION, &["fever"], PLAIN).unwrap();
        assert_eq!(
            data.data_dictionary.entry_in(PRESENTATION, "fever").unwrap().field_type,
            FieldType::Binary
        );
        let err = encode(sample(), "bogus", PRESENTATION, &["fever"], PLAIN).unwrap_err();
        assert!(matches!(err, Error::UnknownMethod { .. }));
    }
}
