//! Row filters derived from the data dictionary.

use std::collections::{HashMap, HashSet};

use isaric_core::{Error, Result, SUBJECT_ID_FIELD, Table, Value};
use isaric_data::{IsaricData, PRESENTATION};

use crate::skip_logic::SkipLogic;

/// One flag per row of a table.
pub type Mask = Vec<bool>;

/// Mask of the rows where a field's skip logic is met.
///
/// The mask has one entry per row of the table the field belongs to.
/// Fields referenced by the logic are read from the same row when that
/// table has them, and otherwise from the subject's first row in the
/// presentation table. Blank logic gives an all-true mask.
///
/// # Errors
///
/// Returns `UnknownField` if the field is not in the data dictionary, and
/// `Parse` if its skip logic is malformed.
pub fn skip_logic_filter(data: &IsaricData, field_name: &str) -> Result<Mask> {
    let entry = data
        .data_dictionary
        .entry(field_name)
        .ok_or_else(|| Error::unknown_field(field_name, None))?;
    let table_name = entry.table_name.as_str();
    let table = data.table(table_name)?;

    let logic = SkipLogic::parse(entry.skip_logic.as_deref().unwrap_or_default())?;
    if logic.is_always() {
        tracing::debug!(field = field_name, "Field has no skip logic");
        return Ok(vec![true; table.n_rows()]);
    }

    let fallback = (table_name != PRESENTATION).then(|| SubjectRows::new(&data.presentation));
    warn_unresolved(&logic, table, fallback.as_ref(), field_name);

    let mask: Mask = table
        .rows()
        .map(|row| {
            logic.evaluate(|name| {
                if let Some(value) = row.get(name) {
                    return value.as_text();
                }
                fallback
                    .as_ref()
                    .and_then(|subjects| subjects.value(row.get(SUBJECT_ID_FIELD)?, name))
                    .map(Value::as_text)
                    .unwrap_or_default()
            })
        })
        .collect();

    tracing::debug!(
        field = field_name,
        table = table_name,
        logic = %logic,
        met = mask.iter().filter(|m| **m).count(),
        rows = mask.len(),
        "Evaluated skip logic"
    );
    Ok(mask)
}

/// Clear a field wherever its skip logic is not met.
///
/// Returns the number of values that were present and are now missing.
pub fn apply_skip_logic(data: &mut IsaricData, field_name: &str) -> Result<usize> {
    let mask = skip_logic_filter(data, field_name)?;
    let table_name = data
        .data_dictionary
        .entry(field_name)
        .map(|e| e.table_name.clone())
        .ok_or_else(|| Error::unknown_field(field_name, None))?;

    let column = data
        .table_mut(&table_name)?
        .column_mut(field_name)
        .ok_or_else(|| Error::unknown_field(field_name, Some(&table_name)))?;

    let mut cleared = 0;
    for (value, keep) in column.values.iter_mut().zip(&mask) {
        if !keep && !value.is_null() {
            *value = Value::Null;
            cleared += 1;
        }
    }
    tracing::info!(
        field = field_name,
        table = %table_name,
        cleared,
        "Applied skip logic"
    );
    Ok(cleared)
}

/// First presentation row of each subject.
struct SubjectRows<'a> {
    table: &'a Table,
    first_row: HashMap<String, usize>,
}

impl<'a> SubjectRows<'a> {
    fn new(table: &'a Table) -> Self {
        let mut first_row = HashMap::new();
        if let Some(ids) = table.column(SUBJECT_ID_FIELD) {
            for (index, id) in ids.values.iter().enumerate() {
                if !id.is_null() {
                    first_row.entry(id.as_text()).or_insert(index);
                }
            }
        }
        Self { table, first_row }
    }

    fn has_column(&self, name: &str) -> bool {
        self.table.has_column(name)
    }

    fn value(&self, subjid: &Value, name: &str) -> Option<&'a Value> {
        let index = *self.first_row.get(&subjid.as_text())?;
        self.table.row(index)?.get(name)
    }
}

fn warn_unresolved(
    logic: &SkipLogic,
    table: &Table,
    fallback: Option<&SubjectRows<'_>>,
    field_name: &str,
) {
    let missing: HashSet<&str> = logic
        .fields()
        .into_iter()
        .filter(|name| !table.has_column(name))
        .filter(|name| !fallback.is_some_and(|subjects| subjects.has_column(name)))
        .collect();
    for name in missing {
        tracing::warn!(
            field = field_name,
            reference = name,
            "Skip logic refers to a field that is not loaded; treating it as missing"
        );
    }
}
