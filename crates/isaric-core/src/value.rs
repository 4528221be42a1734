//! Cell values for tabular project data.
//!
//! Project tables are read from CSV, so every cell starts life as text.
//! The helpers here turn that text into a [`Value`] according to the field
//! type recorded in the data dictionary.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Text tokens treated as missing when inferring a value.
pub const NA_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "None", "<NA>",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Format used when rendering datetimes as text.
pub const DATETIME_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single cell in a [`Table`](crate::Table).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Missing value.
    #[default]
    Null,
    /// Free text or a categorical code.
    Text(String),
    /// Numeric value.
    Number(f64),
    /// Boolean value.
    Bool(bool),
    /// Date and time without timezone.
    DateTime(NaiveDateTime),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the inner string for [`Value::Text`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of the value.
    ///
    /// Numbers are returned as-is, booleans as `1.0`/`0.0`, and text is
    /// parsed when it holds a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            Value::Null | Value::DateTime(_) => None,
        }
    }

    /// Returns the boolean for [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Text used when comparing values in skip logic and when writing CSV.
    ///
    /// Missing values render as the empty string, integral numbers without
    /// a fractional part and booleans as `1`/`0`.
    pub fn as_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Text(s) => s.clone(),
            Value::Number(n) => format_number(*n),
            Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
            Value::DateTime(dt) => dt.format(DATETIME_DISPLAY_FORMAT).to_string(),
        }
    }

    /// Short lowercase name of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Text(_) => "text",
            Value::Number(_) => "number",
            Value::Bool(_) => "bool",
            Value::DateTime(_) => "datetime",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Parse a text field: blank cells are missing, everything else is kept verbatim.
pub fn parse_text(raw: &str) -> Value {
    if raw.is_empty() {
        Value::Null
    } else {
        Value::Text(raw.to_string())
    }
}

/// Parse a numeric field; unparseable cells become missing.
pub fn parse_number(raw: &str) -> Value {
    let trimmed = raw.trim();
    if NA_TOKENS.contains(&trimmed) {
        return Value::Null;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|n| !n.is_nan())
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Parse a datetime field; unparseable cells become missing.
///
/// # Examples
///
/// ```
/// use isaric_core::value::{parse_datetime, Value};
///
/// assert!(matches!(parse_datetime("2023-04-01"), Value::DateTime(_)));
/// assert!(matches!(parse_datetime("2023-04-01 08:30"), Value::DateTime(_)));
/// assert_eq!(parse_datetime("not a date"), Value::Null);
/// ```
pub fn parse_datetime(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Value::DateTime(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0).into();
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Value::DateTime(dt.naive_utc());
    }
    Value::Null
}

/// Infer the type of a cell with no declared field type.
///
/// # Examples
///
/// ```
/// use isaric_core::value::{parse_inferred, Value};
///
/// assert_eq!(parse_inferred("NA"), Value::Null);
/// assert_eq!(parse_inferred("37.5"), Value::Number(37.5));
/// assert_eq!(parse_inferred("true"), Value::Bool(true));
/// assert_eq!(parse_inferred("fever"), Value::Text("fever".into()));
/// ```
pub fn parse_inferred(raw: &str) -> Value {
    let trimmed = raw.trim();
    if NA_TOKENS.contains(&trimmed) {
        return Value::Null;
    }
    match trimmed {
        "true" | "True" | "TRUE" => return Value::Bool(true),
        "false" | "False" | "FALSE" => return Value::Bool(false),
        _ => {}
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Value::Number(n),
        _ => Value::Text(raw.to_string()),
    }
}
