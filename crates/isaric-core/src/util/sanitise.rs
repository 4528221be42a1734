//! String sanitising for generated field names.
//!
//! Category values become part of column names when a field is one-hot
//! encoded, so they are reduced to lowercase alphanumerics and underscores.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

static DISALLOWED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9a-z_]").expect("Invalid character-class regex"));

/// Sanitise a string for use in a field name.
///
/// Performs the following transformations:
/// 1. Trims leading/trailing whitespace
/// 2. Converts to lowercase
/// 3. Replaces each run of whitespace with one underscore
/// 4. Removes every character except `0-9`, `a-z` and `_`
///
/// # Examples
///
/// ```
/// use isaric_core::util::sanitise::sanitise_string;
///
/// assert_eq!(sanitise_string("Yes"), "yes");
/// assert_eq!(sanitise_string("  Lost to follow-up "), "lost_to_followup");
/// assert_eq!(sanitise_string("SpO2 (%)"), "spo2_");
/// ```
pub fn sanitise_string(s: &str) -> String {
    let lowered = s.trim().to_lowercase();
    let underscored = WHITESPACE_RE.replace_all(&lowered, "_");
    DISALLOWED_RE.replace_all(&underscored, "").into_owned()
}

/// Sanitise many strings at once, keeping the results distinct.
///
/// Returns the sanitised strings (one per input, in order) and a mapping
/// from each distinct original string to its sanitised form. When distinct
/// originals sanitise to the same string, the first one seen keeps the bare
/// form and later ones get the lowest free `__1`, `__2`, … suffix.
///
/// # Examples
///
/// ```
/// use isaric_core::util::sanitise::sanitise_values;
///
/// let (values, mapping) = sanitise_values(&["Yes", "YES", "No", "Yes"]);
/// assert_eq!(values, vec!["yes", "yes__1", "no", "yes"]);
/// assert_eq!(mapping["YES"], "yes__1");
/// ```
pub fn sanitise_values<S: AsRef<str>>(values: &[S]) -> (Vec<String>, BTreeMap<String, String>) {
    let mut mapping: BTreeMap<String, String> = BTreeMap::new();
    let mut used: HashSet<String> = HashSet::new();
    let mut next_suffix: HashMap<String, usize> = HashMap::new();

    for value in values {
        let original = value.as_ref();
        if mapping.contains_key(original) {
            continue;
        }
        let clean = sanitise_string(original);
        let unique = if used.contains(&clean) {
            let n = next_suffix.entry(clean.clone()).or_insert(1);
            // A natural value may already hold `<clean>__<n>`.
            while used.contains(&format!("{clean}__{n}")) {
                *n += 1;
            }
            let candidate = format!("{clean}__{n}");
            *n += 1;
            candidate
        } else {
            clean
        };
        used.insert(unique.clone());
        mapping.insert(original.to_string(), unique);
    }

    let sanitised = values
        .iter()
        .map(|v| mapping[v.as_ref()].clone())
        .collect();
    (sanitised, mapping)
}
