//! Skip logic evaluated against the fixture project.

use isaric_cleaning::{apply_skip_logic, skip_logic_filter};
use isaric_core::Value;

use super::fixture_project;

#[test]
fn test_pregnancy_applies_to_female_subjects() {
    let data = fixture_project();
    let mask = skip_logic_filter(&data, "pregnant").unwrap();
    assert_eq!(mask, vec![true, false, true, false, true, false]);
}

#[test]
fn test_outcome_date_skips_censored() {
    let data = fixture_project();
    let mask = skip_logic_filter(&data, "outcome_date").unwrap();
    assert_eq!(mask, vec![true, true, true, false, true, true]);
}

#[test]
fn test_field_without_logic() {
    let data = fixture_project();
    let mask = skip_logic_filter(&data, "oxygen").unwrap();
    assert_eq!(mask.len(), 5);
    assert!(mask.iter().all(|m| *m));
}

#[test]
fn test_temperature_cleared_without_fever() {
    let mut data = fixture_project();
    let cleared = apply_skip_logic(&mut data, "temp").unwrap();
    assert_eq!(cleared, 1);

    let temp = &data.presentation.column("temp").unwrap().values;
    assert_eq!(temp[0], Value::Number(38.6));
    assert_eq!(temp[5], Value::Null);

    // Applying again finds nothing left to clear.
    assert_eq!(apply_skip_logic(&mut data, "temp").unwrap(), 0);
}
