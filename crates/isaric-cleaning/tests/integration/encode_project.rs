//! Encoders run against the fixture project.

use isaric_cleaning::{OneHotOptions, encode, inverse_one_hot_encode, one_hot_encode};
use isaric_core::Value;
use isaric_data::{DAILY, FieldType, PRESENTATION};

use super::fixture_project;

#[test]
fn test_one_hot_round_trip_on_country() {
    let original = fixture_project();
    let encoded = one_hot_encode(
        original.clone(),
        PRESENTATION,
        &["country"],
        OneHotOptions::default(),
    )
    .unwrap();

    let names = encoded.presentation.column_names();
    assert!(names.contains(&"country___gbr"));
    assert!(names.contains(&"country___vnm"));
    assert!(names.contains(&"country___usa"));
    assert!(!names.contains(&"country"));
    encoded.validate().expect("Encoded data should still validate");

    let decoded = inverse_one_hot_encode(
        encoded,
        PRESENTATION,
        &["country"],
        OneHotOptions::default(),
    )
    .unwrap();
    assert_eq!(
        decoded.presentation.column("country"),
        original.presentation.column("country")
    );
    assert_eq!(
        decoded.presentation.column_names(),
        original.presentation.column_names()
    );
}

#[test]
fn test_collapse_rare_countries() {
    let data = fixture_project();
    let encoded = one_hot_encode(
        data,
        PRESENTATION,
        &["country"],
        OneHotOptions::collapsing(0.2),
    )
    .unwrap();
    // GBR 3/6, VNM 2/6, USA 1/6.
    let names = encoded.presentation.column_names();
    assert!(names.contains(&"country___gbr"));
    assert!(names.contains(&"country___vnm"));
    assert!(names.contains(&"country___other"));
    assert!(!names.contains(&"country___usa"));
}

#[test]
fn test_ynu_on_fever_by_name() {
    let data = fixture_project();
    let data = encode(
        data,
        "categorical_ynu-to-boolean",
        PRESENTATION,
        &["fever"],
        OneHotOptions::default(),
    )
    .unwrap();
    assert_eq!(
        data.presentation.column("fever").unwrap().values,
        vec![
            Value::Bool(true),
            Value::Bool(true),
            Value::Bool(false),
            Value::Null,
            Value::Bool(true),
            Value::Bool(false),
        ]
    );
    assert_eq!(
        data.data_dictionary
            .entry_in(PRESENTATION, "fever")
            .unwrap()
            .field_type,
        FieldType::Binary
    );
}

#[test]
fn test_one_hot_daily_table() {
    let data = fixture_project();
    let data = one_hot_encode(data, DAILY, &["oxygen"], OneHotOptions::default()).unwrap();
    let daily = data.daily.as_ref().unwrap();
    assert_eq!(
        daily.column_names(),
        vec![
            "subjid",
            "day",
            "daily_date",
            "oxygen___yes",
            "oxygen___no",
            "oxygen___unknown"
        ]
    );
    let summary = data.describe_table(DAILY).unwrap();
    assert_eq!(summary.column("oxygen___yes").unwrap().count, 5);
}
