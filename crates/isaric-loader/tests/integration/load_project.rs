//! Integration tests for loading a complete project.

use isaric_core::{SUBJECT_ID_FIELD, Value};
use isaric_data::{FieldType, OUTCOME, PRESENTATION};
use isaric_loader::{Loader, load_data_from_file};

use crate::common::{ProjectCopy, fixture_dir};

#[test]
fn test_load_fixture_project() {
    let data = load_data_from_file(fixture_dir(), true).expect("Fixture should load and validate");

    assert_eq!(data.presentation.n_rows(), 6);
    assert_eq!(data.presentation.n_columns(), 8);
    assert_eq!(data.outcome.n_rows(), 6);
    assert_eq!(data.daily.as_ref().map(|t| t.n_rows()), Some(5));

    let events = data.events.as_ref().expect("Events should be loaded");
    assert_eq!(events.len(), 1);
    assert_eq!(events["treatment"].n_rows(), 4);
    assert_eq!(
        data.table_names(),
        vec!["presentation", "outcome", "daily", "treatment"]
    );
}

#[test]
fn test_columns_are_typed_by_dictionary() {
    let data = load_data_from_file(fixture_dir(), false).unwrap();
    let presentation = &data.presentation;

    let age = &presentation.column("age").unwrap().values;
    assert_eq!(age[0], Value::Number(34.0));
    assert_eq!(age[5], Value::Null);

    let sex = &presentation.column("sex").unwrap().values;
    assert_eq!(sex[1], Value::Text("Male".into()));

    let pres_date = &presentation.column("pres_date").unwrap().values;
    assert!(matches!(pres_date[0], Value::DateTime(_)));

    let pregnant = &presentation.column("pregnant").unwrap().values;
    assert_eq!(pregnant[1], Value::Null);

    let ids = &presentation.column(SUBJECT_ID_FIELD).unwrap().values;
    assert_eq!(ids[0], Value::Text("H5-001".into()));
}

#[test]
fn test_byte_order_mark_is_stripped() {
    let data = load_data_from_file(fixture_dir(), false).unwrap();
    assert_eq!(data.outcome.column_names()[0], SUBJECT_ID_FIELD);
    let dates = &data.outcome.column("outcome_date").unwrap().values;
    assert_eq!(dates[3], Value::Null);
}

#[test]
fn test_loader_step_by_step() {
    let mut loader = Loader::new(fixture_dir()).unwrap();
    assert!(loader.metadata().is_none());

    let metadata = loader.load_metadata().unwrap();
    assert_eq!(metadata.files.event_names(), vec!["treatment"]);
    assert_eq!(metadata.extra["project"], "h5nx_synthetic");

    let dictionary = loader.load_data_dictionary().unwrap();
    assert_eq!(dictionary.len(), 15);
    assert_eq!(
        dictionary.entry_in(PRESENTATION, "temp").unwrap().skip_logic.as_deref(),
        Some("[fever] = 'Yes'")
    );
    assert_eq!(
        dictionary.fields_of_type(OUTCOME, &FieldType::Datetime),
        vec!["outcome_date"]
    );

    let treatment = loader.load_table("treatment").unwrap().unwrap();
    assert_eq!(treatment.n_columns(), 3);
    assert!(loader.load_table("vitals").unwrap().is_none());
}

#[test]
fn test_empty_entry_means_table_not_listed() {
    let project = ProjectCopy::new();
    project.edit_metadata(|json| {
        json["files"]["daily"] = serde_json::json!({});
    });

    let data = load_data_from_file(project.path(), true).unwrap();
    assert!(data.daily.is_none());
    assert!(data.table("daily").is_err());
}

#[test]
fn test_default_filename_is_table_name() {
    let project = ProjectCopy::new();
    project.edit_metadata(|json| {
        json["files"]["daily"] = serde_json::json!({"encoding": "utf-8"});
    });

    let data = load_data_from_file(project.path(), false).unwrap();
    assert_eq!(data.daily.unwrap().n_rows(), 5);
}

#[test]
fn test_matching_metadata_path_is_accepted() {
    let project = ProjectCopy::new();
    let path = project.path().to_string_lossy().to_string();
    project.edit_metadata(|json| {
        json["path"] = serde_json::Value::String(path);
    });

    assert!(load_data_from_file(project.path(), true).is_ok());
}

#[test]
fn test_describe_loaded_project() {
    let data = load_data_from_file(fixture_dir(), false).unwrap();
    let summary = data.describe();
    assert_eq!(summary.n_subjects, 6);
    assert_eq!(summary.n_dictionary_fields, 15);

    let presentation = summary.table(PRESENTATION).unwrap();
    assert_eq!(presentation.columns.len(), 7);
    assert_eq!(presentation.column("age").unwrap().missing, 1);

    let rendered = summary.to_string();
    assert!(rendered.contains("presentation (6 rows, 6 subjects, 7 columns)"));
    assert!(rendered.contains("treatment (4 rows, 3 subjects, 2 columns)"));
}
