//! Integration tests for loader failures.

use isaric_core::Error;
use isaric_loader::{Loader, load_data_from_file};
use tempfile::TempDir;

use crate::common::{ProjectCopy, fixture_dir};

#[test]
fn test_missing_directory() {
    let dir = TempDir::new().unwrap();
    let err = Loader::new(dir.path().join("absent")).unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
}

#[test]
fn test_path_is_a_file() {
    let err = Loader::new(fixture_dir().join("metadata.json")).unwrap_err();
    assert!(matches!(err, Error::NotADirectory { .. }));
}

#[test]
fn test_missing_metadata_file() {
    let project = ProjectCopy::new();
    project.remove("metadata.json");
    let err = load_data_from_file(project.path(), false).unwrap_err();
    let Error::FileNotFound { path } = err else {
        unreachable!("Expected FileNotFound");
    };
    assert!(path.ends_with("metadata.json"));
}

#[test]
fn test_malformed_metadata() {
    let project = ProjectCopy::new();
    project.write("metadata.json", "{ not json");
    let err = load_data_from_file(project.path(), false).unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}

#[test]
fn test_dictionary_before_metadata() {
    let mut loader = Loader::new(fixture_dir()).unwrap();
    let err = loader.load_data_dictionary().unwrap_err();
    assert_eq!(err.to_string(), "metadata must be loaded first");
}

#[test]
fn test_table_before_dictionary() {
    let mut loader = Loader::new(fixture_dir()).unwrap();
    loader.load_metadata().unwrap();
    let err = loader.load_table("presentation").unwrap_err();
    let Error::NotLoaded { what } = err else {
        unreachable!("Expected NotLoaded");
    };
    assert_eq!(what, "data dictionary");
}

#[test]
fn test_metadata_path_mismatch() {
    let project = ProjectCopy::new();
    let elsewhere = TempDir::new().unwrap();
    let path = elsewhere.path().to_string_lossy().to_string();
    project.edit_metadata(|json| {
        json["path"] = serde_json::Value::String(path);
    });

    let err = load_data_from_file(project.path(), false).unwrap_err();
    assert!(matches!(err, Error::MetadataPathMismatch { .. }));
}

#[test]
fn test_unsupported_encoding() {
    let project = ProjectCopy::new();
    project.edit_metadata(|json| {
        json["files"]["outcome"]["encoding"] = "latin-1".into();
    });

    let err = load_data_from_file(project.path(), false).unwrap_err();
    let Error::UnsupportedEncoding { encoding } = err else {
        unreachable!("Expected UnsupportedEncoding");
    };
    assert_eq!(encoding, "latin-1");
}

#[test]
fn test_unsupported_default_encoding() {
    let loader = Loader::new(fixture_dir()).unwrap().with_encoding("cp1252");
    let err = isaric_loader::load_with(loader, false).unwrap_err();
    assert!(matches!(err, Error::UnsupportedEncoding { .. }));
}

#[test]
fn test_listed_file_missing() {
    let project = ProjectCopy::new();
    project.remove("daily.csv");
    let err = load_data_from_file(project.path(), false).unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
}

#[test]
fn test_required_table_not_listed() {
    let project = ProjectCopy::new();
    project.edit_metadata(|json| {
        json["files"].as_object_mut().unwrap().remove("outcome");
    });

    let err = load_data_from_file(project.path(), false).unwrap_err();
    let Error::Validation { field, .. } = err else {
        unreachable!("Expected Validation");
    };
    assert_eq!(field.as_deref(), Some("files.outcome"));
}

#[test]
fn test_dictionary_without_field_type_column() {
    let project = ProjectCopy::new();
    project.write(
        "data_dictionary.csv",
        "table_name,field_name\npresentation,subjid\n",
    );
    let err = load_data_from_file(project.path(), false).unwrap_err();
    let Error::Validation { field, .. } = err else {
        unreachable!("Expected Validation");
    };
    assert_eq!(field.as_deref(), Some("field_type"));
}

#[test]
fn test_table_without_subject_column() {
    let project = ProjectCopy::new();
    project.write("outcome.csv", "id,outcome\nH5-001,Death\n");
    let err = load_data_from_file(project.path(), false).unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}

#[test]
fn test_validation_only_when_requested() {
    let project = ProjectCopy::new();
    project.write(
        "outcome.csv",
        "subjid,outcome,outcome_date\nH5-999,Recovered,2024-01-01\n",
    );

    assert!(load_data_from_file(project.path(), false).is_ok());

    let err = load_data_from_file(project.path(), true).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("not present in presentation"));
    assert!(message.contains("Recovered"));
}
