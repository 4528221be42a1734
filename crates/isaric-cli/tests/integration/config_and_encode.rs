//! A config file written with `isaric config` steers `isaric encode`.

use std::fs;

use isaric_cli::commands::cmd_encode;
use isaric_cli::config_handlers::{cmd_config_init, cmd_config_set};
use isaric_cli::{EncodeArgs, IsaricConfig, ProjectArgs};
use isaric_data::FieldType;
use isaric_loader::load_data_from_file;
use tempfile::TempDir;

use super::fixture_dir;

#[test]
fn test_output_dir_from_config_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    let config_arg = config_path.to_str();
    let out_dir = dir.path().join("encoded");

    cmd_config_init(&mut Vec::new(), config_arg, false).unwrap();
    cmd_config_set(&mut Vec::new(), config_arg, "output_dir", out_dir.to_str().unwrap())
        .unwrap();
    cmd_config_set(&mut Vec::new(), config_arg, "encode.collapse_threshold", "0.3").unwrap();

    let config = IsaricConfig::load(config_arg).unwrap();
    assert_eq!(config.output_dir.as_deref(), Some(out_dir.as_path()));

    let fields = vec!["country".to_string()];
    let args = EncodeArgs {
        method: "one-hot-encode",
        table: "presentation",
        fields: &fields,
        collapse_to_other: true,
        collapse_threshold: None,
        output: None,
    };
    let project = ProjectArgs {
        dir: fixture_dir(),
        encoding: None,
    };
    cmd_encode(&mut Vec::new(), &config, &project, &args).unwrap();

    // USA is 1 of 6 rows, below the configured 0.3.
    let table = fs::read_to_string(out_dir.join("presentation.csv")).unwrap();
    let header = table.lines().next().unwrap();
    assert!(header.contains("country___gbr"));
    assert!(header.contains("country___vnm"));
    assert!(header.contains("country___other"));
    assert!(!header.contains("country___usa"));
    assert!(out_dir.join("data_dictionary.csv").exists());
}

#[test]
fn test_encoded_output_reloads_as_a_project() {
    let dir = TempDir::new().unwrap();
    let config = IsaricConfig {
        output_dir: Some(dir.path().to_path_buf()),
        ..IsaricConfig::default()
    };
    for name in ["metadata.json", "outcome.csv", "daily.csv", "events_treatment.csv"] {
        fs::copy(fixture_dir().join(name), dir.path().join(name)).unwrap();
    }

    let fields = vec!["sex".to_string()];
    let args = EncodeArgs {
        method: "one-hot-encode",
        table: "presentation",
        fields: &fields,
        collapse_to_other: false,
        collapse_threshold: None,
        output: None,
    };
    let project = ProjectArgs {
        dir: fixture_dir(),
        encoding: None,
    };
    cmd_encode(&mut Vec::new(), &config, &project, &args).unwrap();

    let data = load_data_from_file(dir.path(), true).unwrap();
    let entry = data.data_dictionary.entry("sex___female").unwrap();
    assert_eq!(entry.field_type, FieldType::Binary);
    assert_eq!(entry.parent_field.as_deref(), Some("sex"));
    assert!(data.presentation.has_column("sex___male"));
    assert!(!data.presentation.has_column("sex"));
}
