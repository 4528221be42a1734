//! Handlers for the project commands.
//!
//! Each handler writes its report to `out` so it can be tested against a
//! buffer; `main` passes stdout.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use isaric_cleaning::{OneHotOptions, encode, skip_logic_filter};
use isaric_core::{Error, Result, SUBJECT_ID_FIELD};
use isaric_data::{IsaricData, ValidationReport};
use isaric_loader::{Loader, load_with};

use crate::cli::ProjectArgs;
use crate::config::IsaricConfig;

const DICTIONARY_OUTPUT: &str = "data_dictionary.csv";

// ============================================================================
// Project loading
// ============================================================================

/// Load a project, taking the encoding from the arguments or the config.
pub fn load_project(project: &ProjectArgs, config: &IsaricConfig) -> Result<IsaricData> {
    let encoding = project.encoding.as_deref().unwrap_or(&config.encoding);
    let loader = Loader::new(&project.dir)?.with_encoding(encoding);
    load_with(loader, false)
}

// ============================================================================
// Command handlers
// ============================================================================

/// `isaric validate`: print every validation issue.
///
/// # Errors
///
/// Returns a `Validation` error when the report has any error-severity
/// issue.
pub fn cmd_validate<W: Write>(
    out: &mut W,
    config: &IsaricConfig,
    project: &ProjectArgs,
) -> Result<()> {
    let data = load_project(project, config)?;
    let report = ValidationReport::check(&data);
    write!(out, "{report}")?;

    let errors = report.errors().count();
    if errors > 0 {
        return Err(Error::validation(format!(
            "{} has {errors} validation error(s)",
            project.dir.display()
        )));
    }
    writeln!(out, "{} is valid", project.dir.display())?;
    Ok(())
}

/// `isaric describe`: summary statistics for every table, or one.
pub fn cmd_describe<W: Write>(
    out: &mut W,
    config: &IsaricConfig,
    project: &ProjectArgs,
    table: Option<&str>,
) -> Result<()> {
    let data = load_project(project, config)?;
    match table {
        Some(name) => write!(out, "{}", data.describe_table(name)?)?,
        None => write!(out, "{}", data.describe())?,
    }
    Ok(())
}

/// `isaric options`: the options of a field, one per line.
pub fn cmd_options<W: Write>(
    out: &mut W,
    config: &IsaricConfig,
    project: &ProjectArgs,
    field: &str,
) -> Result<()> {
    let data = load_project(project, config)?;
    let entry = data
        .data_dictionary
        .entry(field)
        .ok_or_else(|| Error::unknown_field(field, None))?;
    writeln!(
        out,
        "{field} ({}, {})",
        entry.table_name,
        entry.field_type.name()
    )?;

    let options = data.get_field_options(field)?;
    if options.is_empty() {
        writeln!(out, "  (no options)")?;
    }
    for option in options {
        match option.label {
            Some(label) => writeln!(out, "  {}\t{label}", option.value)?,
            None => writeln!(out, "  {}", option.value)?,
        }
    }
    Ok(())
}

/// Arguments of `isaric encode`.
#[derive(Debug, Clone)]
pub struct EncodeArgs<'a> {
    /// Encoding method name.
    pub method: &'a str,
    /// Table holding the fields.
    pub table: &'a str,
    /// Fields to encode.
    pub fields: &'a [String],
    /// Collapse rare categories into `other`.
    pub collapse_to_other: bool,
    /// Threshold overriding the configured one.
    pub collapse_threshold: Option<f64>,
    /// File to write the encoded table to.
    pub output: Option<&'a Path>,
}

/// `isaric encode`: run an encoder and write the encoded table as CSV.
///
/// The table goes to `--output` when given. Otherwise, with `output_dir`
/// configured, the table and the updated data dictionary are written
/// there; failing both, the table is written to `out`.
pub fn cmd_encode<W: Write>(
    out: &mut W,
    config: &IsaricConfig,
    project: &ProjectArgs,
    args: &EncodeArgs<'_>,
) -> Result<()> {
    let threshold = args
        .collapse_threshold
        .unwrap_or(config.encode.collapse_threshold);
    if !(0.0..=1.0).contains(&threshold) {
        return Err(Error::validation_field(
            "collapse_threshold",
            format!("must be between 0 and 1, got {threshold}"),
        ));
    }
    let options = OneHotOptions {
        collapse_to_other: args.collapse_to_other,
        collapse_threshold: Some(threshold),
    };

    let data = load_project(project, config)?;
    let data = encode(data, args.method, args.table, args.fields, options)?;
    let table = data.table(args.table)?;

    if let Some(path) = args.output {
        write_csv_file(path, |w| table.write_csv(w))?;
        writeln!(out, "Wrote {} to {}", args.table, path.display())?;
    } else if let Some(dir) = &config.output_dir {
        fs::create_dir_all(dir).map_err(|e| Error::io_with_path(e, dir))?;
        let table_path = dir.join(format!("{}.csv", args.table));
        write_csv_file(&table_path, |w| table.write_csv(w))?;
        let dictionary_path = dir.join(DICTIONARY_OUTPUT);
        write_csv_file(&dictionary_path, |w| data.data_dictionary.to_table().write_csv(w))?;
        writeln!(
            out,
            "Wrote {} and {} to {}",
            table_path.display(),
            DICTIONARY_OUTPUT,
            dir.display()
        )?;
    } else {
        table.write_csv(&mut *out)?;
    }

    tracing::info!(
        method = args.method,
        table = args.table,
        columns = table.n_columns(),
        "Encoded fields"
    );
    Ok(())
}

/// `isaric skip-logic`: show where a field's skip logic is met.
pub fn cmd_skip_logic<W: Write>(
    out: &mut W,
    config: &IsaricConfig,
    project: &ProjectArgs,
    field: &str,
) -> Result<()> {
    let data = load_project(project, config)?;
    let mask = skip_logic_filter(&data, field)?;
    let entry = data
        .data_dictionary
        .entry(field)
        .ok_or_else(|| Error::unknown_field(field, None))?;
    let table = data.table(&entry.table_name)?;

    match entry.skip_logic.as_deref().map(str::trim) {
        Some(logic) if !logic.is_empty() => writeln!(out, "{field}: {logic}")?,
        _ => writeln!(out, "{field}: (no skip logic)")?,
    }
    let met = mask.iter().filter(|m| **m).count();
    writeln!(out, "Met in {met} of {} {} row(s)", mask.len(), entry.table_name)?;

    if let Some(ids) = table.column(SUBJECT_ID_FIELD) {
        let not_met: Vec<String> = ids
            .values
            .iter()
            .zip(&mask)
            .filter(|(_, keep)| !**keep)
            .map(|(id, _)| id.as_text())
            .collect();
        if !not_met.is_empty() {
            writeln!(out, "Not met: {}", not_met.join(", "))?;
        }
    }
    Ok(())
}

fn write_csv_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let file = File::create(path).map_err(|e| Error::io_with_path(e, path))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    writer.flush().map_err(|e| Error::io_with_path(e, path))
}

// ============================================================================
// Tests
// ============================================================================
