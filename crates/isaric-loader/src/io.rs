//! Reading a project directory.
//!
//! A [`Loader`] is tied to one directory. Metadata is read first, then the
//! data dictionary, then any number of tables, each typed by the
//! dictionary. [`load_data_from_file`] runs the whole sequence and returns
//! an [`IsaricData`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use isaric_core::value::{parse_datetime, parse_inferred, parse_number, parse_text};
use isaric_core::{Column, Error, Result, SUBJECT_ID_FIELD, Table, Value};
use isaric_data::{
    DAILY, DataDictionary, FieldType, IsaricData, Metadata, OUTCOME, PRESENTATION,
};

use crate::encoding::TextEncoding;

/// File name of the project metadata.
pub const METADATA_FILENAME: &str = "metadata.json";

/// Encoding used when the metadata does not name one.
pub const DEFAULT_ENCODING: &str = "utf-8";

const DEFAULT_DICTIONARY_FILENAME: &str = "data_dictionary.csv";

/// Loads metadata, the data dictionary, and tables from a project directory.
#[derive(Debug, Clone)]
pub struct Loader {
    path: PathBuf,
    encoding: String,
    metadata: Option<Metadata>,
    data_dictionary: Option<DataDictionary>,
}

impl Loader {
    /// Creates a loader for the given project directory.
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` if the path does not exist and
    /// `NotADirectory` if it is not a directory.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(Error::FileNotFound { path });
        }
        if !path.is_dir() {
            return Err(Error::NotADirectory { path });
        }
        tracing::info!(path = %path.display(), "Set project path");
        Ok(Self {
            path,
            encoding: DEFAULT_ENCODING.to_string(),
            metadata: None,
            data_dictionary: None,
        })
    }

    /// Sets the default encoding for files whose metadata names none.
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    /// The project directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The default encoding.
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// The loaded metadata, if any.
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// The loaded data dictionary, if any.
    pub fn data_dictionary(&self) -> Option<&DataDictionary> {
        self.data_dictionary.as_ref()
    }

    /// Read and parse `metadata.json`.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing or malformed, or if its `path` key
    /// resolves to a different directory than the loader's.
    pub fn load_metadata(&mut self) -> Result<&Metadata> {
        let metadata_path = self.path.join(METADATA_FILENAME);
        let text = self.read_text(&metadata_path, &self.encoding)?;
        let metadata = Metadata::from_json_str(&text)?;

        if let Some(recorded) = metadata.recorded_path() {
            self.check_recorded_path(recorded)?;
        }

        tracing::info!("Loaded project metadata");
        Ok(self.metadata.insert(metadata))
    }

    fn check_recorded_path(&self, recorded: &Path) -> Result<()> {
        let loader_path = fs::canonicalize(&self.path)
            .map_err(|e| Error::io_with_path(e, &self.path))?;
        let same = fs::canonicalize(recorded)
            .map(|resolved| resolved == loader_path)
            .unwrap_or(false);
        if same {
            Ok(())
        } else {
            Err(Error::MetadataPathMismatch {
                metadata_path: recorded.to_path_buf(),
                loader_path,
            })
        }
    }

    /// Read the data dictionary named in the metadata.
    ///
    /// Every cell is read as text; blank cells are missing.
    ///
    /// # Errors
    ///
    /// Returns `NotLoaded` if the metadata has not been loaded.
    pub fn load_data_dictionary(&mut self) -> Result<&DataDictionary> {
        let metadata = self.metadata.as_ref().ok_or(Error::NotLoaded {
            what: "metadata",
        })?;
        let spec = metadata.files.data_dictionary.clone().unwrap_or_default();
        let dictionary_path = self
            .path
            .join(spec.filename_or(DEFAULT_DICTIONARY_FILENAME));
        let text = self.read_text(&dictionary_path, spec.encoding_or(&self.encoding))?;

        let table = read_csv(&text, &dictionary_path, |_| parse_text)?;
        let dictionary = DataDictionary::from_table(&table)?;

        tracing::info!(fields = dictionary.len(), "Loaded project data dictionary");
        Ok(self.data_dictionary.insert(dictionary))
    }

    /// Read one table, typing its columns from the data dictionary.
    ///
    /// Returns `None`, with a warning, when the table is not listed in the
    /// metadata or its entry is empty.
    ///
    /// # Errors
    ///
    /// Returns `NotLoaded` if the metadata or the data dictionary has not
    /// been loaded, `FileNotFound` if the listed file is missing.
    pub fn load_table(&self, name: &str) -> Result<Option<Table>> {
        let metadata = self.metadata.as_ref().ok_or(Error::NotLoaded {
            what: "metadata",
        })?;
        let dictionary = self.data_dictionary.as_ref().ok_or(Error::NotLoaded {
            what: "data dictionary",
        })?;

        let Some(spec) = metadata.files.lookup(name) else {
            tracing::warn!(
                table = name,
                "Table is not listed in {METADATA_FILENAME} or has no metadata"
            );
            return Ok(None);
        };

        let default_filename = format!("{name}.csv");
        let data_path = self.path.join(spec.filename_or(&default_filename));
        let text = self.read_text(&data_path, spec.encoding_or(&self.encoding))?;

        let table = read_csv(&text, &data_path, |column| {
            column_parser(dictionary, name, column)
        })?;

        tracing::info!(
            table = name,
            rows = table.n_rows(),
            columns = table.n_columns(),
            "Loaded project table"
        );
        Ok(Some(table))
    }

    fn read_text(&self, path: &Path, encoding: &str) -> Result<String> {
        let encoding: TextEncoding = encoding.parse()?;
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let bytes = fs::read(path).map_err(|e| Error::io_with_path(e, path))?;
        tracing::debug!(path = %path.display(), %encoding, bytes = bytes.len(), "Read file");
        encoding.decode(bytes, path)
    }
}

type CellParser = fn(&str) -> Value;

/// Choose how to parse a column from its dictionary type.
fn column_parser(dictionary: &DataDictionary, table_name: &str, column: &str) -> CellParser {
    if column == SUBJECT_ID_FIELD {
        return parse_text;
    }
    match dictionary.entry_in(table_name, column).map(|e| &e.field_type) {
        Some(FieldType::Freetext | FieldType::Categorical) => parse_text,
        Some(FieldType::Datetime) => parse_datetime,
        Some(FieldType::Numeric) => parse_number,
        _ => parse_inferred,
    }
}

/// Parse CSV text into a table, choosing a cell parser per header.
fn read_csv<F>(text: &str, path: &Path, parser_for: F) -> Result<Table>
where
    F: Fn(&str) -> CellParser,
{
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let parsers: Vec<CellParser> = headers.iter().map(|h| parser_for(h)).collect();

    let mut values: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record?;
        for (i, column) in values.iter_mut().enumerate() {
            column.push(parsers[i](record.get(i).unwrap_or_default()));
        }
    }

    let columns = headers
        .into_iter()
        .zip(values)
        .map(|(name, values)| Column::new(name, values))
        .collect();
    Table::from_columns(columns).map_err(|e| e.with_table(&path.display().to_string()))
}

/// Load a project directory into [`IsaricData`].
///
/// The presentation and outcome tables are required; the daily table is
/// loaded when listed, and every table under `files.events` is loaded as
/// an events table. With `validate` set, the full validation runs and its
/// errors are returned.
pub fn load_data_from_file(path: impl AsRef<Path>, validate: bool) -> Result<IsaricData> {
    load_with(Loader::new(path)?, validate)
}

/// Load a project with a prepared [`Loader`].
pub fn load_with(mut loader: Loader, validate: bool) -> Result<IsaricData> {
    let metadata = loader.load_metadata()?.clone();
    let data_dictionary = loader.load_data_dictionary()?.clone();

    let required = |name: &str| -> Result<Table> {
        loader.load_table(name)?.ok_or_else(|| {
            Error::validation_field(
                format!("files.{name}"),
                format!("required table {name} is not listed in {METADATA_FILENAME}"),
            )
        })
    };
    let presentation = required(PRESENTATION)?;
    let outcome = required(OUTCOME)?;

    let mut data = IsaricData::new(metadata, data_dictionary, presentation, outcome)?;
    if let Some(daily) = loader.load_table(DAILY)? {
        data = data.with_daily(daily)?;
    }

    let event_names: Vec<String> = data
        .metadata
        .files
        .event_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    if !event_names.is_empty() {
        let mut events = BTreeMap::new();
        for name in event_names {
            if let Some(table) = loader.load_table(&name)? {
                events.insert(name, table);
            }
        }
        data = data.with_events(events)?;
    }

    if validate {
        data.validate()?;
    }
    Ok(data)
}
