//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// ISARIC analytics: validate, describe and encode ISARIC project data
#[derive(Parser, Debug)]
#[command(name = "isaric", author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a project and report validation issues
    Validate(ProjectArgs),

    /// Summarise every table of a project
    Describe {
        /// Project to read
        #[command(flatten)]
        project: ProjectArgs,

        /// Only describe this table
        #[arg(short, long)]
        table: Option<String>,
    },

    /// List the options of a categorical field
    Options {
        /// Project to read
        #[command(flatten)]
        project: ProjectArgs,

        /// Field name
        field: String,
    },

    /// Encode fields of a table and write the result as CSV
    Encode {
        /// Project to read
        #[command(flatten)]
        project: ProjectArgs,

        /// Encoding method
        #[arg(short, long)]
        method: String,

        /// Table holding the fields
        #[arg(short, long)]
        table: String,

        /// Field to encode (repeatable)
        #[arg(short, long = "field", required = true, num_args = 1..)]
        fields: Vec<String>,

        /// Collapse rare categories into `other`
        #[arg(long)]
        collapse_to_other: bool,

        /// Share of rows below which a category is rare
        #[arg(long)]
        collapse_threshold: Option<f64>,

        /// Write the encoded table to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Evaluate a field's skip logic
    SkipLogic {
        /// Project to read
        #[command(flatten)]
        project: ProjectArgs,

        /// Field name
        field: String,
    },

    /// Configuration management
    Config {
        /// Configuration action
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments naming a project directory.
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Project directory holding metadata.json
    pub dir: PathBuf,

    /// Default text encoding of project files
    #[arg(short, long)]
    pub encoding: Option<String>,
}

/// `isaric config` actions.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the configuration file path
    Path,

    /// Print a value by dotted key
    Get {
        /// Dotted key, e.g. `encode.collapse_threshold`
        key: String,
    },

    /// Set a value by dotted key
    Set {
        /// Dotted key
        key: String,
        /// New value
        value: String,
    },

    /// Write a default configuration file
    Init {
        /// Where to write the file
        #[arg(long)]
        file: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_encode() {
        let cli = Cli::try_parse_from([
            "isaric",
            "encode",
            "project",
            "--method",
            "one-hot-encode",
            "--table",
            "presentation",
            "--field",
            "sex",
            "country",
            "--collapse-to-other",
        ])
        .unwrap();
        let Command::Encode {
            project,
            method,
            fields,
            collapse_to_other,
            collapse_threshold,
            ..
        } = cli.command
        else {
            unreachable!("Expected Encode");
        };
        assert_eq!(project.dir, PathBuf::from("project"));
        assert_eq!(method, "one-hot-encode");
        assert_eq!(fields, vec!["sex", "country"]);
        assert!(collapse_to_other);
        assert!(collapse_threshold.is_none());
    }

    #[test]
    fn test_encode_requires_field() {
        let result = Cli::try_parse_from([
            "isaric", "encode", "project", "--method", "x", "--table", "t",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["isaric", "validate", "project", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Validate(_)));
    }

    #[test]
    fn test_parse_config_init() {
        let cli =
            Cli::try_parse_from(["isaric", "config", "init", "--file", "c.toml", "--force"])
                .unwrap();
        let Command::Config {
            action: ConfigAction::Init { file, force },
        } = cli.command
        else {
            unreachable!("Expected config init");
        };
        assert_eq!(file.as_deref(), Some("c.toml"));
        assert!(force);
    }
}
