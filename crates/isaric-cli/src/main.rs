//! `isaric` command-line tool.

#![forbid(unsafe_code)]

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use isaric_cli::commands::{
    cmd_describe, cmd_encode, cmd_options, cmd_skip_logic, cmd_validate,
};
use isaric_cli::config_handlers::handle_config_command;
use isaric_cli::logging::init_logging;
use isaric_cli::{Cli, Command, EncodeArgs, IsaricConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            let user_error = e
                .downcast_ref::<isaric_core::Error>()
                .is_some_and(isaric_core::Error::is_user_error);
            ExitCode::from(if user_error { 2 } else { 1 })
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    // Config commands must work even when the config file is broken.
    let config = if matches!(cli.command, Command::Config { .. }) {
        IsaricConfig::default()
    } else {
        IsaricConfig::load(cli.config.as_deref())?
    };
    init_logging(cli.verbose, &config.log_level);
    tracing::debug!(?config, "Loaded configuration");

    match cli.command {
        Command::Validate(project) => cmd_validate(&mut out, &config, &project)?,
        Command::Describe { project, table } => {
            cmd_describe(&mut out, &config, &project, table.as_deref())?
        }
        Command::Options { project, field } => cmd_options(&mut out, &config, &project, &field)?,
        Command::Encode {
            project,
            method,
            table,
            fields,
            collapse_to_other,
            collapse_threshold,
            output,
        } => {
            let args = EncodeArgs {
                method: &method,
                table: &table,
                fields: &fields,
                collapse_to_other,
                collapse_threshold,
                output: output.as_deref(),
            };
            cmd_encode(&mut out, &config, &project, &args)?
        }
        Command::SkipLogic { project, field } => {
            cmd_skip_logic(&mut out, &config, &project, &field)?
        }
        Command::Config { action } => {
            handle_config_command(&mut out, cli.config.as_deref(), action)?
        }
    }
    out.flush()?;
    Ok(())
}
