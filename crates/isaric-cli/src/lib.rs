#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Modules
//!
//! - [`cli`]: clap argument definitions
//! - [`commands`]: project command handlers
//! - [`config`]: `IsaricConfig` and config file resolution
//! - [`config_handlers`]: `isaric config` subcommands
//! - [`logging`]: tracing subscriber setup

pub mod cli;
pub mod commands;
pub mod config;
pub mod config_handlers;
pub mod logging;

// Re-exports for convenience
pub use cli::{Cli, Command, ConfigAction, ProjectArgs};
pub use commands::EncodeArgs;
pub use config::IsaricConfig;
