//! Handset CLI Library
//!
//! Command-line interface over the handset step registry and scenario runner.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::format_push_string)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;

pub use commands::{CheckArgs, Cli, ColorArg, Commands, ListArgs, ListFormat, RunArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
