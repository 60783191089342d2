//! Command-line front end for hearth.
//!
//! - [`cli`] - clap argument definitions
//! - [`config`] - layered settings (`hearth.config.json`, `HEARTH_*`, flags)
//! - [`commands`] - command implementations
//! - [`error`] - CLI errors and their miette rendering
//! - [`logger`] - tracing subscriber setup
//! - [`ui`] - colored status lines

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, Result};
