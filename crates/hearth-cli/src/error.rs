//! CLI errors.
//!
//! Commands return [`CliError`]; `main` renders it with miette. Pipeline errors
//! keep their own diagnostic codes and help text.

use std::path::PathBuf;

use miette::Report;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Settings from `hearth.config.json` or `HEARTH_*` could not be read.
    #[error("Invalid settings: {0}")]
    Settings(#[from] Box<figment::Error>),

    #[error("Entry point not found: {}", .0.display())]
    EntryNotFound(PathBuf),

    /// Anything the serve pipeline or the engine reported.
    #[error(transparent)]
    Serve(#[from] hearth::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for CliError {
    fn from(error: figment::Error) -> Self {
        CliError::Settings(Box::new(error))
    }
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Render a CLI error for the terminal.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Serve(e) => Report::new(e),
        CliError::EntryNotFound(path) => miette::miette!(
            help = "Pass the path of your app's entry module, e.g. `hearth serve src/main.ts`",
            "Entry point not found: {}",
            path.display()
        ),
        CliError::Settings(e) => miette::miette!(
            help = "Check hearth.config.json and HEARTH_* environment variables",
            "Invalid settings: {}",
            e
        ),
        other => miette::miette!("{}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_errors_keep_their_diagnostic() {
        let err = CliError::from(hearth::Error::InvalidOption("bad loader".into()));
        let report = cli_error_to_miette(err);
        assert!(report.to_string().contains("bad loader"));
        assert!(report.code().is_some());
    }

    #[test]
    fn missing_entry_has_help() {
        let report = cli_error_to_miette(CliError::EntryNotFound("src/main.ts".into()));
        assert!(report.to_string().contains("src/main.ts"));
        assert!(report.help().is_some());
    }
}
