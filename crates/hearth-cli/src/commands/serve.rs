//! `hearth serve`: build, watch and serve until Ctrl+C.

use std::path::{Path, PathBuf};

use hearth::engine::absolutize;
use hearth_rolldown::RolldownEngine;
use tokio::signal;

use crate::cli::ServeArgs;
use crate::config::Settings;
use crate::error::{CliError, Result};
use crate::ui;

pub async fn execute(args: ServeArgs) -> Result<()> {
    let working_dir = project_dir(args.cwd.as_deref())?;
    let entry = absolutize(&args.entry, &working_dir);
    if !entry.is_file() {
        return Err(CliError::EntryNotFound(args.entry));
    }

    let settings = Settings::load(&args, &working_dir)?;
    ui::info(&format!("Entry point: {}", args.entry.display()));
    ui::info(&format!("Working directory: {}", working_dir.display()));

    let session = hearth::serve(&RolldownEngine::new(), &entry, settings.into_serve_options())
        .await?;
    ui::success(&format!(
        "Watching for changes, output in {}",
        session.config().outdir.display()
    ));

    signal::ctrl_c().await?;
    ui::info("Shutting down...");
    session.dispose().await?;
    Ok(())
}

fn project_dir(cwd: Option<&Path>) -> Result<PathBuf> {
    let current = std::env::current_dir()?;
    Ok(match cwd {
        Some(dir) => absolutize(dir, &current),
        None => current,
    })
}
