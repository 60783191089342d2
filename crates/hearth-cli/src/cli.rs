//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use hearth::Loader;

/// hearth - bundle, watch and serve a browser app with live reload
#[derive(Parser, Debug)]
#[command(
    name = "hearth",
    version,
    about = "Bundle, watch and serve a browser app with live reload",
    long_about = "hearth bundles an entry module with Rolldown, rebuilds it when files change,\n\
                  writes an index.html shell next to the output and serves the output\n\
                  directory with a change stream that reloads open pages."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the entry point, watch for changes and serve the output directory
    Serve(ServeArgs),
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Entry module of the app
    #[arg(value_name = "ENTRY")]
    pub entry: PathBuf,

    /// Project configuration document with `imports` and `compilerOptions`
    /// (e.g. deno.json)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output directory [default: ./dist]
    #[arg(short = 'o', long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Loader for a file suffix, e.g. `--loader .svg=text`
    ///
    /// Loaders: js, jsx, ts, tsx, json, text, css, local-css.
    #[arg(long = "loader", value_name = "SUFFIX=LOADER", value_parser = parse_loader)]
    pub loaders: Vec<(String, Loader)>,

    /// Leave matching imports out of the bundle
    #[arg(short, long, value_name = "PATTERN")]
    pub external: Vec<String>,

    /// Minify the output
    #[arg(long)]
    pub minify: bool,

    /// Address to bind [default: 0.0.0.0]
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Port to listen on [default: 8000]
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Project directory; relative paths resolve against it
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,
}

/// Parse `SUFFIX=LOADER`. A suffix without its leading dot gets one.
pub fn parse_loader(value: &str) -> Result<(String, Loader), String> {
    let (suffix, loader) = value
        .split_once('=')
        .ok_or_else(|| format!("expected SUFFIX=LOADER, got '{value}'"))?;
    let suffix = suffix.trim();
    if suffix.is_empty() || suffix == "." {
        return Err(format!("missing file suffix in '{value}'"));
    }
    let suffix = if suffix.starts_with('.') {
        suffix.to_string()
    } else {
        format!(".{suffix}")
    };
    let loader = loader.trim().parse::<Loader>().map_err(|e| e.to_string())?;
    Ok((suffix, loader))
}
