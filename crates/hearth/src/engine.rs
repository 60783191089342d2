//! Engine abstraction.
//!
//! The core never bundles, watches or serves by itself. It hands a
//! [`BuildConfig`] and a [`HookTable`] to an [`Engine`] and drives the returned
//! [`BuildContext`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::manifest::BuildResult;
use crate::options::default_loader_map;
use crate::protocol::{HookTable, Loader};

/// Path of the server-sent-events stream the HTML shell listens on.
pub const CHANGE_STREAM_PATH: &str = "/esbuild";

/// Event name broadcast on the change stream after every rebuild.
pub const CHANGE_EVENT: &str = "change";

/// Default bind address for the development server.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default port for the development server.
pub const DEFAULT_PORT: u16 = 8000;

/// Output module format. Only ES modules are emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Esm,
}

/// JSX transform flavor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsxMode {
    /// Classic `factory(...)` calls.
    #[default]
    Transform,
    /// The automatic runtime, importing from `import_source`.
    Automatic,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsxConfig {
    pub mode: JsxMode,
    pub factory: Option<String>,
    pub fragment: Option<String>,
    pub import_source: Option<String>,
}

/// Engine settings the caller may pass straight through.
///
/// Everything the core forces (format, bundling, metafile, entry points, JSX)
/// lives on [`BuildConfig`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineOptions {
    pub minify: bool,
    /// Specifiers (or prefixes ending in `/`) kept out of the bundle.
    pub external: Vec<String>,
    pub host: String,
    pub port: u16,
    /// Extra path fragments the watcher ignores.
    pub watch_ignore: Vec<String>,
    pub debounce_ms: u64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            minify: false,
            external: Vec::new(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            watch_ignore: Vec::new(),
            debounce_ms: 100,
        }
    }
}

/// Everything an engine needs to build the project.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub entry_points: Vec<PathBuf>,
    /// Absolute, lexically normalized output directory.
    pub outdir: PathBuf,
    pub working_dir: PathBuf,
    pub bundle: bool,
    /// Ask the engine for an output manifest after each build.
    pub metafile: bool,
    pub format: Format,
    pub jsx: JsxConfig,
    /// File suffix → loader.
    pub loader: IndexMap<String, Loader>,
    pub engine: EngineOptions,
}

impl BuildConfig {
    /// A bundling, manifest-emitting ESM build of a single entry point.
    pub fn new(
        entry: impl Into<PathBuf>,
        outdir: impl Into<PathBuf>,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            entry_points: vec![entry.into()],
            outdir: outdir.into(),
            working_dir: working_dir.into(),
            bundle: true,
            metafile: true,
            format: Format::Esm,
            jsx: JsxConfig::default(),
            loader: default_loader_map(),
            engine: EngineOptions::default(),
        }
    }

    /// Loader configured for `path`; the longest matching suffix wins.
    pub fn loader_for(&self, path: &str) -> Option<Loader> {
        longest_suffix(&self.loader, path).map(|(_, loader)| loader)
    }
}

/// Find the longest key of `map` that `path` ends with.
pub(crate) fn longest_suffix<'a>(
    map: &'a IndexMap<String, Loader>,
    path: &str,
) -> Option<(&'a str, Loader)> {
    map.iter()
        .filter(|(suffix, _)| path.ends_with(suffix.as_str()))
        .max_by_key(|(suffix, _)| suffix.len())
        .map(|(suffix, loader)| (suffix.as_str(), *loader))
}

/// Where and how to serve the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeConfig {
    pub servedir: PathBuf,
    pub host: String,
    pub port: u16,
}

/// Address the server actually bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeInfo {
    pub host: String,
    pub port: u16,
}

/// A live, rebuildable build created by an [`Engine`].
#[async_trait]
pub trait BuildContext: Send + Sync {
    /// Build once, then rebuild whenever watched files change.
    async fn watch(&self) -> Result<()>;

    /// Start the HTTP server with the change stream.
    async fn serve(&self, config: ServeConfig) -> Result<ServeInfo>;

    /// Run a single build now. End hooks receive the result.
    async fn rebuild(&self) -> Result<BuildResult>;

    /// Stop watching and serving.
    async fn dispose(&self) -> Result<()>;
}

/// Incremental build-and-serve engine.
#[async_trait]
pub trait Engine: Send + Sync {
    type Context: BuildContext + 'static;

    async fn context(&self, config: BuildConfig, hooks: Arc<HookTable>) -> Result<Self::Context>;
}

/// Make `path` absolute against `base` and collapse `.`/`..` segments.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    use path_clean::PathClean;
    if path.is_absolute() {
        path.to_path_buf().clean()
    } else {
        base.join(path).clean()
    }
}
