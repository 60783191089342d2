use std::path::PathBuf;

use indexmap::IndexMap;

use crate::engine::EngineOptions;
use crate::protocol::{Loader, SharedPlugin};

/// Output directory used when none is given.
pub const DEFAULT_OUTPUT_DIR: &str = "./dist";

/// `{".css": css, ".module.css": local-css}`.
pub fn default_loader_map() -> IndexMap<String, Loader> {
    IndexMap::from([
        (".css".to_string(), Loader::Css),
        (".module.css".to_string(), Loader::LocalCss),
    ])
}

/// Options for [`serve`](crate::serve::serve).
///
/// # Example
///
/// ```
/// use hearth::{Loader, ServeOptions};
///
/// let options = ServeOptions::new()
///     .config_path("deno.json")
///     .output_dir("public/build")
///     .loader(".svg", Loader::Text)
///     .minify(true);
/// assert_eq!(options.output_dir.to_str(), Some("public/build"));
/// ```
#[derive(Clone)]
pub struct ServeOptions {
    /// Configuration document supplying the import map and JSX settings.
    pub config_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    /// File suffix → loader.
    pub loader: IndexMap<String, Loader>,
    /// Run before every built-in plugin.
    pub plugins: Vec<SharedPlugin>,
    pub engine: EngineOptions,
    /// Base for relative paths; the process working directory when unset.
    pub working_dir: Option<PathBuf>,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            loader: default_loader_map(),
            plugins: Vec::new(),
            engine: EngineOptions::default(),
            working_dir: None,
        }
    }
}

impl ServeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Add or replace the loader for one suffix.
    pub fn loader(mut self, suffix: impl Into<String>, loader: Loader) -> Self {
        self.loader.insert(suffix.into(), loader);
        self
    }

    /// Replace the whole loader map.
    pub fn loaders(mut self, loaders: IndexMap<String, Loader>) -> Self {
        self.loader = loaders;
        self
    }

    pub fn plugin(mut self, plugin: SharedPlugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn engine(mut self, engine: EngineOptions) -> Self {
        self.engine = engine;
        self
    }

    pub fn minify(mut self, enabled: bool) -> Self {
        self.engine.minify = enabled;
        self
    }

    pub fn external(mut self, specifier: impl Into<String>) -> Self {
        self.engine.external.push(specifier.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.engine.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.engine.port = port;
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

impl std::fmt::Debug for ServeOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServeOptions")
            .field("config_path", &self.config_path)
            .field("output_dir", &self.output_dir)
            .field("loader", &self.loader)
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("engine", &self.engine)
            .field("working_dir", &self.working_dir)
            .finish()
    }
}
