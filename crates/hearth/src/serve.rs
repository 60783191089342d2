//! The serve orchestrator.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::Result;
use crate::engine::{BuildConfig, BuildContext, Engine, ServeConfig, ServeInfo, absolutize};
use crate::import_map::ImportMap;
use crate::options::ServeOptions;
use crate::plugins::{
    EntryNormalizer, ExternalPassthrough, ImportMapResolver, ShellGenerator, StylesheetLoader,
};
use crate::project::ProjectDocument;
use crate::protocol::{HookTable, SharedPlugin};

/// A running watch-and-serve session.
pub struct ServeSession<C> {
    context: C,
    config: BuildConfig,
    info: ServeInfo,
    url: String,
}

impl<C: BuildContext> ServeSession<C> {
    /// `http://host:port`, with `localhost` in place of a wildcard bind.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn info(&self) -> &ServeInfo {
        &self.info
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    /// Stop watching and serving.
    pub async fn dispose(self) -> Result<()> {
        tracing::debug!(url = %self.url, "disposing serve session");
        self.context.dispose().await
    }
}

impl<C> std::fmt::Debug for ServeSession<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServeSession")
            .field("url", &self.url)
            .field("outdir", &self.config.outdir)
            .finish_non_exhaustive()
    }
}

/// Build configuration plus plugin list, before any engine is involved.
pub struct ServePlan {
    pub config: BuildConfig,
    pub plugins: Vec<SharedPlugin>,
}

/// Load the configuration document and assemble the build.
///
/// Plugin order: caller plugins, external passthrough, entry normalization,
/// stylesheet tagging, import-map resolution, shell generation.
pub async fn prepare(
    entry: impl AsRef<Path>,
    options: ServeOptions,
    working_dir: &Path,
) -> Result<ServePlan> {
    let document = match &options.config_path {
        Some(path) => {
            let path = absolutize(path, working_dir);
            tracing::debug!(path = %path.display(), "loading project config");
            Some(ProjectDocument::load(&path).await?)
        }
        None => None,
    };

    let import_map = Arc::new(
        document
            .as_ref()
            .map(|doc| doc.import_map(working_dir))
            .unwrap_or_else(|| ImportMap::new(working_dir)),
    );

    let mut config = BuildConfig::new(
        entry.as_ref(),
        output_dir(&options, working_dir),
        working_dir,
    );
    config.loader = options.loader;
    config.engine = options.engine;
    if let Some(doc) = &document {
        config.jsx = doc.config.compiler_options.jsx();
    }

    let mut plugins = options.plugins;
    plugins.push(Arc::new(ExternalPassthrough));
    plugins.push(Arc::new(EntryNormalizer));
    plugins.push(Arc::new(StylesheetLoader::new(Arc::clone(&import_map))));
    plugins.push(Arc::new(ImportMapResolver::new(import_map)));
    plugins.push(Arc::new(ShellGenerator::new()));

    Ok(ServePlan { config, plugins })
}

/// Start watching `entry` with `engine` and serve the output directory.
pub async fn serve<E: Engine>(
    engine: &E,
    entry: impl AsRef<Path>,
    options: ServeOptions,
) -> Result<ServeSession<E::Context>> {
    let working_dir = match &options.working_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let ServePlan { config, plugins } = prepare(entry, options, &working_dir).await?;
    let hooks = HookTable::from_plugins(&config, &plugins)?;

    let context = engine.context(config.clone(), Arc::new(hooks)).await?;
    context.watch().await?;
    let info = context
        .serve(ServeConfig {
            servedir: config.outdir.clone(),
            host: config.engine.host.clone(),
            port: config.engine.port,
        })
        .await?;

    let url = format!("http://{}:{}", display_host(&info.host), info.port);
    println!("Serving {url}");
    tracing::info!(%url, outdir = %config.outdir.display(), "serving");

    Ok(ServeSession {
        context,
        config,
        info,
        url,
    })
}

/// Wildcard binds are reported as `localhost`.
pub fn display_host(host: &str) -> &str {
    if host == "0.0.0.0" { "localhost" } else { host }
}

fn output_dir(options: &ServeOptions, working_dir: &Path) -> PathBuf {
    absolutize(&options.output_dir, working_dir)
}
