//! Stylesheet namespace tagging.
//!
//! Requests whose path ends in a stylesheet suffix of the loader map are
//! resolved here, before default resolution, and tagged with the namespace of
//! their loader. One load hook per namespace then reads the file verbatim and
//! hands it back with that loader, so scoped stylesheets reach the engine as
//! `local-css` and everything else as `css`.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use regex::Regex;

use crate::Result;
use crate::engine::longest_suffix;
use crate::error::Error;
use crate::import_map::ImportMap;
use crate::protocol::{
    HookFilter, LoadArgs, LoadHook, LoadOutput, Loader, Namespace, Plugin, PluginBuild,
    ResolveArgs, ResolveHook, ResolveOutput,
};
use crate::resolve::{default_resolve, is_external_reference};

#[derive(Debug, Clone)]
pub struct StylesheetLoader {
    import_map: Arc<ImportMap>,
}

impl StylesheetLoader {
    pub fn new(import_map: Arc<ImportMap>) -> Self {
        Self { import_map }
    }
}

impl Plugin for StylesheetLoader {
    fn name(&self) -> Cow<'static, str> {
        "stylesheet-loader".into()
    }

    fn setup(&self, build: &mut PluginBuild<'_>) -> Result<()> {
        let loaders = build.initial_options().loader.clone();
        let Some(filter) = suffix_filter(&loaders)? else {
            tracing::debug!("no stylesheet loaders configured");
            return Ok(());
        };

        build.on_resolve(
            filter,
            TagStylesheet {
                loaders,
                import_map: Arc::clone(&self.import_map),
            },
        );
        for loader in [Loader::Css, Loader::LocalCss] {
            build.on_load(
                HookFilter::any().in_namespace(loader.namespace()),
                ReadStylesheet { loader },
            );
        }
        Ok(())
    }
}

/// `(?:\.css|\.module\.css)$` for the stylesheet suffixes of `loaders`.
fn suffix_filter(loaders: &IndexMap<String, Loader>) -> Result<Option<HookFilter>> {
    let alternatives: Vec<String> = loaders
        .iter()
        .filter(|(_, loader)| loader.is_stylesheet())
        .map(|(suffix, _)| regex::escape(suffix))
        .collect();
    if alternatives.is_empty() {
        return Ok(None);
    }
    let pattern = format!("(?:{})$", alternatives.join("|"));
    let regex = Regex::new(&pattern).map_err(|source| Error::InvalidFilter { pattern, source })?;
    Ok(Some(HookFilter::from_regex(regex)))
}

struct TagStylesheet {
    loaders: IndexMap<String, Loader>,
    import_map: Arc<ImportMap>,
}

#[async_trait]
impl ResolveHook for TagStylesheet {
    async fn resolve(&self, args: &ResolveArgs) -> Result<Option<ResolveOutput>> {
        // A longer non-stylesheet suffix overrides a stylesheet one.
        let Some((_, loader)) = longest_suffix(&self.loaders, &args.path) else {
            return Ok(None);
        };
        if !loader.is_stylesheet() {
            return Ok(None);
        }

        let resolved = match self.import_map.resolve(&args.path) {
            Some(mapped) if !is_external_reference(&mapped) => {
                default_resolve(&mapped, None, &args.resolve_dir)
            }
            Some(url) => return Ok(Some(ResolveOutput::external(url))),
            None => default_resolve(&args.path, args.importer.as_deref(), &args.resolve_dir),
        };
        if is_external_reference(&resolved) {
            return Ok(Some(ResolveOutput::external(resolved)));
        }

        Ok(Some(
            ResolveOutput::new(resolved).with_namespace(loader.namespace()),
        ))
    }
}

struct ReadStylesheet {
    loader: Loader,
}

#[async_trait]
impl LoadHook for ReadStylesheet {
    async fn load(&self, args: &LoadArgs) -> Result<Option<LoadOutput>> {
        let path = PathBuf::from(&args.path);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| Error::ModuleLoad {
                path: path.clone(),
                source,
            })?;
        Ok(Some(LoadOutput {
            contents,
            loader: self.loader,
            resolve_dir: path.parent().map(Path::to_path_buf),
        }))
    }
}
