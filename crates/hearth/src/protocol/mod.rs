//! The hook protocol shared by the core and the engine binding.
//!
//! A [`Plugin`] registers hooks on a [`PluginBuild`] during `setup`. The
//! registrations are collected into a [`HookTable`], which the engine consults
//! for every module it resolves or loads and once after each rebuild.

mod table;

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::Error;
use crate::manifest::BuildResult;

pub use table::{HookTable, PluginBuild};

/// Content namespace a resolved module belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Namespace {
    /// Untagged; handled by the engine's built-in loaders.
    #[default]
    Default,
    /// Plain (global) stylesheet.
    Stylesheet,
    /// Scoped stylesheet whose class names are rewritten per module.
    StylesheetModule,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Default => "default",
            Namespace::Stylesheet => "stylesheet",
            Namespace::StylesheetModule => "stylesheet-module",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the engine should interpret a module's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Loader {
    Js,
    Jsx,
    Ts,
    Tsx,
    Json,
    Text,
    Css,
    LocalCss,
}

impl Loader {
    pub fn as_str(&self) -> &'static str {
        match self {
            Loader::Js => "js",
            Loader::Jsx => "jsx",
            Loader::Ts => "ts",
            Loader::Tsx => "tsx",
            Loader::Json => "json",
            Loader::Text => "text",
            Loader::Css => "css",
            Loader::LocalCss => "local-css",
        }
    }

    /// Stylesheet loaders are routed through a dedicated namespace.
    pub fn is_stylesheet(&self) -> bool {
        matches!(self, Loader::Css | Loader::LocalCss)
    }

    /// Namespace a module handled by this loader is tagged with.
    pub fn namespace(&self) -> Namespace {
        match self {
            Loader::Css => Namespace::Stylesheet,
            Loader::LocalCss => Namespace::StylesheetModule,
            _ => Namespace::Default,
        }
    }
}

impl fmt::Display for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Loader {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "js" => Loader::Js,
            "jsx" => Loader::Jsx,
            "ts" => Loader::Ts,
            "tsx" => Loader::Tsx,
            "json" => Loader::Json,
            "text" => Loader::Text,
            "css" => Loader::Css,
            "local-css" => Loader::LocalCss,
            other => {
                return Err(Error::InvalidOption(format!(
                    "unknown loader '{other}' (expected js, jsx, ts, tsx, json, text, css or local-css)"
                )));
            }
        })
    }
}

/// Why the engine is resolving a specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolveKind {
    EntryPoint,
    ImportStatement,
    DynamicImport,
    RequireCall,
    ImportRule,
    UrlToken,
}

/// Input to a resolve hook.
#[derive(Debug, Clone)]
pub struct ResolveArgs {
    /// The specifier exactly as written by the importer.
    pub path: String,
    /// Absolute path of the importing module, if any.
    pub importer: Option<PathBuf>,
    /// Directory to resolve relative specifiers against when there is no importer.
    pub resolve_dir: PathBuf,
    pub kind: ResolveKind,
    /// Namespace of the importer.
    pub namespace: Namespace,
}

impl ResolveArgs {
    pub fn is_entry(&self) -> bool {
        self.kind == ResolveKind::EntryPoint
    }
}

/// Output of a resolve hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOutput {
    pub path: String,
    pub namespace: Namespace,
    /// Leave the reference untouched in the bundle.
    pub external: bool,
}

impl ResolveOutput {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            namespace: Namespace::Default,
            external: false,
        }
    }

    pub fn external(path: impl Into<String>) -> Self {
        Self {
            external: true,
            ..Self::new(path)
        }
    }

    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = namespace;
        self
    }
}

/// Input to a load hook.
#[derive(Debug, Clone)]
pub struct LoadArgs {
    pub path: String,
    pub namespace: Namespace,
}

/// Output of a load hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutput {
    pub contents: String,
    pub loader: Loader,
    pub resolve_dir: Option<PathBuf>,
}

/// Predicate deciding whether a hook sees a request.
///
/// The pattern is matched against the request path; the namespace, when set,
/// must equal the request's namespace. A filter without a pattern matches every
/// path.
#[derive(Debug, Clone)]
pub struct HookFilter {
    pattern: Option<Regex>,
    namespace: Option<Namespace>,
}

impl HookFilter {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|source| Error::InvalidFilter {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self::from_regex(pattern))
    }

    pub fn from_regex(pattern: Regex) -> Self {
        Self {
            pattern: Some(pattern),
            namespace: None,
        }
    }

    /// Matches every path.
    pub fn any() -> Self {
        Self {
            pattern: None,
            namespace: None,
        }
    }

    pub fn in_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = Some(namespace);
        self
    }

    pub fn matches(&self, path: &str, namespace: Namespace) -> bool {
        if self.namespace.is_some_and(|ns| ns != namespace) {
            return false;
        }
        self.pattern.as_ref().is_none_or(|re| re.is_match(path))
    }
}

/// Resolve-phase hook. Returning `Ok(None)` declines the request.
#[async_trait]
pub trait ResolveHook: Send + Sync {
    async fn resolve(&self, args: &ResolveArgs) -> Result<Option<ResolveOutput>>;
}

/// Load-phase hook. Returning `Ok(None)` declines the request.
#[async_trait]
pub trait LoadHook: Send + Sync {
    async fn load(&self, args: &LoadArgs) -> Result<Option<LoadOutput>>;
}

/// Post-build hook, called once per completed rebuild.
#[async_trait]
pub trait EndHook: Send + Sync {
    async fn on_end(&self, result: &BuildResult) -> Result<()>;
}

/// A unit of build customization.
pub trait Plugin: Send + Sync {
    fn name(&self) -> Cow<'static, str>;

    /// Register hooks. Called exactly once, before the first build.
    fn setup(&self, build: &mut PluginBuild<'_>) -> Result<()>;
}

pub type SharedPlugin = Arc<dyn Plugin>;
