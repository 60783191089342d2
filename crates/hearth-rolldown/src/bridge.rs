//! The Rolldown plugin that runs the hearth hook table.
//!
//! Rolldown's `resolve_id` and `load` hooks are translated into
//! [`HookTable`] calls. The namespace a module was resolved into is remembered
//! by id so the matching load hooks see it. Loader conversion (stylesheets,
//! text, JSX pragmas) happens here because Rolldown only knows module types.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hearth::{
    BuildConfig, HookTable, JsxConfig, JsxMode, LoadArgs, Loader, Namespace, ResolveArgs,
    ResolveKind,
};
use parking_lot::RwLock;
use rolldown_common::{ModuleType, ResolvedExternal};
use rolldown_plugin::{
    HookLoadArgs, HookLoadOutput, HookLoadReturn, HookResolveIdArgs, HookResolveIdOutput,
    HookResolveIdReturn, HookUsage, Plugin, PluginContext,
};
use rustc_hash::FxHashMap;

use crate::css;

/// Per-context memory shared by every bridge instance of that context.
#[derive(Debug, Default)]
pub struct BridgeState {
    namespaces: RwLock<FxHashMap<String, Namespace>>,
    scoped: RwLock<FxHashMap<String, String>>,
}

impl BridgeState {
    pub fn namespace_of(&self, id: &str) -> Namespace {
        self.namespaces
            .read()
            .get(id)
            .copied()
            .unwrap_or_default()
    }

    fn remember(&self, id: &str, namespace: Namespace) {
        let mut namespaces = self.namespaces.write();
        if namespace == Namespace::Default {
            namespaces.remove(id);
        } else {
            namespaces.insert(id.to_string(), namespace);
        }
    }

    fn scoped_css(&self, id: &str) -> Option<String> {
        self.scoped.read().get(id).cloned()
    }
}

#[derive(Debug, Clone)]
pub struct HookBridge {
    hooks: Arc<HookTable>,
    config: Arc<BuildConfig>,
    state: Arc<BridgeState>,
}

impl HookBridge {
    pub fn new(hooks: Arc<HookTable>, config: Arc<BuildConfig>, state: Arc<BridgeState>) -> Self {
        Self {
            hooks,
            config,
            state,
        }
    }
}

impl Plugin for HookBridge {
    fn name(&self) -> Cow<'static, str> {
        "hearth-hooks".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::ResolveId | HookUsage::Load
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let specifier = args.specifier.to_string();
        let importer = args.importer.map(str::to_string);
        let bridge = self.clone();

        async move { bridge.resolve_specifier(specifier, importer).await }
    }

    fn load(
        &self,
        _ctx: &PluginContext,
        args: &HookLoadArgs<'_>,
    ) -> impl std::future::Future<Output = HookLoadReturn> + Send {
        let id = args.id.to_string();
        let bridge = self.clone();

        async move {
            if css::is_scoped_id(&id) {
                return Ok(bridge.state.scoped_css(&id).map(|code| HookLoadOutput {
                    code: code.into(),
                    module_type: Some(ModuleType::Css),
                    ..Default::default()
                }));
            }
            if id.starts_with('\0') {
                return Ok(None);
            }

            let namespace = bridge.state.namespace_of(&id);
            let loaded = bridge
                .hooks
                .load(&LoadArgs {
                    path: id.clone(),
                    namespace,
                })
                .await?;
            if let Some(loaded) = loaded {
                return Ok(Some(bridge.convert(&id, loaded.contents, loaded.loader)?));
            }
            if namespace != Namespace::Default {
                return Ok(None);
            }

            // Nothing claimed it: apply the loader map, then JSX settings.
            let loader = match bridge.config.loader_for(&id) {
                Some(loader) if !loader.is_stylesheet() => Some(loader),
                _ => jsx_loader(&id).filter(|_| !jsx_pragmas(&bridge.config.jsx).is_empty()),
            };
            let Some(loader) = loader else {
                return Ok(None);
            };
            let contents = tokio::fs::read_to_string(&id).await.map_err(|source| {
                hearth::Error::ModuleLoad {
                    path: PathBuf::from(&id),
                    source,
                }
            })?;
            Ok(Some(bridge.convert(&id, contents, loader)?))
        }
    }
}

impl HookBridge {
    /// Run the resolve hooks for one specifier; `None` importer marks the entry.
    pub async fn resolve_specifier(
        &self,
        specifier: String,
        importer: Option<String>,
    ) -> HookResolveIdReturn {
        if css::is_scoped_id(&specifier) {
            return Ok(Some(HookResolveIdOutput {
                id: specifier.into(),
                external: Some(ResolvedExternal::Bool(false)),
                ..Default::default()
            }));
        }

        let request = self.resolve_args(specifier, importer.as_deref());
        let Some(output) = self.hooks.resolve(&request).await? else {
            return Ok(None);
        };
        self.state.remember(&output.path, output.namespace);

        Ok(Some(HookResolveIdOutput {
            id: output.path.into(),
            external: Some(ResolvedExternal::Bool(output.external)),
            ..Default::default()
        }))
    }

    fn resolve_args(&self, specifier: String, importer: Option<&str>) -> ResolveArgs {
        let (kind, importer_path, namespace) = match importer {
            None => (ResolveKind::EntryPoint, None, Namespace::Default),
            Some(importer) => {
                // Scoped facades import their virtual stylesheet under the original path.
                let real = importer.strip_prefix(css::SCOPED_PREFIX).unwrap_or(importer);
                (
                    ResolveKind::ImportStatement,
                    Some(PathBuf::from(real)),
                    self.state.namespace_of(importer),
                )
            }
        };
        let resolve_dir = importer_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.working_dir.clone());

        ResolveArgs {
            path: specifier,
            importer: importer_path,
            resolve_dir,
            kind,
            namespace,
        }
    }

    fn convert(&self, id: &str, contents: String, loader: Loader) -> anyhow::Result<HookLoadOutput> {
        let (code, module_type) = match loader {
            Loader::Css => (contents, ModuleType::Css),
            Loader::LocalCss => {
                let scoped = css::scope_stylesheet(Path::new(id), &contents)?;
                let virtual_id = css::scoped_id(id);
                let facade = css::module_source(&virtual_id, &scoped.exports);
                self.state.scoped.write().insert(virtual_id, scoped.css);
                (facade, ModuleType::Js)
            }
            Loader::Text => (css::text_module(&contents), ModuleType::Js),
            Loader::Json => (contents, ModuleType::Json),
            Loader::Js => (contents, ModuleType::Js),
            Loader::Ts => (contents, ModuleType::Ts),
            Loader::Jsx => (self.with_pragmas(contents), ModuleType::Jsx),
            Loader::Tsx => (self.with_pragmas(contents), ModuleType::Tsx),
        };
        Ok(HookLoadOutput {
            code: code.into(),
            module_type: Some(module_type),
            ..Default::default()
        })
    }

    fn with_pragmas(&self, contents: String) -> String {
        let pragmas = jsx_pragmas(&self.config.jsx);
        if pragmas.is_empty() {
            contents
        } else {
            pragmas + &contents
        }
    }
}

fn jsx_loader(id: &str) -> Option<Loader> {
    if id.ends_with(".jsx") {
        Some(Loader::Jsx)
    } else if id.ends_with(".tsx") {
        Some(Loader::Tsx)
    } else {
        None
    }
}

/// Leading pragma comments selecting the JSX runtime and factories.
pub fn jsx_pragmas(jsx: &JsxConfig) -> String {
    let mut out = String::new();
    match jsx.mode {
        JsxMode::Automatic => {
            out.push_str("/** @jsxRuntime automatic */\n");
            if let Some(source) = &jsx.import_source {
                out.push_str(&format!("/** @jsxImportSource {source} */\n"));
            }
        }
        JsxMode::Transform => {
            if jsx.factory.is_none() && jsx.fragment.is_none() {
                return out;
            }
            out.push_str("/** @jsxRuntime classic */\n");
            if let Some(factory) = &jsx.factory {
                out.push_str(&format!("/** @jsx {factory} */\n"));
            }
            if let Some(fragment) = &jsx.fragment {
                out.push_str(&format!("/** @jsxFrag {fragment} */\n"));
            }
        }
    }
    out
}
