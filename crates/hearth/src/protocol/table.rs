//! Hook registration and dispatch.

use std::borrow::Cow;
use std::sync::Arc;

use super::{
    EndHook, HookFilter, LoadArgs, LoadHook, LoadOutput, ResolveArgs, ResolveHook, ResolveOutput,
    SharedPlugin,
};
use crate::Result;
use crate::engine::BuildConfig;
use crate::error::Error;
use crate::manifest::BuildResult;

struct Registered<H: ?Sized> {
    plugin: Cow<'static, str>,
    filter: HookFilter,
    hook: Arc<H>,
}

/// Ordered dispatch table built from every plugin's `setup`.
///
/// Resolve and load hooks are evaluated in registration order and the first
/// hook returning `Some` wins. Every end hook runs, in order.
#[derive(Default)]
pub struct HookTable {
    resolve: Vec<Registered<dyn ResolveHook>>,
    load: Vec<Registered<dyn LoadHook>>,
    end: Vec<(Cow<'static, str>, Arc<dyn EndHook>)>,
}

impl HookTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `setup` for each plugin, in order, against `config`.
    pub fn from_plugins(config: &BuildConfig, plugins: &[SharedPlugin]) -> Result<Self> {
        let mut table = Self::new();
        for plugin in plugins {
            let name = plugin.name();
            tracing::debug!(plugin = %name, "setting up plugin");
            let mut build = PluginBuild {
                plugin: name,
                config,
                table: &mut table,
            };
            plugin.setup(&mut build)?;
        }
        Ok(table)
    }

    pub async fn resolve(&self, args: &ResolveArgs) -> Result<Option<ResolveOutput>> {
        for entry in &self.resolve {
            if !entry.filter.matches(&args.path, args.namespace) {
                continue;
            }
            let output = entry
                .hook
                .resolve(args)
                .await
                .map_err(|err| Error::in_plugin(entry.plugin.clone(), "resolve", err))?;
            if let Some(output) = output {
                tracing::trace!(
                    plugin = %entry.plugin,
                    specifier = %args.path,
                    resolved = %output.path,
                    namespace = %output.namespace,
                    external = output.external,
                    "resolved"
                );
                return Ok(Some(output));
            }
        }
        Ok(None)
    }

    pub async fn load(&self, args: &LoadArgs) -> Result<Option<LoadOutput>> {
        for entry in &self.load {
            if !entry.filter.matches(&args.path, args.namespace) {
                continue;
            }
            let output = entry
                .hook
                .load(args)
                .await
                .map_err(|err| Error::in_plugin(entry.plugin.clone(), "load", err))?;
            if output.is_some() {
                return Ok(output);
            }
        }
        Ok(None)
    }

    pub async fn end(&self, result: &BuildResult) -> Result<()> {
        for (plugin, hook) in &self.end {
            hook.on_end(result)
                .await
                .map_err(|err| Error::in_plugin(plugin.clone(), "end", err))?;
        }
        Ok(())
    }

    pub fn resolve_hook_count(&self) -> usize {
        self.resolve.len()
    }

    pub fn load_hook_count(&self) -> usize {
        self.load.len()
    }

    pub fn end_hook_count(&self) -> usize {
        self.end.len()
    }

    /// Names of the plugins owning resolve hooks, in evaluation order.
    #[cfg(test)]
    pub(crate) fn resolve_order(&self) -> Vec<&str> {
        self.resolve.iter().map(|r| r.plugin.as_ref()).collect()
    }
}

impl std::fmt::Debug for HookTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookTable")
            .field("resolve", &self.resolve.len())
            .field("load", &self.load.len())
            .field("end", &self.end.len())
            .finish()
    }
}

/// Handle passed to [`Plugin::setup`](super::Plugin::setup).
pub struct PluginBuild<'a> {
    plugin: Cow<'static, str>,
    config: &'a BuildConfig,
    table: &'a mut HookTable,
}

impl PluginBuild<'_> {
    /// The configuration the engine will build with.
    pub fn initial_options(&self) -> &BuildConfig {
        self.config
    }

    pub fn on_resolve(&mut self, filter: HookFilter, hook: impl ResolveHook + 'static) {
        self.table.resolve.push(Registered {
            plugin: self.plugin.clone(),
            filter,
            hook: Arc::new(hook),
        });
    }

    pub fn on_load(&mut self, filter: HookFilter, hook: impl LoadHook + 'static) {
        self.table.load.push(Registered {
            plugin: self.plugin.clone(),
            filter,
            hook: Arc::new(hook),
        });
    }

    pub fn on_end(&mut self, hook: impl EndHook + 'static) {
        self.table.end.push((self.plugin.clone(), Arc::new(hook)));
    }
}
