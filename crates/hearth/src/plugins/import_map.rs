use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::engine::absolutize;
use crate::import_map::ImportMap;
use crate::protocol::{HookFilter, Plugin, PluginBuild, ResolveArgs, ResolveHook, ResolveOutput};
use crate::resolve::is_external_reference;

/// Redirects any matching specifier through the import map.
///
/// URL targets come back external. Everything else is left to the engine's
/// loaders in the default namespace.
#[derive(Debug, Clone)]
pub struct ImportMapResolver {
    import_map: Arc<ImportMap>,
}

impl ImportMapResolver {
    pub fn new(import_map: Arc<ImportMap>) -> Self {
        Self { import_map }
    }
}

impl Plugin for ImportMapResolver {
    fn name(&self) -> Cow<'static, str> {
        "import-map".into()
    }

    fn setup(&self, build: &mut PluginBuild<'_>) -> Result<()> {
        if self.import_map.is_empty() {
            return Ok(());
        }
        tracing::debug!(entries = self.import_map.len(), "import map active");
        build.on_resolve(
            HookFilter::any(),
            Redirect {
                import_map: Arc::clone(&self.import_map),
            },
        );
        Ok(())
    }
}

struct Redirect {
    import_map: Arc<ImportMap>,
}

#[async_trait]
impl ResolveHook for Redirect {
    async fn resolve(&self, args: &ResolveArgs) -> Result<Option<ResolveOutput>> {
        let Some(mapped) = self.import_map.resolve(&args.path) else {
            return Ok(None);
        };
        if is_external_reference(&mapped) {
            return Ok(Some(ResolveOutput::external(mapped)));
        }
        let path = absolutize(Path::new(&mapped), &args.resolve_dir);
        Ok(Some(ResolveOutput::new(path.to_string_lossy())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BuildConfig;
    use crate::plugins::test_util::{import, table_for};

    fn config() -> BuildConfig {
        BuildConfig::new("/app/src/main.ts", "/app/dist", "/app")
    }

    #[tokio::test]
    async fn maps_prefixed_specifier() {
        let map = ImportMap::new("/app").with_entry("@app/", "./src/");
        let table = table_for(ImportMapResolver::new(Arc::new(map)), &config());

        let out = table
            .resolve(&import("@app/widgets/button.ts", Some("/app/src/main.ts")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(out.path, "/app/src/widgets/button.ts");
        assert!(!out.external);
    }

    #[tokio::test]
    async fn url_target_is_external() {
        let map = ImportMap::new("/app").with_entry("preact", "https://esm.sh/preact@10");
        let table = table_for(ImportMapResolver::new(Arc::new(map)), &config());

        let out = table
            .resolve(&import("preact/hooks", None))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(out.path, "https://esm.sh/preact@10/hooks");
        assert!(out.external);
    }

    #[tokio::test]
    async fn relative_base_resolves_against_resolve_dir() {
        let map = ImportMap::new("config").with_entry("lib", "../lib/index.ts");
        let table = table_for(ImportMapResolver::new(Arc::new(map)), &config());

        let out = table.resolve(&import("lib", None)).await.unwrap().unwrap();
        assert_eq!(out.path, "/app/lib/index.ts");
    }

    #[tokio::test]
    async fn empty_map_registers_nothing() {
        let table = table_for(
            ImportMapResolver::new(Arc::new(ImportMap::default())),
            &config(),
        );
        assert_eq!(table.resolve_hook_count(), 0);
    }
}
