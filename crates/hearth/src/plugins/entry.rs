use std::borrow::Cow;
use std::path::Path;

use async_trait::async_trait;

use crate::Result;
use crate::engine::absolutize;
use crate::protocol::{HookFilter, Plugin, PluginBuild, ResolveArgs, ResolveHook, ResolveOutput};

/// Rewrites the entry point into an absolute path.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryNormalizer;

impl Plugin for EntryNormalizer {
    fn name(&self) -> Cow<'static, str> {
        "entry-normalizer".into()
    }

    fn setup(&self, build: &mut PluginBuild<'_>) -> Result<()> {
        build.on_resolve(HookFilter::any(), NormalizeEntry);
        Ok(())
    }
}

struct NormalizeEntry;

#[async_trait]
impl ResolveHook for NormalizeEntry {
    async fn resolve(&self, args: &ResolveArgs) -> Result<Option<ResolveOutput>> {
        if !args.is_entry() {
            return Ok(None);
        }
        let path = Path::new(&args.path);
        if path.is_absolute() {
            return Ok(Some(ResolveOutput::new(args.path.as_str())));
        }
        let path = absolutize(path, &args.resolve_dir);
        Ok(Some(ResolveOutput::new(path.to_string_lossy())))
    }
}
