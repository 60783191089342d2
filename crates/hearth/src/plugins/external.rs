use std::borrow::Cow;

use async_trait::async_trait;

use crate::Result;
use crate::protocol::{HookFilter, Plugin, PluginBuild, ResolveArgs, ResolveHook, ResolveOutput};

/// Marks URLs and data URIs external so the engine never tries to read them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalPassthrough;

impl Plugin for ExternalPassthrough {
    fn name(&self) -> Cow<'static, str> {
        "external-passthrough".into()
    }

    fn setup(&self, build: &mut PluginBuild<'_>) -> Result<()> {
        build.on_resolve(HookFilter::new(r"^(?:data:|https?://)")?, Passthrough);
        Ok(())
    }
}

struct Passthrough;

#[async_trait]
impl ResolveHook for Passthrough {
    async fn resolve(&self, args: &ResolveArgs) -> Result<Option<ResolveOutput>> {
        Ok(Some(ResolveOutput::external(args.path.clone())))
    }
}
