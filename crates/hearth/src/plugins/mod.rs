//! Built-in plugins, in the order the orchestrator installs them.

pub mod entry;
pub mod external;
pub mod import_map;
pub mod mime;
pub mod shell;
pub mod stylesheet;

pub use entry::EntryNormalizer;
pub use external::ExternalPassthrough;
pub use import_map::ImportMapResolver;
pub use mime::MimeClass;
pub use shell::ShellGenerator;
pub use stylesheet::StylesheetLoader;

#[cfg(test)]
pub(crate) mod test_util {
    use std::path::PathBuf;
    use std::sync::Arc;

    use crate::engine::BuildConfig;
    use crate::protocol::{HookTable, Namespace, Plugin, ResolveArgs, ResolveKind};

    pub fn table_for(plugin: impl Plugin + 'static, config: &BuildConfig) -> HookTable {
        HookTable::from_plugins(config, &[Arc::new(plugin)]).unwrap()
    }

    pub fn import(path: &str, importer: Option<&str>) -> ResolveArgs {
        ResolveArgs {
            path: path.to_string(),
            importer: importer.map(PathBuf::from),
            resolve_dir: PathBuf::from("/app"),
            kind: ResolveKind::ImportStatement,
            namespace: Namespace::Default,
        }
    }
}
