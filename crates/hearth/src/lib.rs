//! # hearth
//!
//! Development-time orchestration on top of an incremental build-and-serve
//! engine: one entry point in, a continuously rebuilt and locally served
//! bundle out.
//!
//! The crate owns the plugin pipeline that runs inside the engine:
//!
//! - external passthrough for URLs and data URIs,
//! - entry-point normalization,
//! - stylesheet namespace tagging,
//! - import-map redirection,
//! - HTML shell generation after every rebuild.
//!
//! Bundling, watching and serving are delegated to an [`Engine`]
//! implementation such as `hearth-rolldown`.
//!
//! ```no_run
//! # async fn run<E: hearth::Engine>(engine: E) -> hearth::Result<()> {
//! let session = hearth::serve(&engine, "src/main.ts", hearth::ServeOptions::new()).await?;
//! println!("{}", session.url());
//! session.dispose().await?;
//! # Ok(()) }
//! ```

pub mod engine;
pub mod error;
pub mod import_map;
pub mod manifest;
pub mod options;
pub mod plugins;
pub mod project;
pub mod protocol;
pub mod resolve;
pub mod serve;

pub use engine::{
    BuildConfig, BuildContext, CHANGE_EVENT, CHANGE_STREAM_PATH, Engine, EngineOptions, Format,
    JsxConfig, JsxMode, ServeConfig, ServeInfo,
};
pub use error::{Error, Result};
pub use import_map::ImportMap;
pub use manifest::{BuildResult, InputMeta, OutputManifest, OutputMeta};
pub use options::{DEFAULT_OUTPUT_DIR, ServeOptions, default_loader_map};
pub use project::{CompilerOptions, ProjectConfig, ProjectDocument};
pub use protocol::{
    EndHook, HookFilter, HookTable, LoadArgs, LoadHook, LoadOutput, Loader, Namespace, Plugin,
    PluginBuild, ResolveArgs, ResolveHook, ResolveKind, ResolveOutput, SharedPlugin,
};
pub use serve::{ServeSession, display_host, serve};
