//! Rolldown engine for hearth.
//!
//! [`RolldownEngine`] turns a [`hearth::BuildConfig`] and its hook table into a
//! [`RolldownContext`]: every rebuild runs Rolldown with the hooks bridged in,
//! writes the chunks to the output directory and reports an output manifest.
//! The context also watches the project for changes and serves the output
//! directory together with the change stream browsers reload on.
//!
//! ```no_run
//! use hearth::ServeOptions;
//! use hearth_rolldown::RolldownEngine;
//!
//! # async fn run() -> hearth::Result<()> {
//! let session = hearth::serve(&RolldownEngine::new(), "src/main.ts", ServeOptions::new()).await?;
//! println!("{}", session.url());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use hearth::{BuildConfig, HookTable};

pub mod bridge;
pub mod context;
pub mod css;
pub mod error;
pub mod server;
pub mod state;
pub mod watcher;

pub use bridge::HookBridge;
pub use context::RolldownContext;
pub use error::{Error, Result};
pub use server::ServerHandle;
pub use watcher::{FileWatcher, IgnoreRules};

#[derive(Debug, Clone, Copy, Default)]
pub struct RolldownEngine;

impl RolldownEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl hearth::Engine for RolldownEngine {
    type Context = RolldownContext;

    async fn context(
        &self,
        config: BuildConfig,
        hooks: Arc<HookTable>,
    ) -> hearth::Result<RolldownContext> {
        if config.entry_points.is_empty() {
            return Err(hearth::Error::InvalidOption(
                "at least one entry point is required".into(),
            ));
        }
        tracing::debug!(
            entries = config.entry_points.len(),
            outdir = %config.outdir.display(),
            resolve_hooks = hooks.resolve_hook_count(),
            load_hooks = hooks.load_hook_count(),
            end_hooks = hooks.end_hook_count(),
            "creating rolldown context"
        );
        Ok(RolldownContext::new(config, hooks))
    }
}
