//! Build context: one Rolldown run per rebuild, plus watch and serve.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use hearth::{
    BuildConfig, BuildContext, BuildResult, HookTable, InputMeta, OutputManifest, OutputMeta,
    ServeConfig, ServeInfo,
};
use parking_lot::Mutex;
use rolldown::{
    BundlerBuilder, BundlerOptions, InputItem, IsExternal, OutputFormat, Platform, RawMinifyOptions,
};
use rolldown_common::Output;
use rolldown_plugin::__inner::SharedPluginable;
use tokio::task::JoinHandle;

use crate::bridge::{BridgeState, HookBridge};
use crate::error::{Error, Result};
use crate::server::{self, ServerHandle};
use crate::state::{ServerState, SharedState};
use crate::watcher::{FileWatcher, IgnoreRules};

struct Inner {
    config: Arc<BuildConfig>,
    hooks: Arc<HookTable>,
    bridge: Arc<BridgeState>,
    generation: AtomicU64,
    state: SharedState,
    /// Serializes rebuilds.
    build_lock: tokio::sync::Mutex<()>,
}

/// A Rolldown-backed [`BuildContext`].
pub struct RolldownContext {
    inner: Arc<Inner>,
    watcher: Mutex<Option<(FileWatcher, JoinHandle<()>)>>,
    server: Mutex<Option<ServerHandle>>,
}

impl RolldownContext {
    pub(crate) fn new(config: BuildConfig, hooks: Arc<HookTable>) -> Self {
        let state = Arc::new(ServerState::new(config.outdir.clone()));
        Self {
            inner: Arc::new(Inner {
                config: Arc::new(config),
                hooks,
                bridge: Arc::new(BridgeState::default()),
                generation: AtomicU64::new(0),
                state,
                build_lock: tokio::sync::Mutex::new(()),
            }),
            watcher: Mutex::new(None),
            server: Mutex::new(None),
        }
    }
}

impl Inner {
    async fn rebuild(&self) -> Result<BuildResult> {
        let _guard = self.build_lock.lock().await;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let started = Instant::now();

        let result = match self.bundle().await {
            Ok(manifest) => {
                tracing::info!(
                    generation,
                    outputs = manifest.len(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    "build finished"
                );
                BuildResult::success(generation, manifest)
            }
            Err(e) => {
                tracing::error!(generation, error = %e, "build failed");
                BuildResult::failure(generation, vec![e.to_string()])
            }
        };

        self.hooks.end(&result).await?;
        if result.is_success() {
            let event = serde_json::json!({ "generation": generation }).to_string();
            self.state.broadcast(&event).await;
        }
        Ok(result)
    }

    async fn bundle(&self) -> Result<OutputManifest> {
        let config = &self.config;
        let bridge: SharedPluginable = Arc::new(HookBridge::new(
            Arc::clone(&self.hooks),
            Arc::clone(config),
            Arc::clone(&self.bridge),
        ));

        let mut bundler = BundlerBuilder::default()
            .with_options(bundler_options(config))
            .with_plugins(vec![bridge])
            .build()
            .map_err(|e| Error::from_rolldown_batch(&e))?;
        let bundle = bundler
            .generate()
            .await
            .map_err(|e| Error::from_rolldown_batch(&e))?;

        tokio::fs::create_dir_all(&config.outdir).await?;
        let mut manifest = OutputManifest::new();
        for output in bundle.assets.iter() {
            let (filename, bytes, meta) = match output {
                Output::Chunk(chunk) => {
                    let inputs = chunk
                        .module_ids
                        .iter()
                        .map(|id| (id.to_string(), InputMeta::default()))
                        .collect();
                    let entry_point = if chunk.is_entry {
                        chunk.facade_module_id.as_ref().map(|id| id.to_string())
                    } else {
                        None
                    };
                    let meta = OutputMeta {
                        bytes: chunk.code.len() as u64,
                        inputs,
                        entry_point,
                    };
                    (chunk.filename.to_string(), chunk.code.as_bytes(), meta)
                }
                Output::Asset(asset) => {
                    let bytes = asset.source.as_bytes();
                    let meta = OutputMeta {
                        bytes: bytes.len() as u64,
                        ..Default::default()
                    };
                    (asset.filename.to_string(), bytes, meta)
                }
            };

            let target = config.outdir.join(&filename);
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&target, bytes).await?;
            manifest.insert(target.to_string_lossy(), meta);
        }
        Ok(manifest)
    }
}

pub(crate) fn bundler_options(config: &BuildConfig) -> BundlerOptions {
    let input = config
        .entry_points
        .iter()
        .map(|entry| InputItem {
            name: None,
            import: entry.to_string_lossy().into_owned(),
        })
        .collect();

    BundlerOptions {
        input: Some(input),
        cwd: Some(config.working_dir.clone()),
        format: Some(OutputFormat::Esm),
        platform: Some(Platform::Browser),
        external: Some(IsExternal::from(config.engine.external.clone())),
        minify: config.engine.minify.then(|| RawMinifyOptions::from(true)),
        ..Default::default()
    }
}

/// Coalesce a burst of change events into one rebuild.
async fn run_watch_loop(
    inner: Arc<Inner>,
    mut rx: tokio::sync::mpsc::Receiver<std::path::PathBuf>,
    debounce: Duration,
) {
    while let Some(path) = rx.recv().await {
        tokio::time::sleep(debounce).await;
        let mut changed = 1;
        while rx.try_recv().is_ok() {
            changed += 1;
        }
        tracing::info!(path = %path.display(), changed, "change detected, rebuilding");
        if let Err(e) = inner.rebuild().await {
            tracing::error!(error = %e, "post-build hooks failed");
        }
    }
}

fn watch_root(config: &BuildConfig) -> &Path {
    &config.working_dir
}

#[async_trait]
impl BuildContext for RolldownContext {
    async fn watch(&self) -> hearth::Result<()> {
        self.inner.rebuild().await?;

        let config = &self.inner.config;
        let rules = IgnoreRules::new(
            watch_root(config).to_path_buf(),
            config.outdir.clone(),
            &config.engine.watch_ignore,
        );
        let debounce = Duration::from_millis(config.engine.debounce_ms);
        let (watcher, rx) = FileWatcher::new(rules, debounce)?;
        let task = tokio::spawn(run_watch_loop(Arc::clone(&self.inner), rx, debounce));

        if let Some((_, previous)) = self.watcher.lock().replace((watcher, task)) {
            previous.abort();
        }
        Ok(())
    }

    async fn serve(&self, config: ServeConfig) -> hearth::Result<ServeInfo> {
        let state = if config.servedir == self.inner.config.outdir {
            Arc::clone(&self.inner.state)
        } else {
            Arc::new(ServerState::new(config.servedir.clone()))
        };
        let handle = server::start(state, &config.host, config.port).await?;
        let info = ServeInfo {
            host: config.host.clone(),
            port: handle.local_addr().port(),
        };

        let previous = self.server.lock().replace(handle);
        if let Some(previous) = previous {
            previous.shutdown().await;
        }
        Ok(info)
    }

    async fn rebuild(&self) -> hearth::Result<BuildResult> {
        Ok(self.inner.rebuild().await?)
    }

    async fn dispose(&self) -> hearth::Result<()> {
        if let Some((watcher, task)) = self.watcher.lock().take() {
            task.abort();
            drop(watcher);
        }
        let server = self.server.lock().take();
        if let Some(server) = server {
            server.shutdown().await;
        }
        tracing::debug!("build context disposed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn options_force_esm_browser_build() {
        let mut config = BuildConfig::new("/app/src/main.ts", "/app/dist", "/app");
        config.engine.external = vec!["react".into()];
        let options = bundler_options(&config);

        assert!(matches!(options.format, Some(OutputFormat::Esm)));
        assert!(matches!(options.platform, Some(Platform::Browser)));
        assert_eq!(options.cwd, Some(PathBuf::from("/app")));
        let input = options.input.unwrap();
        assert_eq!(input.len(), 1);
        assert_eq!(input[0].import, "/app/src/main.ts");
        assert!(options.minify.is_none());
    }

    #[test]
    fn minify_is_passed_through() {
        let mut config = BuildConfig::new("/app/src/main.ts", "/app/dist", "/app");
        config.engine.minify = true;
        assert!(bundler_options(&config).minify.is_some());
    }
}
