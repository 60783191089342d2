//! End-to-end tests of the serve pipeline against an in-memory engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use hearth::{
    BuildConfig, BuildContext, BuildResult, Engine, HookTable, LoadArgs, Loader, Namespace,
    OutputManifest, OutputMeta, ResolveArgs, ResolveKind, ResolveOutput, ServeConfig, ServeInfo,
    ServeOptions,
};
use parking_lot::Mutex;
use tempfile::TempDir;

/// Resolves the entry plus a fixed list of imports through the hook table,
/// "bundles" by concatenating loaded sources and reports a manifest.
#[derive(Default)]
struct MemoryEngine {
    imports: Vec<String>,
}

struct MemoryContext {
    config: BuildConfig,
    hooks: Arc<HookTable>,
    imports: Vec<String>,
    generation: AtomicU64,
    fail_next: AtomicBool,
    resolved: Mutex<Vec<ResolveOutput>>,
    served: Mutex<Option<ServeConfig>>,
    disposed: AtomicBool,
}

#[async_trait]
impl Engine for MemoryEngine {
    type Context = MemoryContext;

    async fn context(&self, config: BuildConfig, hooks: Arc<HookTable>) -> hearth::Result<Self::Context> {
        Ok(MemoryContext {
            config,
            hooks,
            imports: self.imports.clone(),
            generation: AtomicU64::new(0),
            fail_next: AtomicBool::new(false),
            resolved: Mutex::new(Vec::new()),
            served: Mutex::new(None),
            disposed: AtomicBool::new(false),
        })
    }
}

impl MemoryContext {
    async fn build(&self) -> hearth::Result<OutputManifest> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(hearth::Error::engine("Unexpected token"));
        }

        let entry = self.config.entry_points[0].to_string_lossy().into_owned();
        let entry = self
            .hooks
            .resolve(&ResolveArgs {
                path: entry,
                importer: None,
                resolve_dir: self.config.working_dir.clone(),
                kind: ResolveKind::EntryPoint,
                namespace: Namespace::Default,
            })
            .await?
            .expect("entry resolves");
        let mut script = tokio::fs::read_to_string(&entry.path).await?;
        let mut styles = String::new();

        for specifier in &self.imports {
            let Some(out) = self
                .hooks
                .resolve(&ResolveArgs {
                    path: specifier.clone(),
                    importer: Some(PathBuf::from(&entry.path)),
                    resolve_dir: self.config.working_dir.clone(),
                    kind: ResolveKind::ImportStatement,
                    namespace: Namespace::Default,
                })
                .await?
            else {
                continue;
            };
            self.resolved.lock().push(out.clone());
            if out.external {
                continue;
            }
            if let Some(loaded) = self
                .hooks
                .load(&LoadArgs {
                    path: out.path.clone(),
                    namespace: out.namespace,
                })
                .await?
            {
                match loaded.loader {
                    Loader::Css | Loader::LocalCss => styles.push_str(&loaded.contents),
                    _ => script.push_str(&loaded.contents),
                }
            }
        }

        tokio::fs::create_dir_all(&self.config.outdir).await?;
        let mut manifest = OutputManifest::new();
        let js = self.config.outdir.join("main.js");
        tokio::fs::write(&js, &script).await?;
        manifest.insert(
            js.to_string_lossy(),
            OutputMeta {
                bytes: script.len() as u64,
                entry_point: Some(entry.path.clone()),
                ..Default::default()
            },
        );
        if !styles.is_empty() {
            let css = self.config.outdir.join("main.css");
            tokio::fs::write(&css, &styles).await?;
            manifest.insert(
                css.to_string_lossy(),
                OutputMeta {
                    bytes: styles.len() as u64,
                    ..Default::default()
                },
            );
        }
        Ok(manifest)
    }
}

#[async_trait]
impl BuildContext for MemoryContext {
    async fn watch(&self) -> hearth::Result<()> {
        self.rebuild().await.map(|_| ())
    }

    async fn serve(&self, config: ServeConfig) -> hearth::Result<ServeInfo> {
        let info = ServeInfo {
            host: config.host.clone(),
            port: config.port,
        };
        *self.served.lock() = Some(config);
        Ok(info)
    }

    async fn rebuild(&self) -> hearth::Result<BuildResult> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let result = match self.build().await {
            Ok(manifest) => BuildResult::success(generation, manifest),
            Err(err) => BuildResult::failure(generation, vec![err.to_string()]),
        };
        self.hooks.end(&result).await?;
        Ok(result)
    }

    async fn dispose(&self) -> hearth::Result<()> {
        self.disposed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

async fn project(files: &[(&str, &str)]) -> TempDir {
    let temp = TempDir::new().unwrap();
    for (path, contents) in files {
        let path = temp.path().join(path);
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(path, contents).await.unwrap();
    }
    temp
}

async fn read(path: impl AsRef<Path>) -> String {
    tokio::fs::read_to_string(path).await.unwrap()
}

#[tokio::test]
async fn serves_entry_with_default_options() {
    let temp = project(&[("src/main.ts", "console.log('hi');")]).await;
    let engine = MemoryEngine::default();

    let session = hearth::serve(
        &engine,
        "src/main.ts",
        ServeOptions::new().working_dir(temp.path()),
    )
    .await
    .unwrap();

    assert_eq!(session.url(), "http://localhost:8000");
    let dist = temp.path().join("dist");
    assert_eq!(read(dist.join("main.js")).await, "console.log('hi');");

    let html = read(dist.join("index.html")).await;
    assert!(html.contains(r#"<script type="module" src="main.js"></script>"#));
    assert!(html.contains("new EventSource('/esbuild')"));
    assert!(!html.contains("<link"));

    let served = session.context().served.lock().clone().unwrap();
    assert_eq!(served.servedir, dist);

    session.dispose().await.unwrap();
}

#[tokio::test]
async fn rebuilding_same_sources_is_byte_identical() {
    let temp = project(&[("src/main.ts", "export {};")]).await;
    let engine = MemoryEngine::default();
    let session = hearth::serve(
        &engine,
        "src/main.ts",
        ServeOptions::new().working_dir(temp.path()),
    )
    .await
    .unwrap();

    let index = temp.path().join("dist/index.html");
    let first = tokio::fs::read(&index).await.unwrap();
    session.context().rebuild().await.unwrap();
    let second = tokio::fs::read(&index).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn failed_rebuild_keeps_shell() {
    let temp = project(&[("src/main.ts", "export {};")]).await;
    let engine = MemoryEngine::default();
    let session = hearth::serve(
        &engine,
        "src/main.ts",
        ServeOptions::new().working_dir(temp.path()),
    )
    .await
    .unwrap();

    let index = temp.path().join("dist/index.html");
    let before = tokio::fs::read(&index).await.unwrap();

    session.context().fail_next.store(true, Ordering::SeqCst);
    let result = session.context().rebuild().await.unwrap();
    assert!(!result.is_success());
    assert_eq!(result.errors, vec!["Engine error: Unexpected token".to_string()]);

    let after = tokio::fs::read(&index).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn import_map_and_stylesheets_flow_through_hooks() {
    let temp = project(&[
        ("deno.json", r#"{"imports": {"@app/": "./src/", "cdn/": "https://esm.sh/"}}"#),
        ("src/main.ts", "import '@app/card.module.css';"),
        ("src/card.module.css", ".card { color: red }"),
        ("src/global.css", "body { margin: 0 }"),
    ])
    .await;
    let engine = MemoryEngine {
        imports: vec![
            "@app/card.module.css".into(),
            "./global.css".into(),
            "cdn/preact".into(),
            "data:text/javascript,export default 1".into(),
        ],
    };

    let session = hearth::serve(
        &engine,
        "src/main.ts",
        ServeOptions::new()
            .working_dir(temp.path())
            .config_path("deno.json")
            .output_dir("public/build")
            .port(3000),
    )
    .await
    .unwrap();

    let resolved = session.context().resolved.lock().clone();
    let src = temp.path().join("src");
    assert_eq!(resolved[0].path, src.join("card.module.css").to_string_lossy());
    assert_eq!(resolved[0].namespace, Namespace::StylesheetModule);
    assert_eq!(resolved[1].path, src.join("global.css").to_string_lossy());
    assert_eq!(resolved[1].namespace, Namespace::Stylesheet);
    assert_eq!(resolved[2], ResolveOutput::external("https://esm.sh/preact"));
    assert!(resolved[3].external);

    assert_eq!(session.url(), "http://localhost:3000");
    let out = temp.path().join("public/build");
    let css = read(out.join("main.css")).await;
    assert!(css.contains(".card { color: red }"));
    assert!(css.contains("body { margin: 0 }"));

    let html = read(out.join("index.html")).await;
    let link = html.find(r#"<link rel="stylesheet" href="main.css">"#).unwrap();
    let script = html.find(r#"<script type="module" src="main.js"></script>"#).unwrap();
    assert!(link < script);
}

#[tokio::test]
async fn caller_plugins_run_first() {
    use hearth::{HookFilter, Plugin, PluginBuild, ResolveHook};
    use std::borrow::Cow;

    struct Virtual;

    #[async_trait]
    impl ResolveHook for Virtual {
        async fn resolve(&self, _args: &ResolveArgs) -> hearth::Result<Option<ResolveOutput>> {
            Ok(Some(ResolveOutput::external("virtual:global.css")))
        }
    }

    struct Override;

    impl Plugin for Override {
        fn name(&self) -> Cow<'static, str> {
            "override".into()
        }

        fn setup(&self, build: &mut PluginBuild<'_>) -> hearth::Result<()> {
            build.on_resolve(HookFilter::new(r"global\.css$")?, Virtual);
            Ok(())
        }
    }

    let temp = project(&[("src/main.ts", "export {};")]).await;
    let engine = MemoryEngine {
        imports: vec!["./global.css".into()],
    };
    let session = hearth::serve(
        &engine,
        "src/main.ts",
        ServeOptions::new()
            .working_dir(temp.path())
            .plugin(Arc::new(Override)),
    )
    .await
    .unwrap();

    let resolved = session.context().resolved.lock().clone();
    assert_eq!(resolved, vec![ResolveOutput::external("virtual:global.css")]);
}

#[tokio::test]
async fn malformed_config_is_fatal() {
    let temp = project(&[("src/main.ts", ""), ("deno.json", "{ imports: ")]).await;
    let engine = MemoryEngine::default();

    let err = hearth::serve(
        &engine,
        "src/main.ts",
        ServeOptions::new()
            .working_dir(temp.path())
            .config_path("deno.json"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, hearth::Error::ConfigParse { .. }));
    assert!(!temp.path().join("dist").exists());
}
