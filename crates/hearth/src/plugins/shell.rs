//! HTML shell generation.
//!
//! After every successful rebuild the manifest's outputs are split into
//! scripts and stylesheets and `index.html` is rewritten in the output
//! directory. The document depends only on the manifest, so regenerating from
//! the same manifest is byte-identical.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::mime::{MimeClass, classify};
use crate::Result;
use crate::engine::{CHANGE_EVENT, CHANGE_STREAM_PATH, absolutize};
use crate::error::Error;
use crate::manifest::{BuildResult, OutputManifest};
use crate::protocol::{EndHook, Plugin, PluginBuild};

pub const SHELL_FILE_NAME: &str = "index.html";

/// Output paths relative to the output directory, in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedOutputs {
    pub scripts: Vec<String>,
    pub stylesheets: Vec<String>,
}

/// Partition `manifest` by [`MimeClass`].
///
/// Relative manifest paths are taken against `working_dir`.
pub fn classify_outputs(
    manifest: &OutputManifest,
    outdir: &Path,
    working_dir: &Path,
) -> ClassifiedOutputs {
    let mut classified = ClassifiedOutputs::default();
    for path in manifest.paths() {
        let Some(class) = classify(path) else {
            continue;
        };
        let absolute = absolutize(Path::new(path), working_dir);
        let href = relative_href(&absolute, outdir);
        match class {
            MimeClass::Script => classified.scripts.push(href),
            MimeClass::Stylesheet => classified.stylesheets.push(href),
        }
    }
    classified
}

/// `path` relative to `base`, `/`-separated.
fn relative_href(path: &Path, base: &Path) -> String {
    let path: Vec<Component<'_>> = path.components().collect();
    let base: Vec<Component<'_>> = base.components().collect();
    let common = path
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<Cow<'_, str>> = Vec::new();
    parts.extend(base[common..].iter().map(|_| Cow::Borrowed("..")));
    parts.extend(
        path[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy()),
    );
    parts.join("/")
}

fn escape_attr(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Render the complete `index.html`.
pub fn render_shell(outputs: &ClassifiedOutputs) -> String {
    let stylesheet_tags = outputs
        .stylesheets
        .iter()
        .map(|href| format!(r#"<link rel="stylesheet" href="{}">"#, escape_attr(href)))
        .collect::<Vec<_>>()
        .join("\n");
    let script_tags = outputs
        .scripts
        .iter()
        .map(|src| {
            format!(
                r#"<script type="module" src="{}"></script>"#,
                escape_attr(src)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
{stylesheet_tags}
{script_tags}
<script defer>new EventSource('{CHANGE_STREAM_PATH}').addEventListener('{CHANGE_EVENT}', () => location.reload());</script>
</head>
<body>
</body>
</html>
"#
    )
}

/// Create `outdir` if needed and overwrite its `index.html` in one write.
pub async fn write_shell(outdir: &Path, html: &str) -> Result<PathBuf> {
    let target = outdir.join(SHELL_FILE_NAME);
    tokio::fs::create_dir_all(outdir)
        .await
        .map_err(|source| Error::ShellWrite {
            path: outdir.to_path_buf(),
            source,
        })?;
    tokio::fs::write(&target, html)
        .await
        .map_err(|source| Error::ShellWrite {
            path: target.clone(),
            source,
        })?;
    Ok(target)
}

/// Rewrites `index.html` after each successful rebuild.
///
/// Results are applied in generation order even when end hooks run
/// concurrently: the generation check and the write happen under one lock.
#[derive(Debug, Clone, Default)]
pub struct ShellGenerator {
    written: Arc<AtomicU64>,
    write_lock: Arc<Mutex<()>>,
}

impl ShellGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest generation whose shell has been written, 0 before the first.
    #[cfg(test)]
    pub(crate) fn last_generation(&self) -> u64 {
        self.written.load(Ordering::SeqCst)
    }
}

impl Plugin for ShellGenerator {
    fn name(&self) -> Cow<'static, str> {
        "html-shell".into()
    }

    fn setup(&self, build: &mut PluginBuild<'_>) -> Result<()> {
        let config = build.initial_options();
        let hook = WriteShell {
            outdir: config.outdir.clone(),
            working_dir: config.working_dir.clone(),
            written: Arc::clone(&self.written),
            write_lock: Arc::clone(&self.write_lock),
        };
        build.on_end(hook);
        Ok(())
    }
}

struct WriteShell {
    outdir: PathBuf,
    working_dir: PathBuf,
    written: Arc<AtomicU64>,
    write_lock: Arc<Mutex<()>>,
}

#[async_trait]
impl EndHook for WriteShell {
    async fn on_end(&self, result: &BuildResult) -> Result<()> {
        let Some(manifest) = &result.manifest else {
            tracing::debug!(
                generation = result.generation,
                errors = result.errors.len(),
                "build failed, keeping previous shell"
            );
            return Ok(());
        };

        let _guard = self.write_lock.lock().await;
        let newest = self.written.load(Ordering::SeqCst);
        if newest > result.generation {
            tracing::debug!(
                generation = result.generation,
                newest,
                "discarding stale build result"
            );
            return Ok(());
        }

        let outputs = classify_outputs(manifest, &self.outdir, &self.working_dir);
        let html = render_shell(&outputs);
        let target = write_shell(&self.outdir, &html).await?;
        self.written.store(result.generation, Ordering::SeqCst);
        tracing::debug!(
            path = %target.display(),
            scripts = outputs.scripts.len(),
            stylesheets = outputs.stylesheets.len(),
            "wrote html shell"
        );
        Ok(())
    }
}
