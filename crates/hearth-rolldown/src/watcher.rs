//! File system watcher for rebuild triggering.
//!
//! Watches the project directory recursively and forwards changes to relevant
//! files, skipping the output directory, `node_modules` and hidden paths.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Always ignored, in addition to the output directory and hidden paths.
const DEFAULT_IGNORES: &[&str] = &["node_modules"];

pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

/// Paths the watcher never reports.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    root: PathBuf,
    outdir: PathBuf,
    patterns: Vec<String>,
}

impl IgnoreRules {
    pub fn new(root: PathBuf, outdir: PathBuf, extra: &[String]) -> Self {
        let mut patterns: Vec<String> = DEFAULT_IGNORES.iter().map(|p| p.to_string()).collect();
        patterns.extend(extra.iter().cloned());
        Self {
            root,
            outdir,
            patterns,
        }
    }

    pub fn should_ignore(&self, path: &Path) -> bool {
        if path.starts_with(&self.outdir) {
            return true;
        }
        let Ok(rel_path) = path.strip_prefix(&self.root) else {
            return true;
        };

        let path_str = rel_path.to_string_lossy();
        for pattern in &self.patterns {
            if let Some(ext) = pattern.strip_prefix('*') {
                if path_str.ends_with(ext) {
                    return true;
                }
            } else if path_str.starts_with(pattern.as_str())
                || path_str.contains(&format!("/{pattern}"))
            {
                return true;
            }
        }

        rel_path.components().any(|component| {
            component
                .as_os_str()
                .to_str()
                .is_some_and(|name| name.starts_with('.') && name != "." && name != "..")
        })
    }
}

impl FileWatcher {
    /// Start watching `rules.root`. Every relevant change sends its path.
    ///
    /// Repeated events for the same path inside `debounce` are dropped.
    pub fn new(rules: IgnoreRules, debounce: Duration) -> Result<(Self, mpsc::Receiver<PathBuf>)> {
        let root = rules.root.clone();
        if !root.exists() {
            return Err(Error::WatchRootMissing(root));
        }

        let (tx, rx) = mpsc::channel(100);
        let mut last_event: Option<(PathBuf, Instant)> = None;

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let Ok(event) = res else {
                return;
            };
            if !matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) {
                return;
            }
            for path in event.paths {
                if rules.should_ignore(&path) {
                    continue;
                }

                let now = Instant::now();
                if let Some((last_path, last_time)) = &last_event {
                    if *last_path == path && now.duration_since(*last_time) < debounce {
                        continue;
                    }
                }
                last_event = Some((path.clone(), now));

                let _ = tx.blocking_send(path);
            }
        })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;
        tracing::debug!(root = %root.display(), "watching for changes");

        Ok((Self { _watcher: watcher }, rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(extra: &[&str]) -> IgnoreRules {
        let extra: Vec<String> = extra.iter().map(|s| s.to_string()).collect();
        IgnoreRules::new(
            PathBuf::from("/project"),
            PathBuf::from("/project/dist"),
            &extra,
        )
    }

    #[test]
    fn ignores_output_directory() {
        let rules = rules(&[]);
        assert!(rules.should_ignore(Path::new("/project/dist/index.html")));
        assert!(!rules.should_ignore(Path::new("/project/src/main.ts")));
    }

    #[test]
    fn ignores_node_modules_and_hidden() {
        let rules = rules(&[]);
        assert!(rules.should_ignore(Path::new("/project/node_modules/preact/index.js")));
        assert!(rules.should_ignore(Path::new("/project/.git/HEAD")));
        assert!(rules.should_ignore(Path::new("/project/src/.cache/x.js")));
    }

    #[test]
    fn extra_patterns_apply() {
        let rules = rules(&["*.log", "tmp"]);
        assert!(rules.should_ignore(Path::new("/project/debug.log")));
        assert!(rules.should_ignore(Path::new("/project/tmp/scratch.ts")));
        assert!(!rules.should_ignore(Path::new("/project/src/app.ts")));
    }

    #[test]
    fn ignores_outside_root() {
        assert!(rules(&[]).should_ignore(Path::new("/other/file.js")));
    }

    #[test]
    fn missing_root_is_an_error() {
        let rules = IgnoreRules::new(
            PathBuf::from("/definitely/not/a/dir"),
            PathBuf::from("/definitely/not/a/dir/dist"),
            &[],
        );
        let err = FileWatcher::new(rules, Duration::from_millis(10)).err();
        assert!(matches!(err, Some(Error::WatchRootMissing(_))));
    }
}
