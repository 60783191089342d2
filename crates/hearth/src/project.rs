//! The optional project configuration document.
//!
//! ```json
//! {
//!   "imports": { "@app/": "./src/" },
//!   "compilerOptions": { "jsxImportSource": "preact" }
//! }
//! ```
//!
//! Unknown fields are ignored.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::engine::{JsxConfig, JsxMode, absolutize};
use crate::error::Error;
use crate::import_map::ImportMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectConfig {
    pub imports: IndexMap<String, String>,
    pub compiler_options: CompilerOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerOptions {
    pub jsx_factory: Option<String>,
    pub jsx_fragment_factory: Option<String>,
    pub jsx_import_source: Option<String>,
}

impl CompilerOptions {
    /// Automatic runtime when an import source is set, classic otherwise.
    pub fn jsx(&self) -> JsxConfig {
        let mode = if self.jsx_import_source.is_some() {
            JsxMode::Automatic
        } else {
            JsxMode::Transform
        };
        JsxConfig {
            mode,
            factory: self.jsx_factory.clone(),
            fragment: self.jsx_fragment_factory.clone(),
            import_source: self.jsx_import_source.clone(),
        }
    }
}

/// A parsed configuration document and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDocument {
    pub path: PathBuf,
    pub config: ProjectConfig,
}

impl ProjectDocument {
    /// Read and parse the document at `path`. Both failures are fatal.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| Error::ConfigRead {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(path, &text)
    }

    pub fn parse(path: impl Into<PathBuf>, text: &str) -> Result<Self> {
        let path = path.into();
        let config = serde_json::from_str(text).map_err(|source| Error::ConfigParse {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, config })
    }

    /// The document's `imports`, relative to the document's directory.
    pub fn import_map(&self, working_dir: &Path) -> ImportMap {
        let dir = self.path.parent().unwrap_or(Path::new(""));
        ImportMap::from_imports(absolutize(dir, working_dir), self.config.imports.clone())
    }
}
