//! Scoped stylesheets (`local-css`) via lightningcss CSS modules.
//!
//! A scoped stylesheet becomes two modules: a virtual stylesheet holding the
//! rewritten CSS, and a JS module that imports it and default-exports the
//! original → scoped class-name map.

use std::collections::BTreeMap;
use std::path::Path;

use lightningcss::css_modules::{self, CssModuleReference};
use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{ParserOptions, StyleSheet};

use crate::error::{Error, Result};

/// Prefix of the virtual module ids holding rewritten CSS.
pub const SCOPED_PREFIX: &str = "\0hearth-scoped:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedStylesheet {
    pub css: String,
    /// Original class name → space-separated scoped names, sorted by original name.
    pub exports: BTreeMap<String, String>,
}

pub fn scoped_id(path: &str) -> String {
    format!("{SCOPED_PREFIX}{path}")
}

pub fn is_scoped_id(id: &str) -> bool {
    id.starts_with(SCOPED_PREFIX)
}

/// Rewrite the class names of `source` so they are unique to `path`.
pub fn scope_stylesheet(path: &Path, source: &str) -> Result<ScopedStylesheet> {
    let filename = path.to_string_lossy().into_owned();
    let stylesheet = StyleSheet::parse(
        source,
        ParserOptions {
            filename: filename.clone(),
            css_modules: Some(css_modules::Config::default()),
            ..Default::default()
        },
    )
    .map_err(|e| Error::Stylesheet {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let printed = stylesheet
        .to_css(PrinterOptions::default())
        .map_err(|e| Error::Stylesheet {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let mut exports = BTreeMap::new();
    for (name, export) in printed.exports.unwrap_or_default() {
        let mut names = vec![export.name];
        for reference in export.composes {
            match reference {
                CssModuleReference::Local { name } | CssModuleReference::Global { name } => {
                    names.push(name)
                }
                CssModuleReference::Dependency { name, specifier } => {
                    tracing::debug!(%name, %specifier, file = %filename, "skipping cross-file composes");
                }
            }
        }
        exports.insert(name, names.join(" "));
    }

    Ok(ScopedStylesheet {
        css: printed.code,
        exports,
    })
}

/// The JS facade of a scoped stylesheet stored under `virtual_id`.
pub fn module_source(virtual_id: &str, exports: &BTreeMap<String, String>) -> String {
    let specifier = serde_json::to_string(virtual_id).unwrap_or_default();
    let map = serde_json::to_string(exports).unwrap_or_else(|_| "{}".to_string());
    format!("import {specifier};\nexport default {map};\n")
}

/// A JS module default-exporting `text`.
pub fn text_module(text: &str) -> String {
    let literal = serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string());
    format!("export default {literal};\n")
}
