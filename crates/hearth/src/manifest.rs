//! Build results and the output manifest.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One produced output file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputMeta {
    pub bytes: u64,
    /// Logical inputs that contributed to this output.
    pub inputs: IndexMap<String, InputMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputMeta {
    pub bytes_in_output: u64,
}

/// Output path → metadata, in engine emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputManifest {
    pub outputs: IndexMap<String, OutputMeta>,
}

impl OutputManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, meta: OutputMeta) {
        self.outputs.insert(path.into(), meta);
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.outputs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

/// What end hooks receive after a rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
    /// Monotonically increasing per context; the first build is 1.
    pub generation: u64,
    /// Absent when the build failed.
    pub manifest: Option<OutputManifest>,
    pub errors: Vec<String>,
}

impl BuildResult {
    pub fn success(generation: u64, manifest: OutputManifest) -> Self {
        Self {
            generation,
            manifest: Some(manifest),
            errors: Vec::new(),
        }
    }

    pub fn failure(generation: u64, errors: Vec<String>) -> Self {
        Self {
            generation,
            manifest: None,
            errors,
        }
    }

    pub fn is_success(&self) -> bool {
        self.manifest.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_keeps_emission_order() {
        let mut manifest = OutputManifest::new();
        manifest.insert("/dist/z.js", OutputMeta::default());
        manifest.insert("/dist/a.css", OutputMeta::default());
        assert_eq!(manifest.paths().collect::<Vec<_>>(), vec!["/dist/z.js", "/dist/a.css"]);
    }

    #[test]
    fn manifest_uses_metafile_field_names() {
        let mut manifest = OutputManifest::new();
        let mut meta = OutputMeta {
            bytes: 10,
            entry_point: Some("src/main.ts".into()),
            ..Default::default()
        };
        meta.inputs
            .insert("src/main.ts".into(), InputMeta { bytes_in_output: 10 });
        manifest.insert("dist/main.js", meta);

        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["outputs"]["dist/main.js"]["entryPoint"], "src/main.ts");
        assert_eq!(
            json["outputs"]["dist/main.js"]["inputs"]["src/main.ts"]["bytesInOutput"],
            10
        );
    }

    #[test]
    fn failure_has_no_manifest() {
        let result = BuildResult::failure(3, vec!["oops".into()]);
        assert!(!result.is_success());
        assert_eq!(result.generation, 3);
    }
}
