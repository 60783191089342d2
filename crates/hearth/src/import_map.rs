//! Prefix-based specifier redirection.

use std::path::PathBuf;

use indexmap::IndexMap;
use path_clean::PathClean;

use crate::resolve::is_url;

/// Ordered specifier-prefix → replacement map.
///
/// Lookup walks the entries in insertion order and the first prefix of the
/// specifier wins, even when a later entry would match more of it.
/// Filesystem replacements are relative to `base_dir`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportMap {
    base_dir: PathBuf,
    imports: IndexMap<String, String>,
}

impl ImportMap {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            imports: IndexMap::new(),
        }
    }

    pub fn from_imports(base_dir: impl Into<PathBuf>, imports: IndexMap<String, String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            imports,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_entry(
        mut self,
        prefix: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        self.imports.insert(prefix.into(), replacement.into());
        self
    }

    #[cfg(test)]
    pub(crate) fn base_dir(&self) -> &std::path::Path {
        &self.base_dir
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.imports.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.imports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }

    /// Redirect `specifier`, or `None` when no prefix applies.
    ///
    /// A URL replacement is concatenated with the rest of the specifier. A path
    /// replacement is joined as `base_dir / replacement / rest` and cleaned; an
    /// absolute replacement ignores `base_dir`.
    pub fn resolve(&self, specifier: &str) -> Option<String> {
        let (prefix, replacement) = self
            .iter()
            .find(|(prefix, _)| specifier.starts_with(*prefix))?;
        let rest = &specifier[prefix.len()..];

        if is_url(replacement) {
            return Some(format!("{replacement}{rest}"));
        }

        let mut path = self.base_dir.join(replacement);
        let rest = rest.trim_start_matches('/');
        if !rest.is_empty() {
            path.push(rest);
        }
        Some(path.clean().to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_joins_onto_map_directory() {
        let map = ImportMap::new("/project").with_entry("@app/", "./src/");
        assert_eq!(
            map.resolve("@app/widgets/button.ts").as_deref(),
            Some("/project/src/widgets/button.ts")
        );
    }

    #[test]
    fn first_matching_prefix_wins_over_longer_one() {
        let map = ImportMap::new("/project")
            .with_entry("@app/", "./src/")
            .with_entry("@app/widgets/", "./vendor/widgets/");
        assert_eq!(
            map.resolve("@app/widgets/button.ts").as_deref(),
            Some("/project/src/widgets/button.ts")
        );
    }

    #[test]
    fn exact_specifier_maps_to_file() {
        let map = ImportMap::new("/project").with_entry("theme", "./styles/theme.css");
        assert_eq!(
            map.resolve("theme").as_deref(),
            Some("/project/styles/theme.css")
        );
    }

    #[test]
    fn url_replacements_are_concatenated() {
        let map = ImportMap::new("/project").with_entry("preact", "https://esm.sh/preact");
        assert_eq!(
            map.resolve("preact/hooks").as_deref(),
            Some("https://esm.sh/preact/hooks")
        );
    }

    #[test]
    fn absolute_replacement_ignores_base() {
        let map = ImportMap::new("/project").with_entry("~/", "/opt/shared/");
        assert_eq!(map.resolve("~/a.css").as_deref(), Some("/opt/shared/a.css"));
    }

    #[test]
    fn unmatched_specifier_defers() {
        let map = ImportMap::new("/project").with_entry("@app/", "./src/");
        assert!(map.resolve("react").is_none());
        assert!(ImportMap::default().resolve("anything").is_none());
    }
}
