//! Default specifier resolution.

use std::path::Path;

use path_clean::PathClean;

/// `http://` or `https://` reference.
pub fn is_url(specifier: &str) -> bool {
    specifier.starts_with("http://") || specifier.starts_with("https://")
}

pub fn is_data_uri(specifier: &str) -> bool {
    specifier.starts_with("data:")
}

/// A reference that is already fully resolved and never touches the filesystem.
pub fn is_external_reference(specifier: &str) -> bool {
    is_url(specifier) || is_data_uri(specifier)
}

/// Resolve `specifier` without consulting any import map.
///
/// URLs and data URIs resolve to themselves, absolute paths are cleaned,
/// everything else is joined onto the importer's directory or, without an
/// importer, onto `resolve_dir`.
pub fn default_resolve(specifier: &str, importer: Option<&Path>, resolve_dir: &Path) -> String {
    if is_external_reference(specifier) {
        return specifier.to_string();
    }

    let path = Path::new(specifier);
    let resolved = if path.is_absolute() {
        path.clean()
    } else {
        let base = importer.and_then(Path::parent).unwrap_or(resolve_dir);
        base.join(path).clean()
    };
    resolved.to_string_lossy().into_owned()
}
