//! Output classification by extension suffix.

/// What kind of tag an output file gets in the HTML shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MimeClass {
    Script,
    Stylesheet,
}

static MIME_TABLE: &[(&str, MimeClass)] = &[
    (".js", MimeClass::Script),
    (".css", MimeClass::Stylesheet),
];

/// The full trailing run of dot-segments of the file name.
///
/// `dist/app.js` → `.js`, `dist/app.min.js` → `.min.js`, `dist/LICENSE` → ``.
pub fn extension_suffix(path: &str) -> &str {
    let name_start = path.rfind(['/', '\\']).map_or(0, |i| i + 1);
    let name = &path[name_start..];
    for (i, _) in name.match_indices('.') {
        if name[i + 1..].split('.').all(|segment| !segment.is_empty()) {
            return &name[i..];
        }
    }
    ""
}

/// Class of an output path, or `None` for anything the shell ignores.
pub fn classify(path: &str) -> Option<MimeClass> {
    let suffix = extension_suffix(path);
    MIME_TABLE
        .iter()
        .find(|(ext, _)| *ext == suffix)
        .map(|(_, class)| *class)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_is_full_dot_run() {
        assert_eq!(extension_suffix("/dist/main.js"), ".js");
        assert_eq!(extension_suffix("/dist/app.min.js"), ".min.js");
        assert_eq!(extension_suffix("/dist.v2/main"), "");
        assert_eq!(extension_suffix("a..js"), ".js");
        assert_eq!(extension_suffix("C:\\out\\main.css"), ".css");
        assert_eq!(extension_suffix("trailing."), "");
    }

    #[test]
    fn classifies_known_suffixes_only() {
        assert_eq!(classify("/dist/main.js"), Some(MimeClass::Script));
        assert_eq!(classify("/dist/main.css"), Some(MimeClass::Stylesheet));
        assert_eq!(classify("/dist/main.js.map"), None);
        assert_eq!(classify("/dist/app.min.js"), None);
        assert_eq!(classify("/dist/logo.svg"), None);
    }
}
