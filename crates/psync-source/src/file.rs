use camino::Utf8Path;
use serde::Deserialize;
use serde::Serialize;

/// Classification of a document, used to decide how its generated output is
/// produced.
///
/// Two descriptors for the same path with a different [`FileKind`] are
/// structurally different, so a kind change alone is enough to re-register a
/// document with its project.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileKind {
    /// Plain markup template
    Template,
    /// Reusable component definition
    Component,
    /// Shared imports applied to every document in the same directory
    Import,
    /// Anything else
    Other,
}

impl FileKind {
    /// Determine [`FileKind`] from a file path.
    ///
    /// `_imports.*` files are imports regardless of extension.
    #[must_use]
    pub fn from_path(path: &Utf8Path) -> Self {
        if path
            .file_stem()
            .is_some_and(|stem| stem.eq_ignore_ascii_case("_imports"))
        {
            return FileKind::Import;
        }

        match path.extension() {
            Some("html" | "htm" | "tmpl") => FileKind::Template,
            Some("component" | "cmp") => FileKind::Component,
            _ => FileKind::Other,
        }
    }
}
