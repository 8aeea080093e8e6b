//! Document descriptors and immutable document snapshots
//!
//! A [`DocumentDescriptor`] says which document should exist in a project and
//! how it is classified. A [`DocumentSnapshot`] is one concrete, immutable
//! state of that document. The project model creates a fresh snapshot for every
//! content update and every structural change, so snapshot identity (the `Arc`
//! allocation) is what distinguishes one edit from the next.

use std::sync::Arc;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use psync_source::DocumentPath;
use psync_source::FileKind;

/// Canonical description of a document that should belong to a project.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentDescriptor {
    path: DocumentPath,
    target_path: Utf8PathBuf,
    kind: Option<FileKind>,
}

impl DocumentDescriptor {
    #[must_use]
    pub fn new(
        path: impl Into<DocumentPath>,
        target_path: impl Into<Utf8PathBuf>,
        kind: Option<FileKind>,
    ) -> Self {
        Self {
            path: path.into(),
            target_path: target_path.into(),
            kind,
        }
    }

    /// Descriptor for a document held by the miscellaneous project, which
    /// has no output layout of its own: the document is its own target.
    #[must_use]
    pub fn miscellaneous(path: DocumentPath, kind: Option<FileKind>) -> Self {
        let target_path = path.as_path().to_path_buf();
        Self::new(path, target_path, kind)
    }

    #[must_use]
    pub fn path(&self) -> &DocumentPath {
        &self.path
    }

    /// Path of the generated output, relative to the project.
    #[must_use]
    pub fn target_path(&self) -> &Utf8Path {
        &self.target_path
    }

    /// The explicit kind, if the project configuration supplied one.
    #[must_use]
    pub fn declared_kind(&self) -> Option<FileKind> {
        self.kind
    }

    /// The explicit kind, or the kind inferred from the path.
    #[must_use]
    pub fn kind(&self) -> FileKind {
        self.kind
            .unwrap_or_else(|| FileKind::from_path(self.path.as_path()))
    }

    /// Whether two descriptors would produce the same project registration.
    ///
    /// Only the target path and the effective kind matter; the spelling of
    /// the document path does not.
    #[must_use]
    pub fn same_shape(&self, other: &DocumentDescriptor) -> bool {
        self.target_path == other.target_path && self.kind() == other.kind()
    }
}

/// Where a newly added document gets its text from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentLoader {
    /// Text already in memory, e.g. an open buffer or the previous snapshot
    Text(Arc<str>),
    /// Load from the file system when the document is added
    File(Utf8PathBuf),
    /// No content yet
    Empty,
}

impl ContentLoader {
    /// Carry the text of an existing snapshot over to its replacement.
    #[must_use]
    pub fn from_snapshot(document: &DocumentSnapshot) -> Self {
        Self::Text(document.text_arc())
    }
}

/// Immutable view of one document's state at a point in time.
#[derive(Debug, PartialEq, Eq)]
pub struct DocumentSnapshot {
    descriptor: DocumentDescriptor,
    text: Arc<str>,
}

impl DocumentSnapshot {
    #[must_use]
    pub fn new(descriptor: DocumentDescriptor, text: Arc<str>) -> Arc<Self> {
        Arc::new(Self { descriptor, text })
    }

    /// A new snapshot of the same document with different text.
    #[must_use]
    pub fn with_text(&self, text: Arc<str>) -> Arc<Self> {
        Self::new(self.descriptor.clone(), text)
    }

    #[must_use]
    pub fn descriptor(&self) -> &DocumentDescriptor {
        &self.descriptor
    }

    #[must_use]
    pub fn path(&self) -> &DocumentPath {
        self.descriptor.path()
    }

    #[must_use]
    pub fn target_path(&self) -> &Utf8Path {
        self.descriptor.target_path()
    }

    #[must_use]
    pub fn kind(&self) -> FileKind {
        self.descriptor.kind()
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    fn text_arc(&self) -> Arc<str> {
        Arc::clone(&self.text)
    }
}
