use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use psync_source::DocumentPath;
use serde::Serialize;
use serde::Serializer;

use crate::document::DocumentSnapshot;

/// Identity of a project.
///
/// The miscellaneous project has no backing configuration and therefore no
/// path; every configured project is identified by its project file path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProjectKey {
    Miscellaneous,
    Configured(DocumentPath),
}

impl ProjectKey {
    #[must_use]
    pub fn is_miscellaneous(&self) -> bool {
        matches!(self, ProjectKey::Miscellaneous)
    }

    #[must_use]
    pub fn path(&self) -> Option<&DocumentPath> {
        match self {
            ProjectKey::Miscellaneous => None,
            ProjectKey::Configured(path) => Some(path),
        }
    }
}

impl From<DocumentPath> for ProjectKey {
    fn from(path: DocumentPath) -> Self {
        ProjectKey::Configured(path)
    }
}

impl fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectKey::Miscellaneous => f.write_str("<miscellaneous>"),
            ProjectKey::Configured(path) => fmt::Display::fmt(path, f),
        }
    }
}

impl Serialize for ProjectKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Immutable view of one project's document membership.
#[derive(Clone, Debug)]
pub struct ProjectSnapshot {
    key: ProjectKey,
    documents: BTreeMap<DocumentPath, Arc<DocumentSnapshot>>,
}

impl ProjectSnapshot {
    #[must_use]
    pub fn new(key: ProjectKey) -> Self {
        Self {
            key,
            documents: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &ProjectKey {
        &self.key
    }

    #[must_use]
    pub fn document(&self, path: &DocumentPath) -> Option<&Arc<DocumentSnapshot>> {
        self.documents.get(path)
    }

    #[must_use]
    pub fn contains(&self, path: &DocumentPath) -> bool {
        self.documents.contains_key(path)
    }

    /// Document paths in normalized order.
    pub fn document_paths(&self) -> impl Iterator<Item = &DocumentPath> {
        self.documents.keys()
    }

    pub fn documents(&self) -> impl Iterator<Item = &Arc<DocumentSnapshot>> {
        self.documents.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub(crate) fn insert(&mut self, document: Arc<DocumentSnapshot>) {
        self.documents.insert(document.path().clone(), document);
    }

    pub(crate) fn remove(&mut self, path: &DocumentPath) -> Option<Arc<DocumentSnapshot>> {
        self.documents.remove(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentDescriptor;

    #[test]
    fn test_miscellaneous_sorts_first() {
        let mut keys = vec![
            ProjectKey::Configured(DocumentPath::new("/w/app.proj")),
            ProjectKey::Miscellaneous,
        ];
        keys.sort();
        assert_eq!(keys[0], ProjectKey::Miscellaneous);
    }

    #[test]
    fn test_display() {
        assert_eq!(ProjectKey::Miscellaneous.to_string(), "<miscellaneous>");
        assert_eq!(
            ProjectKey::from(DocumentPath::new("/w/app.proj")).to_string(),
            "/w/app.proj"
        );
    }

    #[test]
    fn test_membership_uses_normalized_paths() {
        let mut project = ProjectSnapshot::new(ProjectKey::Miscellaneous);
        project.insert(DocumentSnapshot::new(
            DocumentDescriptor::new("/W/Page.html", "Page.html", None),
            Arc::from(""),
        ));

        assert!(project.contains(&DocumentPath::new("/w/page.html")));
        assert_eq!(project.len(), 1);
    }
}
