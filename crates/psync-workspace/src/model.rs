//! The project model interface
//!
//! The reconciler and the coordinator never mutate projects directly. They go
//! through [`ProjectModel`], which owns the projects and their document
//! snapshots and reports every mutation on a change channel as a
//! [`ProjectChangeEvent`].

use std::sync::Arc;

use psync_source::DocumentPath;

use crate::document::ContentLoader;
use crate::document::DocumentDescriptor;
use crate::document::DocumentSnapshot;
use crate::project::ProjectKey;
use crate::project::ProjectSnapshot;

/// Notification emitted by a [`ProjectModel`] after it changed.
#[derive(Clone, Debug)]
pub enum ProjectChangeEvent {
    /// A document's content or open state changed.
    DocumentChanged {
        project: ProjectKey,
        path: DocumentPath,
        /// Set when the change is the document being closed in the editor
        closing: bool,
    },
    /// A project was added, or its membership changed.
    ProjectChanged { project: ProjectKey },
    /// A project was removed; `documents` are the snapshots it owned.
    ProjectRemoved {
        project: ProjectKey,
        documents: Vec<Arc<DocumentSnapshot>>,
    },
}

/// Mutation and query primitives of the project model.
///
/// Implementations are single-owner: every `&mut self` method must only be
/// called from the serialized execution context that owns the model.
pub trait ProjectModel {
    /// All existing projects, the miscellaneous project included, in order.
    fn projects(&self) -> Vec<ProjectKey>;

    fn project(&self, project: &ProjectKey) -> Option<Arc<ProjectSnapshot>>;

    fn project_exists(&self, project: &ProjectKey) -> bool {
        self.project(project).is_some()
    }

    /// Register a configured project. Returns `false` if it already existed.
    fn add_project(&mut self, path: DocumentPath) -> bool;

    /// Drop a configured project and its documents.
    ///
    /// Returns the removed snapshot, or `None` if the project did not exist.
    fn remove_project(&mut self, path: &DocumentPath) -> Option<Arc<ProjectSnapshot>>;

    /// Document paths owned by `project`, empty if the project does not exist.
    fn document_paths(&self, project: &ProjectKey) -> Vec<DocumentPath> {
        self.project(project)
            .map(|snapshot| snapshot.document_paths().cloned().collect())
            .unwrap_or_default()
    }

    fn get_document(
        &self,
        project: &ProjectKey,
        path: &DocumentPath,
    ) -> Option<Arc<DocumentSnapshot>> {
        self.project(project)?.document(path).cloned()
    }

    /// Every project that currently owns `path`.
    fn owners_of(&self, path: &DocumentPath) -> Vec<ProjectKey> {
        self.projects()
            .into_iter()
            .filter(|project| self.get_document(project, path).is_some())
            .collect()
    }

    fn owner_of(&self, path: &DocumentPath) -> Option<ProjectKey> {
        self.owners_of(path).into_iter().next()
    }

    /// Add a document to `project`.
    ///
    /// Returns the new snapshot, or `None` when the project does not exist or
    /// already contains the document.
    fn add_document(
        &mut self,
        project: &ProjectKey,
        descriptor: DocumentDescriptor,
        loader: ContentLoader,
    ) -> Option<Arc<DocumentSnapshot>>;

    /// Remove a document from `project`, returning its last snapshot.
    fn remove_document(
        &mut self,
        project: &ProjectKey,
        path: &DocumentPath,
    ) -> Option<Arc<DocumentSnapshot>>;

    /// Replace a document's text, returning the new snapshot.
    fn update_document_content(
        &mut self,
        project: &ProjectKey,
        path: &DocumentPath,
        text: Arc<str>,
    ) -> Option<Arc<DocumentSnapshot>>;

    fn open_document(&mut self, path: &DocumentPath);

    fn close_document(&mut self, path: &DocumentPath);

    fn is_document_open(&self, path: &DocumentPath) -> bool;
}
