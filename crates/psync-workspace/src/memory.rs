//! In-memory [`ProjectModel`]
//!
//! Holds every project as a copy-on-write [`ProjectSnapshot`]: readers get an
//! `Arc` that stays valid while the model keeps mutating its own copy.

use std::sync::Arc;

use psync_source::DocumentPath;
use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;
use tokio::sync::mpsc;

use crate::document::ContentLoader;
use crate::document::DocumentDescriptor;
use crate::document::DocumentSnapshot;
use crate::model::ProjectChangeEvent;
use crate::model::ProjectModel;
use crate::project::ProjectKey;
use crate::project::ProjectSnapshot;

pub struct InMemoryProjectModel {
    projects: FxHashMap<ProjectKey, Arc<ProjectSnapshot>>,
    open: FxHashSet<DocumentPath>,
    events: mpsc::UnboundedSender<ProjectChangeEvent>,
}

impl InMemoryProjectModel {
    /// Create a model containing only the miscellaneous project, together with
    /// the receiving end of its change channel.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProjectChangeEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let mut projects = FxHashMap::default();
        projects.insert(
            ProjectKey::Miscellaneous,
            Arc::new(ProjectSnapshot::new(ProjectKey::Miscellaneous)),
        );

        let model = Self {
            projects,
            open: FxHashSet::default(),
            events,
        };
        (model, receiver)
    }

    fn emit(&self, event: ProjectChangeEvent) {
        tracing::trace!(?event, "Project model changed");
        // Nobody listening is fine; the model stays usable on its own.
        self.events.send(event).ok();
    }

    fn load(loader: ContentLoader) -> Arc<str> {
        match loader {
            ContentLoader::Text(text) => text,
            ContentLoader::File(path) => match std::fs::read_to_string(&path) {
                Ok(text) => Arc::from(text),
                Err(err) => {
                    tracing::debug!(%path, %err, "Could not load document content");
                    Arc::from("")
                }
            },
            ContentLoader::Empty => Arc::from(""),
        }
    }

    fn project_mut(&mut self, project: &ProjectKey) -> Option<&mut ProjectSnapshot> {
        self.projects.get_mut(project).map(Arc::make_mut)
    }
}

impl ProjectModel for InMemoryProjectModel {
    fn projects(&self) -> Vec<ProjectKey> {
        let mut keys: Vec<_> = self.projects.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn project(&self, project: &ProjectKey) -> Option<Arc<ProjectSnapshot>> {
        self.projects.get(project).cloned()
    }

    fn add_project(&mut self, path: DocumentPath) -> bool {
        let key = ProjectKey::Configured(path);
        if self.projects.contains_key(&key) {
            return false;
        }
        self.projects
            .insert(key.clone(), Arc::new(ProjectSnapshot::new(key.clone())));
        self.emit(ProjectChangeEvent::ProjectChanged { project: key });
        true
    }

    fn remove_project(&mut self, path: &DocumentPath) -> Option<Arc<ProjectSnapshot>> {
        let key = ProjectKey::Configured(path.clone());
        let removed = self.projects.remove(&key)?;
        let documents = removed.documents().cloned().collect();
        self.emit(ProjectChangeEvent::ProjectRemoved {
            project: key,
            documents,
        });
        Some(removed)
    }

    fn add_document(
        &mut self,
        project: &ProjectKey,
        descriptor: DocumentDescriptor,
        loader: ContentLoader,
    ) -> Option<Arc<DocumentSnapshot>> {
        if self
            .projects
            .get(project)
            .is_none_or(|snapshot| snapshot.contains(descriptor.path()))
        {
            return None;
        }

        let document = DocumentSnapshot::new(descriptor, Self::load(loader));
        self.project_mut(project)?.insert(Arc::clone(&document));
        self.emit(ProjectChangeEvent::ProjectChanged {
            project: project.clone(),
        });
        Some(document)
    }

    fn remove_document(
        &mut self,
        project: &ProjectKey,
        path: &DocumentPath,
    ) -> Option<Arc<DocumentSnapshot>> {
        if !self.projects.get(project)?.contains(path) {
            return None;
        }

        let removed = self.project_mut(project)?.remove(path)?;
        self.emit(ProjectChangeEvent::ProjectChanged {
            project: project.clone(),
        });
        Some(removed)
    }

    fn update_document_content(
        &mut self,
        project: &ProjectKey,
        path: &DocumentPath,
        text: Arc<str>,
    ) -> Option<Arc<DocumentSnapshot>> {
        let current = self.projects.get(project)?.document(path)?.clone();
        let document = current.with_text(text);
        self.project_mut(project)?.insert(Arc::clone(&document));
        self.emit(ProjectChangeEvent::DocumentChanged {
            project: project.clone(),
            path: path.clone(),
            closing: false,
        });
        Some(document)
    }

    fn open_document(&mut self, path: &DocumentPath) {
        if !self.open.insert(path.clone()) {
            return;
        }
        for project in self.owners_of(path) {
            self.emit(ProjectChangeEvent::DocumentChanged {
                project,
                path: path.clone(),
                closing: false,
            });
        }
    }

    fn close_document(&mut self, path: &DocumentPath) {
        if !self.open.remove(path) {
            return;
        }
        for project in self.owners_of(path) {
            self.emit(ProjectChangeEvent::DocumentChanged {
                project,
                path: path.clone(),
                closing: true,
            });
        }
    }

    fn is_document_open(&self, path: &DocumentPath) -> bool {
        self.open.contains(path)
    }
}
