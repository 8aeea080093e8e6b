//! Keeps the project model, the miscellaneous project, and the version cache
//! consistent with each other.
//!
//! The coordinator owns the project model and the receiving end of its change
//! channel. Every entry point mutates the model, then drains the channel and
//! reacts to what changed until the model is quiet again. All reactions are
//! re-applications of [`reconcile`], so draining always settles.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use psync_workspace::ContentLoader;
use psync_workspace::DocumentDescriptor;
use psync_workspace::DocumentPath;
use psync_workspace::DocumentSnapshot;
use psync_workspace::ProjectChangeEvent;
use psync_workspace::ProjectKey;
use psync_workspace::ProjectModel;
use psync_workspace::VersionCache;
use rustc_hash::FxHashSet;
use tokio::sync::mpsc;

use crate::reconcile::apply;
use crate::reconcile::reconcile;
use crate::reconcile::ProjectAction;

pub struct SyncCoordinator<M> {
    model: M,
    events: mpsc::UnboundedReceiver<ProjectChangeEvent>,
    versions: Arc<VersionCache>,
    /// Canonical document lists of configured projects, by project path
    configurations: BTreeMap<DocumentPath, Vec<DocumentDescriptor>>,
}

impl<M: ProjectModel> SyncCoordinator<M> {
    pub fn new(
        model: M,
        events: mpsc::UnboundedReceiver<ProjectChangeEvent>,
        versions: Arc<VersionCache>,
    ) -> Self {
        Self {
            model,
            events,
            versions,
            configurations: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    #[must_use]
    pub fn version_cache(&self) -> &Arc<VersionCache> {
        &self.versions
    }

    #[must_use]
    pub fn owner_of(&self, path: &DocumentPath) -> Option<ProjectKey> {
        self.model.owner_of(path)
    }

    /// Canonical document list last configured for `project`.
    #[must_use]
    pub fn configuration(&self, project: &DocumentPath) -> Option<&[DocumentDescriptor]> {
        self.configurations.get(project).map(Vec::as_slice)
    }

    /// A document was opened in the editor.
    ///
    /// Documents no project owns are taken in by the miscellaneous project.
    pub fn open_document(&mut self, path: DocumentPath, text: Arc<str>, version: i32) {
        let document = match self.model.owner_of(&path) {
            Some(owner) => self.model.update_document_content(&owner, &path, text),
            None => {
                tracing::debug!(%path, "Opening unowned document in the miscellaneous project");
                let descriptor = DocumentDescriptor::miscellaneous(path.clone(), None);
                self.model.add_document(
                    &ProjectKey::Miscellaneous,
                    descriptor,
                    ContentLoader::Text(text),
                )
            }
        };
        self.model.open_document(&path);

        if let Some(document) = document {
            self.versions.track_version(&document, version);
        }
        self.process_events();
    }

    /// An open document's text changed.
    pub fn change_document(&mut self, path: &DocumentPath, text: Arc<str>, version: i32) {
        let Some(owner) = self.model.owner_of(path) else {
            tracing::warn!(%path, "Change for a document no project owns, ignoring");
            return;
        };
        if let Some(document) = self.model.update_document_content(&owner, path, text) {
            self.versions.track_version(&document, version);
        }
        self.process_events();
    }

    /// A document was closed in the editor.
    pub fn close_document(&mut self, path: &DocumentPath) {
        self.model.close_document(path);
        self.process_events();
    }

    /// A project's configuration changed, or a project appeared.
    ///
    /// Records `documents` as the project's canonical list and reconciles the
    /// project against it.
    pub fn configure_project(&mut self, path: DocumentPath, documents: Vec<DocumentDescriptor>) {
        if self.model.add_project(path.clone()) {
            tracing::info!(project = %path, "Added project");
        }
        self.configurations.insert(path.clone(), documents);
        self.reconcile_project(&ProjectKey::Configured(path));
        self.process_events();
    }

    /// A project went away. Its documents are migrated while handling the
    /// resulting removal event.
    pub fn remove_project(&mut self, path: &DocumentPath) {
        self.configurations.remove(path);
        if self.model.remove_project(path).is_none() {
            tracing::info!(project = %path, "Project not found, nothing to remove");
        }
        self.process_events();
    }

    /// Drain and handle pending change notifications until none are left.
    ///
    /// Repeated `ProjectChanged` notifications for the same project within one
    /// batch are handled once.
    pub fn process_events(&mut self) {
        loop {
            let mut batch = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                batch.push(event);
            }
            if batch.is_empty() {
                return;
            }

            let mut changed = FxHashSet::default();
            for event in batch {
                match event {
                    ProjectChangeEvent::DocumentChanged {
                        project,
                        path,
                        closing,
                    } => self.on_document_changed(&project, &path, closing),
                    ProjectChangeEvent::ProjectChanged { project } => {
                        if changed.insert(project.clone()) {
                            self.on_project_changed(&project);
                        }
                    }
                    ProjectChangeEvent::ProjectRemoved { project, documents } => {
                        self.on_project_removed(&project, documents);
                    }
                }
            }
        }
    }

    fn on_document_changed(&mut self, project: &ProjectKey, path: &DocumentPath, closing: bool) {
        if self.model.is_document_open(path) {
            return;
        }

        if self.versions.evict(path) {
            tracing::debug!(%path, "Evicted versions of closed document");
        }

        // The miscellaneous project only holds a closed document for as long
        // as nothing claims it; once it is closed and unclaimed it has no
        // owner left.
        if closing
            && project.is_miscellaneous()
            && self.model.owner_of(path) == Some(ProjectKey::Miscellaneous)
            && self.claimant(path).is_none()
        {
            apply(
                &mut self.model,
                &[ProjectAction::Remove {
                    project: ProjectKey::Miscellaneous,
                    path: path.clone(),
                }],
            );
        }
    }

    fn on_project_changed(&mut self, project: &ProjectKey) {
        match project {
            ProjectKey::Miscellaneous => self.adopt_from_miscellaneous(),
            ProjectKey::Configured(_) => self.reconcile_project(project),
        }
        self.mark_latest(project);
    }

    fn on_project_removed(&mut self, project: &ProjectKey, documents: Vec<Arc<DocumentSnapshot>>) {
        if let Some(path) = project.path() {
            self.configurations.remove(path);
        }

        let mut actions = Vec::with_capacity(documents.len());
        for orphan in documents {
            if self.model.owner_of(orphan.path()).is_some() {
                continue;
            }
            let (destination, document) = self.claimant(orphan.path()).unwrap_or_else(|| {
                let descriptor = DocumentDescriptor::miscellaneous(
                    orphan.path().clone(),
                    orphan.descriptor().declared_kind(),
                );
                (ProjectKey::Miscellaneous, descriptor)
            });
            actions.push(ProjectAction::Add {
                project: destination,
                document,
                loader: ContentLoader::from_snapshot(&orphan),
            });
        }

        let migrated = apply(&mut self.model, &actions);
        tracing::info!(%project, migrated, "Migrated documents of removed project");
    }

    fn reconcile_project(&mut self, project: &ProjectKey) {
        let Some(documents) = project.path().and_then(|path| self.configurations.get(path)) else {
            return;
        };
        let actions = reconcile(&self.model, project, documents);
        if !actions.is_empty() {
            apply(&mut self.model, &actions);
        }
    }

    /// Hand documents sitting in the miscellaneous project to the configured
    /// projects that list them.
    fn adopt_from_miscellaneous(&mut self) {
        let claimants: BTreeSet<ProjectKey> = self
            .model
            .document_paths(&ProjectKey::Miscellaneous)
            .iter()
            .filter_map(|path| self.claimant(path))
            .map(|(project, _)| project)
            .collect();

        for project in claimants {
            self.reconcile_project(&project);
        }
    }

    /// The first existing configured project whose canonical list has `path`.
    fn claimant(&self, path: &DocumentPath) -> Option<(ProjectKey, DocumentDescriptor)> {
        self.configurations.iter().find_map(|(project, documents)| {
            let key = ProjectKey::Configured(project.clone());
            if !self.model.project_exists(&key) {
                return None;
            }
            documents
                .iter()
                .find(|document| document.path() == path)
                .map(|document| (key, document.clone()))
        })
    }

    /// Carry each document's latest known version over to its current
    /// snapshot, so a structural change never looks like a version regression.
    fn mark_latest(&self, project: &ProjectKey) {
        let Some(snapshot) = self.model.project(project) else {
            return;
        };
        for document in snapshot.documents() {
            let Some(latest) = self.versions.latest_version(document.path()) else {
                continue;
            };
            if self.versions.try_get_version(document) == Some(latest) {
                continue;
            }
            self.versions.track_version(document, latest);
        }
    }
}
