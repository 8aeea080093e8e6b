//! Project reconciliation
//!
//! [`reconcile`] compares what a project currently owns with the canonical
//! document list from its configuration and produces the structural actions
//! that bring the two in line. [`apply`] then pushes those actions through the
//! [`ProjectModel`].
//!
//! Documents are never dropped on the floor: a document a project no longer
//! lists is moved to the miscellaneous project, and a listed document that
//! the miscellaneous project is holding is moved back out of it.

use std::collections::hash_map::Entry;
use std::fmt;

use psync_workspace::ContentLoader;
use psync_workspace::DocumentDescriptor;
use psync_workspace::DocumentPath;
use psync_workspace::ProjectKey;
use psync_workspace::ProjectModel;
use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;

/// A structural change to the project model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProjectAction {
    /// Create a document in `project`.
    Add {
        project: ProjectKey,
        document: DocumentDescriptor,
        loader: ContentLoader,
    },
    /// Re-register a document under a new descriptor, keeping its project.
    Update {
        project: ProjectKey,
        document: DocumentDescriptor,
    },
    /// Transfer a document between projects, keeping its content.
    ///
    /// `document` is the descriptor it is registered with in `to`.
    Move {
        from: ProjectKey,
        to: ProjectKey,
        document: DocumentDescriptor,
    },
    /// Delete a document from `project`.
    Remove {
        project: ProjectKey,
        path: DocumentPath,
    },
}

impl ProjectAction {
    #[must_use]
    pub fn path(&self) -> &DocumentPath {
        match self {
            ProjectAction::Add { document, .. }
            | ProjectAction::Update { document, .. }
            | ProjectAction::Move { document, .. } => document.path(),
            ProjectAction::Remove { path, .. } => path,
        }
    }
}

impl fmt::Display for ProjectAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectAction::Add {
                project, document, ..
            } => write!(f, "add {} to {project}", document.path()),
            ProjectAction::Update { project, document } => {
                write!(f, "update {} in {project}", document.path())
            }
            ProjectAction::Move { from, to, document } => {
                write!(f, "move {} from {from} to {to}", document.path())
            }
            ProjectAction::Remove { project, path } => write!(f, "remove {path} from {project}"),
        }
    }
}

/// Compute the actions that make `project` own exactly `canonical`.
///
/// Actions come out in three groups, in this order:
///
/// 1. documents `project` owns but `canonical` no longer lists move to the
///    miscellaneous project;
/// 2. documents in both whose target path or kind changed are updated;
/// 3. documents `canonical` lists but `project` does not own are moved out of
///    the miscellaneous project, or added when no project owns them.
///
/// Everything is computed against the model as it is now; nothing is applied.
/// A listed document owned by another configured project is left where it is.
/// Documents that disappear while being inspected are skipped; the next
/// reconciliation picks up whatever is left.
///
/// ## Panics
///
/// Panics if `project` is the miscellaneous project, which has no canonical
/// document list to reconcile against.
pub fn reconcile<M: ProjectModel + ?Sized>(
    model: &M,
    project: &ProjectKey,
    canonical: &[DocumentDescriptor],
) -> Vec<ProjectAction> {
    assert!(
        !project.is_miscellaneous(),
        "the miscellaneous project cannot be reconciled"
    );

    if !model.project_exists(project) {
        tracing::info!(%project, "Project not found, nothing to reconcile");
        return Vec::new();
    }

    let mut wanted: FxHashMap<&DocumentPath, &DocumentDescriptor> = FxHashMap::default();
    let mut wanted_order = Vec::with_capacity(canonical.len());
    for document in canonical {
        match wanted.entry(document.path()) {
            Entry::Vacant(slot) => {
                slot.insert(document);
                wanted_order.push(document);
            }
            Entry::Occupied(_) => {
                tracing::debug!(path = %document.path(), "Ignoring duplicate canonical document");
            }
        }
    }

    let current = model.document_paths(project);
    let owned: FxHashSet<&DocumentPath> = current.iter().collect();
    let miscellaneous = ProjectKey::Miscellaneous;
    let mut actions = Vec::new();

    for path in &current {
        if wanted.contains_key(path) {
            continue;
        }
        let Some(existing) = model.get_document(project, path) else {
            tracing::info!(%path, %project, "Document vanished before demotion, skipping");
            continue;
        };
        actions.push(ProjectAction::Move {
            from: project.clone(),
            to: miscellaneous.clone(),
            document: DocumentDescriptor::miscellaneous(
                existing.path().clone(),
                existing.descriptor().declared_kind(),
            ),
        });
    }

    for path in &current {
        let Some(&document) = wanted.get(path) else {
            continue;
        };
        let Some(existing) = model.get_document(project, path) else {
            tracing::info!(%path, %project, "Document vanished before update, skipping");
            continue;
        };
        if !existing.descriptor().same_shape(document) {
            actions.push(ProjectAction::Update {
                project: project.clone(),
                document: document.clone(),
            });
        }
    }

    for &document in &wanted_order {
        let path = document.path();
        if owned.contains(path) {
            continue;
        }
        if model.get_document(&miscellaneous, path).is_some() {
            actions.push(ProjectAction::Move {
                from: miscellaneous.clone(),
                to: project.clone(),
                document: document.clone(),
            });
            continue;
        }
        match model.owner_of(path) {
            Some(owner) => {
                tracing::info!(%path, %project, %owner, "Document claimed by another project, skipping");
            }
            None => actions.push(ProjectAction::Add {
                project: project.clone(),
                document: document.clone(),
                loader: ContentLoader::File(path.as_path().to_path_buf()),
            }),
        }
    }

    tracing::debug!(%project, count = actions.len(), "Reconciled project");
    actions
}

/// Apply `actions` to `model` in order, returning how many took effect.
///
/// Each action is one call sequence against the model. A move is a remove
/// from the source followed by an add to the destination; both happen under
/// the same exclusive borrow, so nothing can observe the document in between.
/// Actions whose document or project is gone by the time they run are skipped.
pub fn apply<M: ProjectModel + ?Sized>(model: &mut M, actions: &[ProjectAction]) -> usize {
    let mut applied = 0;
    for action in actions {
        if apply_one(model, action) {
            tracing::debug!(%action, "Applied project action");
            applied += 1;
        } else {
            tracing::info!(%action, "Skipped project action");
        }
    }
    applied
}

fn apply_one<M: ProjectModel + ?Sized>(model: &mut M, action: &ProjectAction) -> bool {
    match action {
        ProjectAction::Add {
            project,
            document,
            loader,
        } => model
            .add_document(project, document.clone(), loader.clone())
            .is_some(),
        ProjectAction::Update { project, document } => {
            let Some(previous) = model.remove_document(project, document.path()) else {
                return false;
            };
            model
                .add_document(
                    project,
                    document.clone(),
                    ContentLoader::from_snapshot(&previous),
                )
                .is_some()
        }
        ProjectAction::Move { from, to, document } => {
            let path = document.path();
            if !model.project_exists(to) || model.get_document(to, path).is_some() {
                return false;
            }
            let Some(previous) = model.remove_document(from, path) else {
                return false;
            };
            if model
                .add_document(to, document.clone(), ContentLoader::from_snapshot(&previous))
                .is_some()
            {
                return true;
            }
            tracing::error!(%path, %from, %to, "Destination rejected moved document, restoring");
            model.add_document(
                from,
                previous.descriptor().clone(),
                ContentLoader::from_snapshot(&previous),
            );
            false
        }
        ProjectAction::Remove { project, path } => model.remove_document(project, path).is_some(),
    }
}
