use std::sync::Arc;

use psync_conf::Settings;
use psync_workspace::DocumentDescriptor;
use psync_workspace::DocumentPath;
use psync_workspace::ProjectChangeEvent;
use psync_workspace::ProjectKey;
use psync_workspace::ProjectModel;
use psync_workspace::VersionCache;
use tokio::sync::mpsc;

use crate::coordinator::SyncCoordinator;
use crate::queue::Queue;
use crate::queue::ServiceError;

/// Handle to a [`SyncCoordinator`] running on its own [`Queue`].
///
/// Editor notifications are forwarded to the coordinator in the order they
/// are received. The version cache is shared directly, so version lookups do
/// not go through the queue.
pub struct SyncService<M> {
    queue: Queue<SyncCoordinator<M>>,
    versions: Arc<VersionCache>,
}

impl<M: ProjectModel + Send + 'static> SyncService<M> {
    /// Start a coordinator for `model` on a new queue.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        model: M,
        events: mpsc::UnboundedReceiver<ProjectChangeEvent>,
        settings: &Settings,
    ) -> Self {
        let versions = Arc::new(VersionCache::with_capacity(
            settings.version_cache_capacity,
        ));
        let coordinator = SyncCoordinator::new(model, events, Arc::clone(&versions));
        tracing::debug!(
            version_cache_capacity = settings.version_cache_capacity,
            queue_capacity = settings.queue_capacity,
            "Starting sync service"
        );

        Self {
            queue: Queue::new(coordinator, settings.queue_capacity),
            versions,
        }
    }

    #[must_use]
    pub fn version_cache(&self) -> &Arc<VersionCache> {
        &self.versions
    }

    pub async fn open_document(
        &self,
        path: DocumentPath,
        text: Arc<str>,
        version: i32,
    ) -> Result<(), ServiceError> {
        self.queue
            .execute(move |coordinator| coordinator.open_document(path, text, version))
            .await
    }

    pub async fn change_document(
        &self,
        path: DocumentPath,
        text: Arc<str>,
        version: i32,
    ) -> Result<(), ServiceError> {
        self.queue
            .execute(move |coordinator| coordinator.change_document(&path, text, version))
            .await
    }

    pub async fn close_document(&self, path: DocumentPath) -> Result<(), ServiceError> {
        self.queue
            .execute(move |coordinator| coordinator.close_document(&path))
            .await
    }

    pub async fn configure_project(
        &self,
        path: DocumentPath,
        documents: Vec<DocumentDescriptor>,
    ) -> Result<(), ServiceError> {
        self.queue
            .execute(move |coordinator| coordinator.configure_project(path, documents))
            .await
    }

    pub async fn remove_project(&self, path: DocumentPath) -> Result<(), ServiceError> {
        self.queue
            .execute(move |coordinator| coordinator.remove_project(&path))
            .await
    }

    pub async fn owner_of(&self, path: DocumentPath) -> Result<Option<ProjectKey>, ServiceError> {
        self.queue
            .execute(move |coordinator| coordinator.owner_of(&path))
            .await
    }

    /// Run `f` against the coordinator on its queue and return the result.
    pub async fn with_coordinator<F, R>(&self, f: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut SyncCoordinator<M>) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.queue.execute(f).await
    }
}

impl<M> Clone for SyncService<M> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            versions: Arc::clone(&self.versions),
        }
    }
}
