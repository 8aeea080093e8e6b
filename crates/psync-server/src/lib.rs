mod coordinator;
pub mod logging;
mod queue;
mod reconcile;
mod service;

pub use coordinator::SyncCoordinator;
pub use queue::Queue;
pub use queue::ServiceError;
pub use reconcile::apply;
pub use reconcile::reconcile;
pub use reconcile::ProjectAction;
pub use service::SyncService;
