mod document;
mod memory;
mod model;
mod project;
mod versions;

pub use document::ContentLoader;
pub use document::DocumentDescriptor;
pub use document::DocumentSnapshot;
pub use memory::InMemoryProjectModel;
pub use model::ProjectChangeEvent;
pub use model::ProjectModel;
pub use project::ProjectKey;
pub use project::ProjectSnapshot;
pub use versions::VersionCache;
pub use versions::DEFAULT_CAPACITY;

pub use psync_source::DocumentPath;
pub use psync_source::FileKind;
