//! Document version tracking keyed by snapshot identity
//!
//! Derived artifacts (generated output, diagnostics) are computed from a
//! particular [`DocumentSnapshot`]. To tell whether such an artifact is stale,
//! request handlers need the editor version that snapshot corresponds to.
//! Snapshots are recreated on every edit and every structural project change,
//! so the lookup has to be by snapshot identity rather than by path: two
//! snapshots of the same path can be live at once and carry different
//! versions.
//!
//! The cache only holds [`Weak`] references. Being remembered here never keeps
//! a superseded snapshot alive, and an entry whose snapshot has been dropped
//! simply stops matching.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Weak;

use parking_lot::RwLock;
use psync_source::DocumentPath;
use rustc_hash::FxHashMap;

use crate::document::DocumentSnapshot;

/// Number of versions remembered per document.
pub const DEFAULT_CAPACITY: usize = 20;

#[derive(Debug)]
struct DocumentEntry {
    document: Weak<DocumentSnapshot>,
    version: i32,
}

/// Bounded per-document history of `(snapshot, version)` pairs.
///
/// Safe to share between threads: lookups take a shared lock, tracking and
/// eviction take an exclusive one, and no lock is held beyond a single map
/// operation.
#[derive(Debug)]
pub struct VersionCache {
    capacity: usize,
    entries: RwLock<FxHashMap<DocumentPath, VecDeque<DocumentEntry>>>,
}

impl VersionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a cache remembering `capacity` versions per document.
    ///
    /// ## Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "VersionCache capacity must be at least 1");
        Self {
            capacity,
            entries: RwLock::new(FxHashMap::default()),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remember that `document` corresponds to `version`.
    ///
    /// Once a document has `capacity` entries the oldest one is dropped before
    /// the new one is appended.
    pub fn track_version(&self, document: &Arc<DocumentSnapshot>, version: i32) {
        let mut entries = self.entries.write();
        let history = entries.entry(document.path().clone()).or_default();
        while history.len() >= self.capacity {
            history.pop_front();
        }
        history.push_back(DocumentEntry {
            document: Arc::downgrade(document),
            version,
        });
    }

    /// The version `document` was tracked at, newest first.
    ///
    /// `None` when the path is unknown or none of its live entries is this
    /// exact snapshot. That is the normal outcome for a snapshot that was never
    /// tracked or has been superseded.
    #[must_use]
    pub fn try_get_version(&self, document: &Arc<DocumentSnapshot>) -> Option<i32> {
        let entries = self.entries.read();
        entries
            .get(document.path())?
            .iter()
            .rev()
            .find(|entry| {
                entry
                    .document
                    .upgrade()
                    .is_some_and(|live| Arc::ptr_eq(&live, document))
            })
            .map(|entry| entry.version)
    }

    /// Version of the newest entry for `path`, live or not.
    #[must_use]
    pub fn latest_version(&self, path: &DocumentPath) -> Option<i32> {
        let entries = self.entries.read();
        entries.get(path)?.back().map(|entry| entry.version)
    }

    /// Forget everything about `path`.
    pub fn evict(&self, path: &DocumentPath) -> bool {
        self.entries.write().remove(path).is_some()
    }

    /// Versions remembered for `path`, oldest first.
    #[must_use]
    pub fn versions(&self, path: &DocumentPath) -> Vec<i32> {
        let entries = self.entries.read();
        entries
            .get(path)
            .map(|history| history.iter().map(|entry| entry.version).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn entry_count(&self, path: &DocumentPath) -> usize {
        self.entries.read().get(path).map_or(0, VecDeque::len)
    }

    /// Number of paths with a history.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for VersionCache {
    fn default() -> Self {
        Self::new()
    }
}
