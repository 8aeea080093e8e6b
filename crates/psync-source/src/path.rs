//! Vendored and adapted from `path-clean` crate, <https://github.com/danreeves/path-clean>
//!
//! path-clean LICENSE-MIT:
//! Copyright (c) 2018 Dan Reeves
//!
//! Permission is hereby granted, free of charge, to any person obtaining a copy
//! of this software and associated documentation files (the "Software"), to deal
//! in the Software without restriction, including without limitation the rights
//! to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
//! copies of the Software, and to permit persons to whom the Software is
//! furnished to do so, subject to the following conditions:
//!
//! The above copyright notice and this permission notice shall be included in all
//! copies or substantial portions of the Software.
//!
//! THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
//! IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
//! FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
//! AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
//! LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
//! OUT OF OR IN

use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::path::Component;
use std::sync::Arc;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use serde::Serialize;
use serde::Serializer;

pub fn clean_utf8_path(path: &Utf8Path) -> Utf8PathBuf {
    let mut out = Vec::new();

    for comp in path.as_std_path().components() {
        match comp {
            Component::CurDir => (),
            Component::ParentDir => match out.last() {
                Some(Component::RootDir) => (),
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                None | Some(Component::CurDir | Component::ParentDir | Component::Prefix(_)) => {
                    out.push(comp);
                }
            },
            comp => out.push(comp),
        }
    }

    if out.is_empty() {
        Utf8PathBuf::from(".")
    } else {
        // Components of a UTF-8 path are UTF-8, so this only re-joins them.
        let cleaned: std::path::PathBuf = out.iter().collect();
        Utf8PathBuf::from_path_buf(cleaned)
            .unwrap_or_else(|p| Utf8PathBuf::from(p.to_string_lossy().into_owned()))
    }
}

/// A document path with case- and separator-insensitive identity.
///
/// Editors, project files, and the file system disagree about how a path is
/// spelled (`C:\App\Page.html` vs `c:/app/page.html`). [`DocumentPath`] keeps
/// the spelling it was created with for display, and compares, hashes, and
/// orders on a normalized key: separators unified to `/`, `.` and `..`
/// components resolved, ASCII case folded.
#[derive(Clone)]
pub struct DocumentPath(Arc<DocumentPathInner>);

struct DocumentPathInner {
    path: Utf8PathBuf,
    key: Box<str>,
}

impl DocumentPath {
    /// Create a [`DocumentPath`].
    ///
    /// ## Panics
    ///
    /// Panics if `path` is empty. An empty path is a caller bug, not a
    /// document that could ever be found.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        let path = path.into();
        assert!(
            !path.as_str().is_empty(),
            "DocumentPath requires a non-empty path"
        );
        let key = normalize(&path);
        Self(Arc::new(DocumentPathInner { path, key }))
    }

    /// The path as originally spelled.
    #[must_use]
    pub fn as_path(&self) -> &Utf8Path {
        &self.0.path
    }

    /// The normalized key used for equality and hashing.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.0.key
    }
}

fn normalize(path: &Utf8Path) -> Box<str> {
    let unified = path.as_str().replace('\\', "/");
    let cleaned = clean_utf8_path(Utf8Path::new(&unified));
    let mut key = cleaned.as_str().to_ascii_lowercase();
    while key.len() > 1 && key.ends_with('/') {
        key.pop();
    }
    key.into_boxed_str()
}

impl PartialEq for DocumentPath {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for DocumentPath {}

impl Hash for DocumentPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for DocumentPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DocumentPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(other.key())
    }
}

impl fmt::Debug for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_path().as_str())
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_path(), f)
    }
}

impl Serialize for DocumentPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_path().as_str())
    }
}

impl From<&str> for DocumentPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<&Utf8Path> for DocumentPath {
    fn from(path: &Utf8Path) -> Self {
        Self::new(path)
    }
}

impl From<Utf8PathBuf> for DocumentPath {
    fn from(path: Utf8PathBuf) -> Self {
        Self::new(path)
    }
}
