//! Path containment for everything the media browser touches.
//!
//! Request paths are made absolute and normalized lexically (`.` dropped,
//! `..` folded into its parent) before being compared component-wise with
//! the configured roots, so `/media2` is never accepted under a `/media`
//! root. Symlinks are not resolved.

mod listing;

pub use listing::{DirEntryInfo, DirListing, FileEntryInfo};

use deskcast_common::{Error, Result};
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone)]
pub struct PathSandbox {
    roots: Vec<PathBuf>,
}

impl PathSandbox {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let roots = roots
            .into_iter()
            .filter_map(|root| normalize(root.as_ref()))
            .collect();
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Directory listed when the client does not name one.
    pub fn default_dir(&self) -> Option<&Path> {
        self.roots.first().map(PathBuf::as_path)
    }

    pub fn is_allowed(&self, path: &Path) -> bool {
        self.resolve(path).is_ok()
    }

    /// Normalize `path` and check it against the roots.
    ///
    /// Every failure, including paths that cannot be made absolute, is a
    /// [`Error::SandboxViolation`] so callers learn nothing about why.
    pub fn resolve(&self, path: &Path) -> Result<PathBuf> {
        let resolved = normalize(path).ok_or(Error::SandboxViolation)?;
        if self.roots.iter().any(|root| resolved.starts_with(root)) {
            Ok(resolved)
        } else {
            Err(Error::SandboxViolation)
        }
    }

    /// Resolve a request path that must name a media file.
    pub fn resolve_media(&self, path: &Path) -> Result<PathBuf> {
        let resolved = self.resolve(path)?;
        if deskcast_common::paths::is_media_file(&resolved) {
            Ok(resolved)
        } else {
            Err(Error::SandboxViolation)
        }
    }
}

/// Absolute, lexically normalized form of `path`.
fn normalize(path: &Path) -> Option<PathBuf> {
    if path.as_os_str().is_empty() {
        return None;
    }
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(path)
    };

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root.
                if out.parent().is_some() {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    Some(out)
}
