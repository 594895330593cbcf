//! The on-disk directory the encoder writes its playlist and segments into.

use deskcast_av::PLAYLIST_NAME;
use std::path::{Path, PathBuf};

/// Result of a best-effort directory wipe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub attempted: usize,
    pub removed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct SegmentStore {
    dir: PathBuf,
}

impl SegmentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn playlist_path(&self) -> PathBuf {
        self.dir.join(PLAYLIST_NAME)
    }

    /// The stream is ready once the encoder has written its playlist.
    pub fn is_ready(&self) -> bool {
        self.playlist_path().exists()
    }

    /// Delete every file in the directory, then make sure the directory
    /// exists. Individual failures are counted, not returned: a viewer may
    /// still hold a segment open.
    pub fn reset(&self) -> CleanupReport {
        let mut report = CleanupReport::default();

        if let Ok(entries) = std::fs::read_dir(&self.dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    continue;
                }
                report.attempted += 1;
                match std::fs::remove_file(&path) {
                    Ok(()) => report.removed += 1,
                    Err(e) => {
                        report.failed += 1;
                        tracing::debug!("Could not remove {:?}: {}", path, e);
                    }
                }
            }
        }

        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            tracing::warn!("Could not create stream directory {:?}: {}", self.dir, e);
        }

        report
    }
}
