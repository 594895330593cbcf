use super::PathSandbox;
use chrono::{DateTime, Utc};
use deskcast_common::paths::{classify, MediaKind};
use deskcast_common::{Error, Result};
use serde::Serialize;
use std::cmp::Ordering;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirListing {
    pub current_dir: String,
    pub parent: Option<String>,
    pub dirs: Vec<DirEntryInfo>,
    pub files: Vec<FileEntryInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DirEntryInfo {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileEntryInfo {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Windows housekeeping entries that are never worth browsing.
fn is_reserved(name: &str) -> bool {
    name.starts_with('$') || name == "System Volume Information"
}

/// Case-insensitive, with the raw name as tie-break so order is total.
fn by_name(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

impl PathSandbox {
    /// List the sub-directories and media files of `dir`.
    ///
    /// Entries whose metadata cannot be read are skipped silently.
    pub async fn list_dir(&self, dir: &Path) -> Result<DirListing> {
        let dir = self.resolve(dir)?;

        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| Error::internal(format!("Cannot read directory: {e}")))?;

        let mut dirs = Vec::new();
        let mut files = Vec::new();

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!("Stopped reading {:?}: {}", dir, e);
                    break;
                }
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();
            // Follows symlinks, like a plain stat would.
            let Ok(metadata) = tokio::fs::metadata(&path).await else {
                continue;
            };

            if metadata.is_dir() {
                if is_reserved(&name) {
                    continue;
                }
                dirs.push(DirEntryInfo {
                    name,
                    path: path.to_string_lossy().into_owned(),
                    kind: "directory",
                });
            } else if metadata.is_file() {
                let Some(kind) = classify(&path) else {
                    continue;
                };
                files.push(FileEntryInfo {
                    name,
                    path: path.to_string_lossy().into_owned(),
                    kind,
                    size: metadata.len(),
                    modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                });
            }
        }

        dirs.sort_by(|a, b| by_name(&a.name, &b.name));
        files.sort_by(|a, b| by_name(&a.name, &b.name));

        let parent = dir
            .parent()
            .filter(|parent| self.is_allowed(parent))
            .map(|parent| parent.to_string_lossy().into_owned());

        Ok(DirListing {
            current_dir: dir.to_string_lossy().into_owned(),
            parent,
            dirs,
            files,
        })
    }
}
