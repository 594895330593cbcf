//! Cross-process stop trigger.
//!
//! `deskcast stop` drops a sentinel file; the running service polls for it,
//! deletes it and shuts down. Works where sending a signal is awkward.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Write the sentinel that asks a running instance to stop.
pub fn request_stop(flag: &Path) -> Result<()> {
    if let Some(parent) = flag.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
    }
    std::fs::write(flag, b"stop\n").with_context(|| format!("Failed to write {:?}", flag))?;
    Ok(())
}

/// Remove the sentinel if present. Returns whether it existed.
fn consume(flag: &Path) -> bool {
    if !flag.exists() {
        return false;
    }
    if let Err(e) = std::fs::remove_file(flag) {
        tracing::warn!("Failed to remove stop flag {:?}: {}", flag, e);
    }
    true
}

/// Poll for the sentinel every `interval` and cancel `token` when it appears.
///
/// A flag left over from a previous run is discarded at startup.
pub fn start_stop_flag_watcher(
    flag: PathBuf,
    interval: Duration,
    token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    if consume(&flag) {
        tracing::debug!("Discarded stale stop flag {:?}", flag);
    }

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    if consume(&flag) {
                        tracing::info!("Stop flag {:?} found, shutting down", flag);
                        token.cancel();
                        break;
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn flag_cancels_token_and_is_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let flag = dir.path().join("stop.flag");
        let token = CancellationToken::new();

        let watcher =
            start_stop_flag_watcher(flag.clone(), Duration::from_millis(20), token.clone());
        assert!(!token.is_cancelled());

        request_stop(&flag).unwrap();
        tokio::time::timeout(Duration::from_secs(2), token.cancelled())
            .await
            .unwrap();
        watcher.await.unwrap();
        assert!(!flag.exists());
    }

    #[tokio::test]
    async fn stale_flag_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let flag = dir.path().join("stop.flag");
        request_stop(&flag).unwrap();

        let token = CancellationToken::new();
        let watcher =
            start_stop_flag_watcher(flag.clone(), Duration::from_millis(20), token.clone());
        assert!(!flag.exists());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!token.is_cancelled());

        token.cancel();
        watcher.await.unwrap();
    }

    #[test]
    fn request_stop_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let flag = dir.path().join("run/stop.flag");
        request_stop(&flag).unwrap();
        assert!(flag.exists());
    }
}
