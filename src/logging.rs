//! Log initialisation and the size-rotated log file.

use crate::config::LoggingConfig;
use anyhow::Result;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::fmt::writer::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default filter directives, used when `RUST_LOG` is not set.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "deskcast=trace,deskcast_av=debug,tower_http=debug"
    } else {
        "deskcast=debug,deskcast_av=info,tower_http=info"
    }
}

/// Install the global subscriber: stdout plus the rotating log file.
pub fn init_logging(verbose: bool, config: &LoggingConfig) -> Result<()> {
    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter(verbose).to_string());

    let file_layer = match config.file {
        Some(ref path) => match RotatingLog::open(path, config.max_bytes) {
            Ok(log) => Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(log),
            ),
            Err(e) => {
                eprintln!("Log file {:?} unavailable, logging to stdout only: {}", path, e);
                None
            }
        },
        None => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(env_filter))
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init()?;

    Ok(())
}

struct LogFile {
    path: PathBuf,
    file: Option<File>,
    size: u64,
    max_bytes: u64,
}

impl LogFile {
    fn rotate(&mut self) {
        self.file = None;
        let old = rotated_path(&self.path);
        // Windows refuses to rename over an existing file.
        let _ = fs::remove_file(&old);
        let _ = fs::rename(&self.path, &old);
        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .ok();
        self.size = 0;
    }

    fn write_line(&mut self, buf: &[u8]) {
        if self.size >= self.max_bytes {
            self.rotate();
        }
        if let Some(ref mut file) = self.file {
            if file.write_all(buf).is_ok() {
                self.size += buf.len() as u64;
            }
        }
    }
}

/// Append-only log file that is moved to `<file>.old` once it grows past
/// `max_bytes`. One previous generation is kept. Write failures are dropped.
#[derive(Clone)]
pub struct RotatingLog {
    inner: Arc<Mutex<LogFile>>,
}

impl RotatingLog {
    pub fn open(path: &Path, max_bytes: u64) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            inner: Arc::new(Mutex::new(LogFile {
                path: path.to_path_buf(),
                file: Some(file),
                size,
                max_bytes,
            })),
        })
    }
}

impl Write for RotatingLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().write_line(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(ref mut file) = self.inner.lock().file {
            let _ = file.flush();
        }
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for RotatingLog {
    type Writer = RotatingLog;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn rotated_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".old");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_below_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/app.log");
        let mut log = RotatingLog::open(&path, 1024).unwrap();

        log.write_all(b"first\n").unwrap();
        log.write_all(b"second\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
        assert!(!rotated_path(&path).exists());
    }

    #[test]
    fn rotates_once_over_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let mut log = RotatingLog::open(&path, 8).unwrap();

        log.write_all(b"0123456789\n").unwrap();
        log.write_all(b"next\n").unwrap();

        assert_eq!(fs::read_to_string(rotated_path(&path)).unwrap(), "0123456789\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "next\n");
    }

    #[test]
    fn keeps_one_generation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let mut log = RotatingLog::open(&path, 4).unwrap();

        log.write_all(b"aaaaa\n").unwrap();
        log.write_all(b"bbbbb\n").unwrap();
        log.write_all(b"ccccc\n").unwrap();

        assert_eq!(fs::read_to_string(rotated_path(&path)).unwrap(), "bbbbb\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "ccccc\n");
    }

    #[test]
    fn existing_size_counts_toward_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, b"previous run\n").unwrap();

        let mut log = RotatingLog::open(&path, 10).unwrap();
        log.write_all(b"new\n").unwrap();

        assert_eq!(fs::read_to_string(rotated_path(&path)).unwrap(), "previous run\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
    }

    #[test]
    fn verbose_filter_is_more_detailed() {
        assert!(default_filter(true).contains("deskcast=trace"));
        assert!(default_filter(false).contains("deskcast=debug"));
    }
}
