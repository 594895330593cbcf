//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates a media root and stream directory
//! in temp space, a default config pointing at them, and a full
//! [`AppContext`]. The encoder is configured with a binary that does not
//! exist unless a test supplies one, so the supervisor stays stopped.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{Request, Response};
use axum::Router;
use deskcast::config::Config;
use deskcast::encoder::EncoderSupervisor;
use deskcast::quality::QualityController;
use deskcast::segments::SegmentStore;
use deskcast::server::{create_router, AppContext};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub struct TestHarness {
    pub ctx: AppContext,
    /// Sandbox root for the media browser
    pub media: TempDir,
    /// Holds the stream dir and any fake encoder
    pub work: TempDir,
    pub supervisor_task: Option<JoinHandle<()>>,
}

impl TestHarness {
    /// Harness whose encoder binary is missing.
    pub async fn new() -> Self {
        Self::with_encoder(|work, config| {
            config.encoder.ffmpeg_path = Some(work.join("missing-ffmpeg"));
        })
        .await
    }

    /// Harness with a config adjusted by `setup`, which receives the work
    /// directory so it can place a fake encoder there.
    pub async fn with_encoder(setup: impl FnOnce(&Path, &mut Config)) -> Self {
        let media = tempfile::tempdir().expect("failed to create media dir");
        let work = tempfile::tempdir().expect("failed to create work dir");

        let mut config = Config::default();
        config.browse.roots = vec![media.path().to_path_buf()];
        config.encoder.stream_dir = work.path().join("stream");
        config.encoder.reap_orphans = false;
        config.encoder.restart_delay_ms = 200;
        config.encoder.shutdown_grace_ms = 2000;
        setup(work.path(), &mut config);

        let config = Arc::new(config);
        let store = SegmentStore::new(&config.encoder.stream_dir);
        let quality = QualityController::new(config.encoder.default_quality);
        let (supervisor, task) = EncoderSupervisor::spawn(config.encoder.clone(), store, quality).await;

        Self {
            ctx: AppContext::new(config, supervisor),
            media,
            work,
            supervisor_task: Some(task),
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.ctx.clone(), None)
    }

    pub fn stream_dir(&self) -> PathBuf {
        self.ctx.supervisor.store().dir().to_path_buf()
    }

    /// Write a file under the media root and return its absolute path.
    pub fn media_file(&self, rel: &str, contents: &[u8]) -> PathBuf {
        let path = self.media.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.router()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn get_with_range(&self, uri: &str, range: &str) -> Response<Body> {
        self.router()
            .oneshot(
                Request::get(uri)
                    .header("range", range)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    pub async fn post_json(&self, uri: &str, json: serde_json::Value) -> Response<Body> {
        self.router()
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(json.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    /// Start Axum on a random port. Cancel the token to stop it.
    pub async fn serve(&self) -> (SocketAddr, CancellationToken) {
        let (addr, token, _server) = self.serve_with_drain(Duration::from_secs(1)).await;
        (addr, token)
    }

    /// Like [`serve`](Self::serve), also returning the server task so tests
    /// can observe when it finishes.
    pub async fn serve_with_drain(
        &self,
        drain: Duration,
    ) -> (SocketAddr, CancellationToken, JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");
        let token = CancellationToken::new();

        let app = self.router();
        let shutdown = token.clone();
        let server = tokio::spawn(async move {
            deskcast::server::serve(listener, app, shutdown, drain)
                .await
                .ok();
        });

        (addr, token, server)
    }

    pub async fn shutdown(mut self) -> Self {
        self.ctx.supervisor.shutdown().await;
        if let Some(task) = self.supervisor_task.take() {
            task.await.unwrap();
        }
        self
    }
}

/// Encode a path for use inside a query string.
pub fn query_path(path: &Path) -> String {
    let mut out = String::new();
    for b in path.to_string_lossy().bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap()
}

/// Poll `check` until it holds or `timeout` elapses.
pub async fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

/// Write an executable shell script standing in for ffmpeg.
///
/// Keep `name` short and unique: orphan reaping matches on it.
#[cfg(unix)]
pub fn fake_encoder(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    {
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "#!/bin/sh").unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file.sync_all().unwrap();
    }
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Writes the playlist (its last argument), then idles until SIGTERM.
/// Every start is appended to `starts` next to the script.
#[cfg(unix)]
pub const WELL_BEHAVED: &str = r##"
trap 'exit 0' TERM
for last; do :; done
echo start >> "$(dirname "$0")/starts"
echo "$@" > "$(dirname "$0")/args"
echo "#EXTM3U" > "$last"
while true; do sleep 0.05; done
"##;

/// Like [`WELL_BEHAVED`] but ignores SIGTERM, so only a kill stops it.
#[cfg(unix)]
pub const STUBBORN: &str = r##"
trap '' TERM
for last; do :; done
echo start >> "$(dirname "$0")/starts"
echo "#EXTM3U" > "$last"
while true; do sleep 0.05; done
"##;

/// Exits immediately with an error, recording each start.
#[cfg(unix)]
pub const CRASHING: &str = r#"
echo start >> "$(dirname "$0")/starts"
exit 1
"#;

/// Number of recorded starts of a fake encoder in `dir`.
pub fn start_count(dir: &Path) -> usize {
    std::fs::read_to_string(dir.join("starts"))
        .map(|s| s.lines().count())
        .unwrap_or(0)
}
