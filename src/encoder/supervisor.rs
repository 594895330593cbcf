//! The actor that owns the encoder process.
//!
//! After boot a single task holds the child handle, the pending restart timer
//! and the shutdown flag. Commands arrive over a channel and are handled one
//! at a time alongside exit and timer events, so transitions never race.

use super::status::{EncoderState, EncoderStatus, ExitReason};
use crate::config::EncoderConfig;
use crate::quality::QualityController;
use crate::segments::SegmentStore;
use deskcast_av::{locate_encoder, process_name, EncoderCommand};
use deskcast_common::Error;
use parking_lot::RwLock;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command as ProcessCommand};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Sleep;
use tokio_util::sync::CancellationToken;

/// Longest encoder diagnostic line forwarded to the log.
const MAX_LOG_LINE: usize = 200;

enum Command {
    ApplyQuality,
    Shutdown { done: oneshot::Sender<()> },
}

/// Who ended the current instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitKind {
    Crash,
    Requested,
}

/// Cloneable handle used by the HTTP layer and the shutdown path.
#[derive(Clone)]
pub struct SupervisorHandle {
    tx: mpsc::Sender<Command>,
    status: Arc<RwLock<EncoderStatus>>,
    quality: QualityController,
    store: SegmentStore,
}

impl SupervisorHandle {
    pub fn status(&self) -> EncoderStatus {
        self.status.read().clone()
    }

    pub fn quality(&self) -> &QualityController {
        &self.quality
    }

    pub fn store(&self) -> &SegmentStore {
        &self.store
    }

    /// Select a quality tier. When it differs from the current one the
    /// encoder is restarted with the new parameters.
    pub async fn set_quality(&self, name: &str) -> deskcast_common::Result<bool> {
        let changed = self.quality.set(name)?;
        if changed {
            tracing::info!("Quality changed to {}, restarting encoder", name);
            if self.tx.send(Command::ApplyQuality).await.is_err() {
                tracing::warn!("Encoder supervisor is gone; quality applies on next start");
            }
        }
        Ok(changed)
    }

    /// Stop the encoder for good and wait until the supervisor has finished.
    /// Calling it again after the supervisor is gone returns at once.
    pub async fn shutdown(&self) {
        let (done, finished) = oneshot::channel();
        if self.tx.send(Command::Shutdown { done }).await.is_ok() {
            let _ = finished.await;
        }
    }

    /// Shut the encoder down as soon as `token` is cancelled, without
    /// waiting for anything else to wind down first.
    pub fn shutdown_on(&self, token: CancellationToken) -> JoinHandle<()> {
        let handle = self.clone();
        tokio::spawn(async move {
            token.cancelled().await;
            handle.shutdown().await;
        })
    }
}

pub struct EncoderSupervisor {
    config: EncoderConfig,
    store: SegmentStore,
    quality: QualityController,
    status: Arc<RwLock<EncoderStatus>>,
    rx: mpsc::Receiver<Command>,
    child: Option<Child>,
    exit_kind: ExitKind,
    restart: Option<Pin<Box<Sleep>>>,
    shutting_down: bool,
}

impl EncoderSupervisor {
    /// Reap orphans, clear the stream directory and start the encoder, then
    /// hand the process over to the supervisor task.
    pub async fn spawn(
        config: EncoderConfig,
        store: SegmentStore,
        quality: QualityController,
    ) -> (SupervisorHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(16);
        let status = Arc::new(RwLock::new(EncoderStatus::default()));

        let handle = SupervisorHandle {
            tx,
            status: status.clone(),
            quality: quality.clone(),
            store: store.clone(),
        };

        let mut supervisor = Self {
            config,
            store,
            quality,
            status,
            rx,
            child: None,
            exit_kind: ExitKind::Crash,
            restart: None,
            shutting_down: false,
        };

        supervisor.boot().await;
        (handle, tokio::spawn(supervisor.run()))
    }

    async fn boot(&mut self) {
        self.reap_orphans().await;
        let report = self.store.reset();
        tracing::debug!("Cleared stream directory: {:?}", report);
        self.start().await;
    }

    async fn run(mut self) {
        tracing::info!("Encoder supervisor started");

        loop {
            tokio::select! {
                cmd = self.rx.recv() => match cmd {
                    Some(Command::ApplyQuality) => self.apply_quality().await,
                    Some(Command::Shutdown { done }) => {
                        self.shutdown().await;
                        let _ = done.send(());
                        break;
                    }
                    None => {
                        self.shutdown().await;
                        break;
                    }
                },
                result = wait_child(&mut self.child) => self.on_exit(result),
                _ = wait_timer(&mut self.restart) => {
                    self.restart = None;
                    self.restart_now().await;
                }
            }
        }

        tracing::info!("Encoder supervisor stopped");
    }

    fn publish(&self, update: impl FnOnce(&mut EncoderStatus)) {
        update(&mut self.status.write());
    }

    fn encoder_program(&self) -> PathBuf {
        self.config
            .ffmpeg_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(deskcast_av::tools::ENCODER_NAME))
    }

    async fn reap_orphans(&self) {
        if !self.config.reap_orphans {
            return;
        }
        let name = process_name(&self.encoder_program());
        let report = tokio::task::spawn_blocking(move || deskcast_av::reap_orphans(&name))
            .await
            .unwrap_or_default();
        if report.found > 0 {
            tracing::info!(
                "Reaped orphaned encoders: {} found, {} killed, {} failed",
                report.found,
                report.killed,
                report.failed
            );
        }
    }

    async fn start(&mut self) {
        if self.shutting_down || self.child.is_some() {
            return;
        }

        let program = match locate_encoder(self.config.ffmpeg_path.as_deref()) {
            Ok(program) => program,
            Err(e) => {
                tracing::error!(
                    "{}. Install ffmpeg or set encoder.ffmpeg_path, then restart the service",
                    e
                );
                self.publish(|s| {
                    s.state = EncoderState::Stopped;
                    s.pid = None;
                    s.started_at = None;
                });
                return;
            }
        };

        self.publish(|s| s.state = EncoderState::Starting);

        let report = self.store.reset();
        if report.failed > 0 {
            tracing::warn!(
                "Could not remove {} of {} stale stream files",
                report.failed,
                report.attempted
            );
        }

        let preset = self.quality.current();
        let params = preset.params();
        tracing::info!("Quality: {} ({}, {})", preset, params.scale, params.bitrate);

        let args = EncoderCommand::new(self.store.dir())
            .capture(self.config.capture.clone())
            .preset(preset)
            .build_args();
        tracing::debug!("Spawning {:?} {}", program, args.join(" "));

        let spawned = ProcessCommand::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        match spawned {
            Ok(mut child) => {
                let pid = child.id();
                if let Some(stderr) = child.stderr.take() {
                    tokio::spawn(forward_stderr(stderr));
                }
                tracing::info!("Encoder started (PID: {:?})", pid);
                self.child = Some(child);
                self.exit_kind = ExitKind::Crash;
                self.publish(|s| {
                    s.state = EncoderState::Running;
                    s.pid = pid;
                    s.started_at = Some(Instant::now());
                    s.preset = Some(preset);
                });
            }
            Err(e) => {
                let err = Error::process_spawn(process_name(&program), e.to_string());
                tracing::error!("{}", err);
                self.publish(|s| {
                    s.state = EncoderState::Stopped;
                    s.pid = None;
                    s.started_at = None;
                    s.last_exit = Some(ExitReason::SpawnFailed(e.to_string()));
                });
                self.schedule_restart();
            }
        }
    }

    fn on_exit(&mut self, result: io::Result<ExitStatus>) {
        self.child = None;
        let requested = std::mem::replace(&mut self.exit_kind, ExitKind::Crash);

        let reason = match result {
            Ok(status) => ExitReason::from(status),
            Err(e) => ExitReason::WaitFailed(e.to_string()),
        };
        match requested {
            ExitKind::Requested => tracing::info!("Encoder stopped on request ({})", reason),
            ExitKind::Crash => tracing::warn!("Encoder exited with {}", reason),
        }

        self.publish(|s| {
            s.state = EncoderState::Stopped;
            s.pid = None;
            s.started_at = None;
            s.preset = None;
            s.last_exit = Some(reason);
        });

        if !self.shutting_down {
            self.schedule_restart();
        }
    }

    fn schedule_restart(&mut self) {
        if self.shutting_down {
            return;
        }
        if self.restart.is_some() {
            tracing::debug!("Restart already pending");
            return;
        }

        let delay = self.config.restart_delay();
        tracing::info!("Restarting encoder in {:?}", delay);
        self.restart = Some(Box::pin(tokio::time::sleep(delay)));
        self.publish(|s| s.state = EncoderState::RestartPending);
    }

    async fn restart_now(&mut self) {
        if self.shutting_down {
            return;
        }
        self.reap_orphans().await;
        self.publish(|s| s.restarts += 1);
        self.start().await;
    }

    async fn apply_quality(&mut self) {
        if self.shutting_down {
            return;
        }
        match self.child {
            Some(ref mut child) => {
                self.exit_kind = ExitKind::Requested;
                request_stop(child);
            }
            None => {
                if self.restart.take().is_some() {
                    tracing::debug!("Cancelled pending restart, starting with new quality");
                }
                self.start().await;
            }
        }
    }

    async fn shutdown(&mut self) {
        self.shutting_down = true;
        self.restart = None;

        if let Some(mut child) = self.child.take() {
            tracing::info!("Stopping encoder (PID: {:?})", child.id());
            request_stop(&mut child);
            self.store.reset();

            let grace = self.config.shutdown_grace();
            let reason = match tokio::time::timeout(grace, child.wait()).await {
                Ok(Ok(status)) => ExitReason::from(status),
                Ok(Err(e)) => ExitReason::WaitFailed(e.to_string()),
                Err(_) => {
                    tracing::warn!("Encoder ignored termination for {:?}, killing", grace);
                    if let Err(e) = child.kill().await {
                        tracing::warn!("Failed to kill encoder: {}", e);
                    }
                    match child.wait().await {
                        Ok(status) => ExitReason::from(status),
                        Err(e) => ExitReason::WaitFailed(e.to_string()),
                    }
                }
            };
            tracing::info!("Encoder stopped ({})", reason);
            self.publish(|s| s.last_exit = Some(reason));
        }

        self.store.reset();
        self.publish(|s| {
            s.state = EncoderState::Stopped;
            s.pid = None;
            s.started_at = None;
            s.preset = None;
        });
    }
}

/// Ask the encoder to exit. Its exit is observed by the run loop.
fn request_stop(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            if let Err(e) = deskcast_av::process::terminate(pid) {
                tracing::warn!("Failed to signal encoder PID {}: {}", pid, e);
            }
            return;
        }
    }

    if let Err(e) = child.start_kill() {
        tracing::warn!("Failed to stop encoder: {}", e);
    }
}

async fn wait_child(child: &mut Option<Child>) -> io::Result<ExitStatus> {
    match child {
        Some(child) => child.wait().await,
        None => std::future::pending().await,
    }
}

async fn wait_timer(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

async fn forward_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if let Some(msg) = encoder_log_line(&line) {
            tracing::debug!("ffmpeg: {}", msg);
        }
    }
}

/// Filter an encoder stderr line for the log: progress lines are dropped,
/// everything else is trimmed and shortened.
fn encoder_log_line(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with("frame=") {
        return None;
    }
    match line.char_indices().nth(MAX_LOG_LINE) {
        Some((idx, _)) => Some(&line[..idx]),
        None => Some(line),
    }
}
