use deskcast_av::QualityPreset;
use serde::Serialize;
use std::fmt;
use std::process::ExitStatus;
use std::time::{Duration, Instant};

/// Lifecycle state of the supervised encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderState {
    #[default]
    Stopped,
    Starting,
    Running,
    RestartPending,
}

impl EncoderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EncoderState::Stopped => "stopped",
            EncoderState::Starting => "starting",
            EncoderState::Running => "running",
            EncoderState::RestartPending => "restart_pending",
        }
    }
}

impl fmt::Display for EncoderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the last encoder instance ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    Code(i32),
    Signal(i32),
    SpawnFailed(String),
    WaitFailed(String),
}

impl From<ExitStatus> for ExitReason {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ExitReason::Code(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitReason::Signal(signal);
            }
        }
        ExitReason::Code(-1)
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Code(code) => write!(f, "exit code {code}"),
            ExitReason::Signal(signal) => write!(f, "signal {signal}"),
            ExitReason::SpawnFailed(msg) => write!(f, "spawn failed: {msg}"),
            ExitReason::WaitFailed(msg) => write!(f, "wait failed: {msg}"),
        }
    }
}

/// Snapshot published by the supervisor after every transition.
#[derive(Debug, Clone, Default)]
pub struct EncoderStatus {
    pub state: EncoderState,
    pub pid: Option<u32>,
    pub started_at: Option<Instant>,
    /// Preset the live instance was launched with.
    pub preset: Option<QualityPreset>,
    /// Restarts performed since boot.
    pub restarts: u32,
    pub last_exit: Option<ExitReason>,
}

impl EncoderStatus {
    pub fn is_running(&self) -> bool {
        self.state == EncoderState::Running && self.pid.is_some()
    }

    /// Time since the current instance was spawned.
    pub fn uptime(&self) -> Option<Duration> {
        self.started_at.map(|at| at.elapsed())
    }
}
