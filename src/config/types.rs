use deskcast_av::{CaptureSource, QualityPreset};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub encoder: EncoderConfig,

    #[serde(default)]
    pub browse: BrowseConfig,

    #[serde(default)]
    pub control: ControlConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Viewer page assets, served as a fallback for unmatched routes
    #[serde(default)]
    pub static_dir: Option<PathBuf>,

    /// How long open responses may keep draining after shutdown starts
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3333
}
fn default_drain_timeout_ms() -> u64 {
    1000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
            drain_timeout_ms: default_drain_timeout_ms(),
        }
    }
}

impl ServerConfig {
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EncoderConfig {
    /// Explicit ffmpeg binary; PATH lookup when unset
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Directory the encoder writes the playlist and segments into
    #[serde(default = "default_stream_dir")]
    pub stream_dir: PathBuf,

    /// Delay between an observed exit and the next start (default: 3000)
    #[serde(default = "default_restart_delay_ms")]
    pub restart_delay_ms: u64,

    /// How long shutdown waits for the encoder before force-killing it
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,

    /// Tier used at boot
    #[serde(default)]
    pub default_quality: QualityPreset,

    #[serde(default)]
    pub capture: CaptureSource,

    /// Kill leftover encoder processes by name before each start
    #[serde(default = "default_reap_orphans")]
    pub reap_orphans: bool,
}

fn default_stream_dir() -> PathBuf {
    PathBuf::from("stream")
}

fn default_restart_delay_ms() -> u64 {
    3000
}

fn default_shutdown_grace_ms() -> u64 {
    5000
}

fn default_reap_orphans() -> bool {
    true
}

impl EncoderConfig {
    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            stream_dir: default_stream_dir(),
            restart_delay_ms: default_restart_delay_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
            default_quality: QualityPreset::default(),
            capture: CaptureSource::default(),
            reap_orphans: default_reap_orphans(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrowseConfig {
    /// Filesystem roots the media browser may read from
    #[serde(default = "default_roots")]
    pub roots: Vec<PathBuf>,
}

fn default_roots() -> Vec<PathBuf> {
    if cfg!(windows) {
        vec![PathBuf::from("C:\\"), PathBuf::from("D:\\")]
    } else {
        vec![PathBuf::from(shellexpand::tilde("~").as_ref())]
    }
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            roots: default_roots(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ControlConfig {
    /// Sentinel file whose appearance triggers shutdown
    #[serde(default = "default_stop_flag")]
    pub stop_flag: PathBuf,

    #[serde(default = "default_stop_poll_secs")]
    pub stop_poll_secs: u64,
}

fn default_stop_flag() -> PathBuf {
    PathBuf::from("stop.flag")
}

fn default_stop_poll_secs() -> u64 {
    2
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            stop_flag: default_stop_flag(),
            stop_poll_secs: default_stop_poll_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log file; file logging is disabled when unset
    #[serde(default = "default_log_file")]
    pub file: Option<PathBuf>,

    /// Size at which the log file is rotated to `<file>.old`
    #[serde(default = "default_log_max_bytes")]
    pub max_bytes: u64,
}

fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from("logs/deskcast.log"))
}

fn default_log_max_bytes() -> u64 {
    5 * 1024 * 1024
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            max_bytes: default_log_max_bytes(),
        }
    }
}
