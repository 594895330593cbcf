//! Builder for the screen-capture encoder invocation.
//!
//! The argument list is fixed apart from the capture source, the quality
//! tier, and the output directory: 30 fps display capture without audio,
//! x264 tuned for latency, and an HLS muxer writing 2-second segments into a
//! rolling five-entry playlist.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::preset::QualityPreset;

/// Name of the top-level playlist the encoder writes.
pub const PLAYLIST_NAME: &str = "screen.m3u8";

/// Segment filename pattern handed to the HLS muxer.
pub const SEGMENT_PATTERN: &str = "seg%03d.ts";

/// Capture frame rate.
pub const FRAME_RATE: u32 = 30;

/// Segment duration in seconds.
pub const SEGMENT_SECONDS: u32 = 2;

/// Number of segments kept in the rolling playlist window.
pub const PLAYLIST_WINDOW: u32 = 5;

/// Keyframe interval in frames: one keyframe per segment.
pub const GOP_FRAMES: u32 = FRAME_RATE * SEGMENT_SECONDS;

/// The ffmpeg input device and source used for display capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSource {
    /// Input format (`-f`), e.g. `gdigrab` or `x11grab`.
    pub format: String,
    /// Input source (`-i`), e.g. `desktop` or `:0.0`.
    pub input: String,
}

impl Default for CaptureSource {
    fn default() -> Self {
        let (format, input) = if cfg!(windows) {
            ("gdigrab", "desktop")
        } else if cfg!(target_os = "macos") {
            ("avfoundation", "1")
        } else {
            ("x11grab", ":0.0")
        };
        Self {
            format: format.to_string(),
            input: input.to_string(),
        }
    }
}

/// Assembles the encoder argument list.
///
/// # Example
///
/// ```
/// use deskcast_av::{CaptureSource, EncoderCommand, QualityPreset};
///
/// let args = EncoderCommand::new("/tmp/stream")
///     .capture(CaptureSource::default())
///     .preset(QualityPreset::Hd1080)
///     .build_args();
/// assert!(args.contains(&"scale=1920:1080".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct EncoderCommand {
    output_dir: PathBuf,
    capture: CaptureSource,
    preset: QualityPreset,
}

impl EncoderCommand {
    /// Create a command writing into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            capture: CaptureSource::default(),
            preset: QualityPreset::default(),
        }
    }

    /// Set the capture source.
    pub fn capture(&mut self, capture: CaptureSource) -> &mut Self {
        self.capture = capture;
        self
    }

    /// Set the quality tier.
    pub fn preset(&mut self, preset: QualityPreset) -> &mut Self {
        self.preset = preset;
        self
    }

    /// Path of the playlist this command will produce.
    pub fn playlist_path(&self) -> PathBuf {
        self.output_dir.join(PLAYLIST_NAME)
    }

    /// Build the full argument list (without the program name).
    pub fn build_args(&self) -> Vec<String> {
        let params = self.preset.params();
        let segment_path = path_arg(&self.output_dir.join(SEGMENT_PATTERN));
        let playlist_path = path_arg(&self.playlist_path());

        let mut args: Vec<String> = Vec::with_capacity(48);
        let mut push = |items: &[&str]| args.extend(items.iter().map(|s| s.to_string()));

        push(&["-f", &self.capture.format]);
        push(&["-framerate", &FRAME_RATE.to_string()]);
        push(&["-i", &self.capture.input]);
        push(&["-an"]);
        push(&["-vf", &format!("scale={}", params.scale)]);
        push(&["-c:v", "libx264", "-preset", "ultrafast", "-tune", "zerolatency"]);
        push(&["-b:v", params.bitrate]);
        push(&["-maxrate", params.maxrate]);
        push(&["-bufsize", params.bufsize]);
        push(&["-g", &GOP_FRAMES.to_string()]);
        push(&["-keyint_min", &GOP_FRAMES.to_string()]);
        push(&["-pix_fmt", "yuv420p"]);
        push(&["-f", "hls"]);
        push(&["-hls_time", &SEGMENT_SECONDS.to_string()]);
        push(&["-hls_list_size", &PLAYLIST_WINDOW.to_string()]);
        push(&["-hls_flags", "delete_segments+append_list"]);
        push(&["-hls_segment_filename", &segment_path]);
        push(&[&playlist_path]);

        args
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
