//! # deskcast-av
//!
//! External encoder handling for deskcast.
//!
//! This crate provides:
//! - Locating the ffmpeg binary and checking that it runs
//! - The fixed quality tiers and the HLS capture argument list built from them
//! - Process signalling and best-effort orphan reaping by image name
//!
//! ## Features
//!
//! - `tracing` - Log orphan reaping through `tracing`
//!
//! ## Example
//!
//! ```no_run
//! use deskcast_av::{locate_encoder, EncoderCommand, QualityPreset};
//!
//! let program = locate_encoder(None)?;
//! let args = EncoderCommand::new("stream")
//!     .preset(QualityPreset::Hd720)
//!     .build_args();
//! println!("{} {}", program.display(), args.join(" "));
//! # Ok::<(), deskcast_common::Error>(())
//! ```

pub mod command;
pub mod preset;
pub mod process;
pub mod tools;

// Re-exports
pub use command::{CaptureSource, EncoderCommand, PLAYLIST_NAME};
pub use preset::{EncoderParams, QualityPreset};
pub use process::{reap_orphans, ReapReport};
pub use tools::{check_encoder, locate_encoder, process_name, ToolInfo};
