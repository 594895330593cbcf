//! deskcast-common: shared error type and media path utilities.
//!
//! - **Error Handling**: [`Error`] covers every caller-visible failure and maps
//!   itself to an HTTP status code.
//! - **Path Utilities**: classify files as video, audio, or image and resolve
//!   their MIME types.
//!
//! # Examples
//!
//! ```
//! use deskcast_common::paths::{classify, MediaKind};
//! use deskcast_common::{Error, Result};
//! use std::path::Path;
//!
//! assert_eq!(classify(Path::new("clip.mp4")), Some(MediaKind::Video));
//!
//! fn guarded() -> Result<()> {
//!     Err(Error::SandboxViolation)
//! }
//! assert_eq!(guarded().unwrap_err().http_status(), 403);
//! ```

pub mod error;
pub mod paths;

pub use error::{Error, Result};
pub use paths::MediaKind;
