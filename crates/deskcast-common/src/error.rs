//! Common error type used throughout deskcast.
//!
//! Every failure the service can surface to a caller funnels into [`Error`],
//! which carries enough context for HTTP handlers to derive a status code via
//! [`Error::http_status`]. Best-effort cleanup paths (segment deletion, orphan
//! reaping) do not use this type at all: they return partial-success reports.

use std::fmt;
use std::path::PathBuf;

/// Unified error type for deskcast.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required external binary or setting is absent. Not retried.
    #[error("{what} not found at {}", path.display())]
    ConfigurationMissing {
        /// What is missing (e.g. "encoder binary").
        what: String,
        /// Where it was expected.
        path: PathBuf,
    },

    /// The encoder process could not be spawned.
    #[error("failed to spawn {tool}: {message}")]
    ProcessSpawn {
        /// Name of the tool that failed to start.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// A quality tier name outside the known set.
    #[error("Invalid quality. Use: {valid}")]
    InvalidPreset {
        /// The rejected name.
        name: String,
        /// Comma-separated list of accepted names.
        valid: String,
    },

    /// The requested path lies outside every sandbox root, cannot be
    /// resolved, or is not an allowed media type.
    #[error("Access denied")]
    SandboxViolation,

    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "file").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Request data failed validation.
    #[error("{0}")]
    Validation(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::ConfigurationMissing { .. } => 500,
            Error::ProcessSpawn { .. } => 502,
            Error::InvalidPreset { .. } => 400,
            Error::SandboxViolation => 403,
            Error::NotFound { .. } => 404,
            Error::Validation(_) => 400,
            Error::Io(_) => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Short machine-readable slug for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Error::ConfigurationMissing { .. } => "configuration_missing",
            Error::ProcessSpawn { .. } => "process_spawn_failed",
            Error::InvalidPreset { .. } => "invalid_preset",
            Error::SandboxViolation => "forbidden",
            Error::NotFound { .. } => "not_found",
            Error::Validation(_) => "validation_error",
            Error::Io(_) => "io_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Create a new ConfigurationMissing error.
    pub fn configuration_missing(what: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::ConfigurationMissing {
            what: what.into(),
            path: path.into(),
        }
    }

    /// Create a new ProcessSpawn error.
    pub fn process_spawn(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProcessSpawn {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a new InvalidPreset error.
    pub fn invalid_preset(name: impl Into<String>, valid: &[&str]) -> Self {
        Self::InvalidPreset {
            name: name.into(),
            valid: valid.join(", "),
        }
    }

    /// Create a new NotFound error.
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Create a new Validation error.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
