//! External tool detection.

use deskcast_common::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Default encoder binary name.
pub const ENCODER_NAME: &str = "ffmpeg";

/// Information about an external tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Version string if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// Check if a tool is available using a custom version argument.
pub fn check_tool_with_arg(program: &Path, version_arg: &str) -> ToolInfo {
    let name = process_name(program);
    let result = Command::new(program).arg(version_arg).output();

    match result {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|s| s.to_string());

            let path = if program.components().count() > 1 {
                Some(program.to_path_buf())
            } else {
                which::which(program).ok()
            };

            ToolInfo {
                name,
                available: true,
                version,
                path,
            }
        }
        _ => ToolInfo {
            name,
            available: false,
            version: None,
            path: None,
        },
    }
}

/// Check the encoder, honouring a configured path.
pub fn check_encoder(configured: Option<&Path>) -> ToolInfo {
    match locate_encoder(configured) {
        Ok(path) => check_tool_with_arg(&path, "-version"),
        Err(_) => ToolInfo {
            name: configured
                .map(process_name)
                .unwrap_or_else(|| ENCODER_NAME.to_string()),
            available: false,
            version: None,
            path: None,
        },
    }
}

/// Locate the encoder binary.
///
/// A configured path is authoritative: if it is set but missing, the error
/// names that path so the operator knows what to fix. Without a configured
/// path the binary is looked up on `PATH`.
///
/// # Errors
///
/// Returns [`Error::ConfigurationMissing`] if the binary cannot be found.
pub fn locate_encoder(configured: Option<&Path>) -> Result<PathBuf> {
    match configured {
        Some(path) if path.is_file() => Ok(path.to_path_buf()),
        Some(path) => Err(Error::configuration_missing("encoder binary", path)),
        None => which::which(ENCODER_NAME)
            .map_err(|_| Error::configuration_missing("encoder binary", ENCODER_NAME)),
    }
}

/// The process image name used to find running instances of `program`.
///
/// A bare name such as the default `ffmpeg` gets the platform executable
/// suffix, since Windows lists the image as `ffmpeg.exe`.
pub fn process_name(program: &Path) -> String {
    image_name(program, std::env::consts::EXE_SUFFIX)
}

fn image_name(program: &Path, exe_suffix: &str) -> String {
    let name = program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.to_string_lossy().into_owned());
    if program.extension().is_none() {
        format!("{name}{exe_suffix}")
    } else {
        name
    }
}
