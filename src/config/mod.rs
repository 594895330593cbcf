mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;
    expand_paths(&mut config);

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./deskcast.toml",
        "./config.toml",
        "~/.config/deskcast/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    Ok(Config::default())
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
}

fn expand_paths(config: &mut Config) {
    for root in config.browse.roots.iter_mut() {
        *root = expand(root);
    }
    config.encoder.stream_dir = expand(&config.encoder.stream_dir);
    if let Some(ref mut ffmpeg) = config.encoder.ffmpeg_path {
        *ffmpeg = expand(ffmpeg);
    }
    config.control.stop_flag = expand(&config.control.stop_flag);
    if let Some(ref mut file) = config.logging.file {
        *file = expand(file);
    }
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.browse.roots.is_empty() {
        anyhow::bail!("At least one browse root is required");
    }

    if config.control.stop_poll_secs == 0 {
        anyhow::bail!("control.stop_poll_secs must be at least 1");
    }

    Ok(())
}

/// Log settings that are allowed but probably not intended.
pub fn log_warnings(config: &Config) {
    if config.encoder.restart_delay_ms == 0 {
        tracing::warn!("encoder.restart_delay_ms is 0; crashed encoders restart immediately");
    }

    for root in &config.browse.roots {
        if !root.exists() {
            tracing::warn!("Browse root does not exist: {:?}", root);
        }
    }

    if let Some(ref ffmpeg) = config.encoder.ffmpeg_path {
        if !ffmpeg.exists() {
            tracing::warn!("Configured ffmpeg binary does not exist: {:?}", ffmpeg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskcast_av::QualityPreset;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deskcast.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn empty_file_yields_defaults() {
        let (_dir, path) = write_config("");
        let config = load_config(&path).unwrap();
        assert_eq!(config.server.port, 3333);
        assert_eq!(config.server.drain_timeout().as_millis(), 1000);
        assert_eq!(config.encoder.restart_delay_ms, 3000);
        assert_eq!(config.encoder.default_quality, QualityPreset::Hd720);
        assert_eq!(config.control.stop_poll_secs, 2);
        assert_eq!(config.logging.max_bytes, 5 * 1024 * 1024);
        assert!(!config.browse.roots.is_empty());
    }

    #[test]
    fn parses_sections() {
        let (_dir, path) = write_config(
            r#"
[server]
port = 8080
drain_timeout_ms = 250

[encoder]
stream_dir = "/tmp/deskcast-stream"
default_quality = "1080p"
restart_delay_ms = 500

[encoder.capture]
format = "x11grab"
input = ":1.0"

[browse]
roots = ["/srv/media", "/mnt/usb"]
"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.drain_timeout_ms, 250);
        assert_eq!(config.encoder.default_quality, QualityPreset::Hd1080);
        assert_eq!(config.encoder.restart_delay().as_millis(), 500);
        assert_eq!(config.encoder.capture.input, ":1.0");
        assert_eq!(
            config.browse.roots,
            vec![PathBuf::from("/srv/media"), PathBuf::from("/mnt/usb")]
        );
    }

    #[test]
    fn rejects_unknown_quality() {
        let (_dir, path) = write_config("[encoder]\ndefault_quality = \"4k\"\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn rejects_port_zero() {
        let (_dir, path) = write_config("[server]\nport = 0\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn rejects_empty_roots() {
        let (_dir, path) = write_config("[browse]\nroots = []\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(load_config_or_default(Some(&missing)).is_err());
    }
}
