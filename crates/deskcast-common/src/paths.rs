//! Path utilities for classifying media files by extension.
//!
//! Classification drives both the directory browser (non-media files are
//! hidden) and the stream/download endpoints (non-media files are refused).
//! Extension matching is case-insensitive.

use serde::Serialize;
use std::path::Path;

/// List of supported video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "3gp", "3g2", "ts",
    "mts", "m2ts", "vob", "ogv", "f4v", "asf", "rm", "rmvb",
];

/// List of supported audio file extensions.
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "aac", "ogg", "wma", "m4a", "opus"];

/// List of supported image file extensions.
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "svg", "ico", "tiff", "tif", "heic", "heif",
    "avif",
];

/// Media category of a browsable file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
    Image,
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Classify a path by its extension.
///
/// Returns `None` for anything that is not video, audio, or image.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use deskcast_common::paths::{classify, MediaKind};
///
/// assert_eq!(classify(Path::new("clip.MKV")), Some(MediaKind::Video));
/// assert_eq!(classify(Path::new("song.flac")), Some(MediaKind::Audio));
/// assert_eq!(classify(Path::new("notes.txt")), None);
/// ```
pub fn classify(path: &Path) -> Option<MediaKind> {
    let ext = lowercase_extension(path)?;
    let ext = ext.as_str();
    if VIDEO_EXTENSIONS.contains(&ext) {
        Some(MediaKind::Video)
    } else if AUDIO_EXTENSIONS.contains(&ext) {
        Some(MediaKind::Audio)
    } else if IMAGE_EXTENSIONS.contains(&ext) {
        Some(MediaKind::Image)
    } else {
        None
    }
}

/// Check if a path has any supported media extension.
pub fn is_media_file(path: &Path) -> bool {
    classify(path).is_some()
}

/// Resolve the MIME type from the file extension.
///
/// Unknown extensions fall back to `application/octet-stream`.
pub fn content_type(path: &Path) -> &'static str {
    let Some(ext) = lowercase_extension(path) else {
        return "application/octet-stream";
    };

    match ext.as_str() {
        "mp4" | "f4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "wmv" => "video/x-ms-wmv",
        "flv" => "video/x-flv",
        "webm" => "video/webm",
        "m4v" => "video/x-m4v",
        "mpg" | "mpeg" | "vob" => "video/mpeg",
        "3gp" => "video/3gpp",
        "3g2" => "video/3gpp2",
        "ts" | "mts" | "m2ts" => "video/mp2t",
        "ogv" => "video/ogg",
        "asf" => "video/x-ms-asf",
        "rm" => "application/vnd.rn-realmedia",
        "rmvb" => "application/vnd.rn-realmedia-vbr",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "aac" => "audio/aac",
        "ogg" => "audio/ogg",
        "wma" => "audio/x-ms-wma",
        "m4a" => "audio/mp4",
        "opus" => "audio/opus",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "tiff" | "tif" => "image/tiff",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_video() {
        assert_eq!(classify(Path::new("movie.mkv")), Some(MediaKind::Video));
        assert_eq!(classify(Path::new("movie.mp4")), Some(MediaKind::Video));
        assert_eq!(classify(Path::new("capture.m2ts")), Some(MediaKind::Video));
        assert_eq!(classify(Path::new("/path/to/clip.rmvb")), Some(MediaKind::Video));
    }

    #[test]
    fn test_classify_audio_and_image() {
        assert_eq!(classify(Path::new("track.opus")), Some(MediaKind::Audio));
        assert_eq!(classify(Path::new("track.m4a")), Some(MediaKind::Audio));
        assert_eq!(classify(Path::new("photo.heic")), Some(MediaKind::Image));
        assert_eq!(classify(Path::new("icon.svg")), Some(MediaKind::Image));
    }

    #[test]
    fn test_classify_case_insensitive() {
        assert_eq!(classify(Path::new("MOVIE.MP4")), Some(MediaKind::Video));
        assert_eq!(classify(Path::new("Song.FlAc")), Some(MediaKind::Audio));
        assert_eq!(classify(Path::new("IMG_0001.JPG")), Some(MediaKind::Image));
    }

    #[test]
    fn test_non_media() {
        assert_eq!(classify(Path::new("readme.txt")), None);
        assert_eq!(classify(Path::new("no_extension")), None);
        assert_eq!(classify(Path::new("")), None);
        assert!(!is_media_file(Path::new("archive.zip")));
        assert!(is_media_file(Path::new(".hidden.mkv")));
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type(Path::new("a.mp4")), "video/mp4");
        assert_eq!(content_type(Path::new("a.MKV")), "video/x-matroska");
        assert_eq!(content_type(Path::new("a.ts")), "video/mp2t");
        assert_eq!(content_type(Path::new("a.mp3")), "audio/mpeg");
        assert_eq!(content_type(Path::new("a.tif")), "image/tiff");
        assert_eq!(content_type(Path::new("a.xyz")), "application/octet-stream");
        assert_eq!(content_type(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_extension_lists_disjoint() {
        for ext in VIDEO_EXTENSIONS {
            assert!(!AUDIO_EXTENSIONS.contains(ext));
            assert!(!IMAGE_EXTENSIONS.contains(ext));
        }
        for ext in AUDIO_EXTENSIONS {
            assert!(!IMAGE_EXTENSIONS.contains(ext));
        }
    }
}
