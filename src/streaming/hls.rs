//! Live playlist and segment serving out of the segment store.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::Response,
};
use deskcast_common::Error;

use super::range::serve_file_streaming;
use crate::server::{AppContext, AppError};

pub const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";
pub const SEGMENT_CONTENT_TYPE: &str = "video/mp2t";

/// Playlists change every segment; segments never change once written.
fn cache_headers(name: &str) -> Option<(&'static str, &'static str)> {
    let (_, ext) = name.rsplit_once('.')?;
    match ext {
        "m3u8" => Some((PLAYLIST_CONTENT_TYPE, "no-cache, no-store")),
        "ts" => Some((SEGMENT_CONTENT_TYPE, "max-age=10")),
        _ => None,
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && !name.contains("..")
}

/// Serve `screen.m3u8` or one of its segments.
pub async fn stream_file(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let not_found = || AppError::from(Error::not_found("Stream file", &name));

    if !is_plain_name(&name) {
        return Err(not_found());
    }
    let Some((content_type, cache_control)) = cache_headers(&name) else {
        return Err(not_found());
    };

    let path = ctx.supervisor.store().dir().join(&name);
    let range = headers.get(header::RANGE).and_then(|h| h.to_str().ok());

    let mut response = serve_file_streaming(&path, range, None).await?;
    let response_headers = response.headers_mut();
    response_headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response_headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(cache_control));

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playlist_is_never_cached() {
        assert_eq!(
            cache_headers("screen.m3u8"),
            Some((PLAYLIST_CONTENT_TYPE, "no-cache, no-store"))
        );
    }

    #[test]
    fn segments_are_cached_briefly() {
        assert_eq!(
            cache_headers("seg004.ts"),
            Some((SEGMENT_CONTENT_TYPE, "max-age=10"))
        );
    }

    #[test]
    fn other_files_are_not_served() {
        assert_eq!(cache_headers("notes.txt"), None);
        assert_eq!(cache_headers("noext"), None);
    }

    #[test]
    fn rejects_path_like_names() {
        assert!(is_plain_name("seg001.ts"));
        assert!(!is_plain_name("../secret.ts"));
        assert!(!is_plain_name("a/b.ts"));
        assert!(!is_plain_name("a\\b.ts"));
        assert!(!is_plain_name(""));
    }
}
