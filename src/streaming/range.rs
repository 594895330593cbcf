//! Byte-range file serving.
//!
//! Only a single `bytes=START-END` range is honoured (END optional). A
//! multi-range list, a suffix range such as `bytes=-500`, or anything else
//! that does not parse falls back to the full `200` response.

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use deskcast_common::{Error, Result};
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

const CHUNK_SIZE: usize = 64 * 1024;

/// Parse a `Range: bytes=START-END` header value.
///
/// Returns `(start, Option<end>)` where `end` is `None` for open-ended ranges
/// like `bytes=500-`.
pub fn parse_range_header(value: &str) -> Option<(u64, Option<u64>)> {
    let bytes_prefix = value.trim().strip_prefix("bytes=")?;
    let mut parts = bytes_prefix.splitn(2, '-');
    let start_str = parts.next()?.trim();
    let end_str = parts.next()?.trim();

    let start: u64 = start_str.parse().ok()?;
    let end: Option<u64> = if end_str.is_empty() {
        None
    } else {
        Some(end_str.parse().ok()?)
    };

    Some((start, end))
}

/// `Content-Disposition` value that makes browsers save the file under
/// `file_name`.
pub fn attachment_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();

    if fallback == file_name {
        format!("attachment; filename=\"{fallback}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            percent_encode(file_name)
        )
    }
}

fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            _ => {
                out.push('%');
                out.push(char::from(HEX[(b >> 4) as usize]));
                out.push(char::from(HEX[(b & 0x0f) as usize]));
            }
        }
    }
    out
}

const HEX: [u8; 16] = *b"0123456789ABCDEF";

/// Serve a file in 64KB chunks, honouring a single byte range.
///
/// The content type comes from the extension table. `disposition` is sent
/// verbatim as `Content-Disposition` when given.
pub async fn serve_file_streaming(
    file_path: &Path,
    range_header: Option<&str>,
    disposition: Option<String>,
) -> Result<Response> {
    let metadata = tokio::fs::metadata(file_path)
        .await
        .map_err(|_| Error::not_found("File", file_path.display()))?;
    if !metadata.is_file() {
        return Err(Error::not_found("File", file_path.display()));
    }

    let file_size = metadata.len();
    let content_type = deskcast_common::paths::content_type(file_path);
    let range = range_header.and_then(parse_range_header);

    let mut file = tokio::fs::File::open(file_path)
        .await
        .map_err(|_| Error::not_found("File", file_path.display()))?;

    let mut response = match range {
        Some((start, end_opt)) => {
            if file_size == 0 || start >= file_size {
                return Ok(unsatisfiable(file_size));
            }
            let end = end_opt.unwrap_or(file_size - 1).min(file_size - 1);
            if start > end {
                return Ok(unsatisfiable(file_size));
            }
            let length = end - start + 1;

            file.seek(std::io::SeekFrom::Start(start)).await?;

            // Wrap in a Take to limit reads to exactly `length` bytes.
            let limited = file.take(length);
            let body = Body::from_stream(ReaderStream::with_capacity(limited, CHUNK_SIZE));

            (
                StatusCode::PARTIAL_CONTENT,
                [
                    (header::CONTENT_TYPE, content_type.to_string()),
                    (
                        header::CONTENT_RANGE,
                        format!("bytes {start}-{end}/{file_size}"),
                    ),
                    (header::CONTENT_LENGTH, length.to_string()),
                    (header::ACCEPT_RANGES, "bytes".to_string()),
                ],
                body,
            )
                .into_response()
        }
        None => {
            let body = Body::from_stream(ReaderStream::with_capacity(file, CHUNK_SIZE));

            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content_type.to_string()),
                    (header::CONTENT_LENGTH, file_size.to_string()),
                    (header::ACCEPT_RANGES, "bytes".to_string()),
                ],
                body,
            )
                .into_response()
        }
    };

    if let Some(disposition) = disposition {
        if let Ok(value) = disposition.parse() {
            response
                .headers_mut()
                .insert(header::CONTENT_DISPOSITION, value);
        }
    }

    Ok(response)
}

fn unsatisfiable(file_size: u64) -> Response {
    (
        StatusCode::RANGE_NOT_SATISFIABLE,
        [(header::CONTENT_RANGE, format!("bytes */{file_size}"))],
        Body::empty(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn parse_range_full() {
        assert_eq!(parse_range_header("bytes=0-999"), Some((0, Some(999))));
    }

    #[test]
    fn parse_range_open_end() {
        assert_eq!(parse_range_header("bytes=500-"), Some((500, None)));
    }

    #[test]
    fn parse_range_rejects_other_forms() {
        assert!(parse_range_header("invalid").is_none());
        assert!(parse_range_header("bytes=abc-def").is_none());
        assert!(parse_range_header("bytes=-500").is_none());
        assert!(parse_range_header("bytes=0-1,5-9").is_none());
        assert!(parse_range_header("items=0-1").is_none());
    }

    #[test]
    fn disposition_plain_name() {
        assert_eq!(
            attachment_disposition("movie.mp4"),
            "attachment; filename=\"movie.mp4\""
        );
    }

    #[test]
    fn disposition_escapes_quotes_and_unicode() {
        assert_eq!(
            attachment_disposition("a\"b.mp4"),
            "attachment; filename=\"a_b.mp4\"; filename*=UTF-8''a%22b.mp4"
        );
        assert_eq!(
            attachment_disposition("é.mp3"),
            "attachment; filename=\"_.mp3\"; filename*=UTF-8''%C3%A9.mp3"
        );
    }

    async fn fixture(len: usize) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        tokio::fs::write(&path, data).await.unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn range_clamps_end_to_file_size() {
        let (_dir, path) = fixture(100).await;
        let response = serve_file_streaming(&path, Some("bytes=90-500"), None)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes 90-99/100");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.len(), 10);
        assert_eq!(body[0], 90);
    }

    #[tokio::test]
    async fn range_past_end_is_unsatisfiable() {
        let (_dir, path) = fixture(100).await;
        let response = serve_file_streaming(&path, Some("bytes=100-"), None)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes */100");
    }

    #[tokio::test]
    async fn empty_file_with_range_is_unsatisfiable() {
        let (_dir, path) = fixture(0).await;
        let response = serve_file_streaming(&path, Some("bytes=0-"), None)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    }

    #[tokio::test]
    async fn inverted_range_is_unsatisfiable() {
        let (_dir, path) = fixture(100).await;
        let response = serve_file_streaming(&path, Some("bytes=50-10"), None)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    }

    #[tokio::test]
    async fn multi_range_serves_whole_file() {
        let (_dir, path) = fixture(100).await;
        let response = serve_file_streaming(&path, Some("bytes=0-1,5-9"), None)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "100");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = serve_file_streaming(&dir.path().join("gone.mp4"), None, None)
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 404);
    }

    #[tokio::test]
    async fn disposition_header_is_attached() {
        let (_dir, path) = fixture(10).await;
        let response = serve_file_streaming(&path, None, Some(attachment_disposition("clip.mp4")))
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"clip.mp4\""
        );
    }
}
