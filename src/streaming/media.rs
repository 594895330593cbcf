//! Sandboxed media file streaming and download.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::Response,
};
use deskcast_common::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::range::{attachment_disposition, serve_file_streaming};
use crate::server::{AppContext, AppError};

#[derive(Debug, Deserialize)]
pub struct PathQuery {
    pub path: Option<String>,
}

/// Sandbox and media-type checks shared by stream and download. Nothing
/// touches the filesystem before both pass.
fn checked_path(ctx: &AppContext, query: &PathQuery) -> Result<PathBuf> {
    let raw = query
        .path
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| Error::validation("Missing path"))?;
    ctx.sandbox.resolve_media(Path::new(raw))
}

fn range_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::RANGE).and_then(|h| h.to_str().ok())
}

/// `GET /api/stream?path=...`
pub async fn stream_media(
    State(ctx): State<AppContext>,
    Query(query): Query<PathQuery>,
    headers: HeaderMap,
) -> std::result::Result<Response, AppError> {
    let path = checked_path(&ctx, &query)?;
    Ok(serve_file_streaming(&path, range_header(&headers), None).await?)
}

/// `GET /api/download?path=...`
pub async fn download_media(
    State(ctx): State<AppContext>,
    Query(query): Query<PathQuery>,
    headers: HeaderMap,
) -> std::result::Result<Response, AppError> {
    let path = checked_path(&ctx, &query)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let disposition = attachment_disposition(&file_name);
    Ok(serve_file_streaming(&path, range_header(&headers), Some(disposition)).await?)
}
