//! Byte-serving routes.
//!
//! # Routes
//!
//! Live stream:
//! - `GET /hls/:file` - the rolling playlist and its transport-stream segments
//!
//! Media browser:
//! - `GET /api/stream?path=...` - sandboxed media file with range support
//! - `GET /api/download?path=...` - same file as an attachment

mod hls;
mod media;
pub mod range;

pub use hls::stream_file;
pub use media::{download_media, stream_media, PathQuery};
pub use range::{parse_range_header, serve_file_streaming};

use axum::{routing::get, Router};

use crate::server::AppContext;

/// Router for the live HLS output, nested under `/hls`.
pub fn hls_router() -> Router<AppContext> {
    Router::new().route("/:file", get(stream_file))
}

/// Media file routes, merged into the `/api` router.
pub fn media_routes() -> Router<AppContext> {
    Router::new()
        .route("/stream", get(stream_media))
        .route("/download", get(download_media))
}
