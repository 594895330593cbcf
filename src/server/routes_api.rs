use crate::server::{AppContext, AppError};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use deskcast_common::Error;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/files", get(list_files))
        .route("/status", get(status))
        .route("/quality", post(set_quality))
}

#[derive(Deserialize)]
struct FilesQuery {
    dir: Option<String>,
}

async fn list_files(
    State(ctx): State<AppContext>,
    Query(params): Query<FilesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let dir = match params.dir.filter(|d| !d.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => ctx
            .sandbox
            .default_dir()
            .map(PathBuf::from)
            .ok_or(Error::SandboxViolation)?,
    };

    let listing = ctx.sandbox.list_dir(&dir).await?;
    Ok(Json(listing))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    ffmpeg: bool,
    ffmpeg_pid: Option<u32>,
    /// Service uptime in seconds.
    uptime: f64,
    stream_ready: bool,
    quality: &'static str,
    state: &'static str,
    restarts: u32,
    encoder_uptime: Option<f64>,
    last_exit: Option<String>,
}

async fn status(State(ctx): State<AppContext>) -> impl IntoResponse {
    let encoder = ctx.supervisor.status();
    let running = encoder.is_running();

    Json(StatusResponse {
        ffmpeg: running,
        ffmpeg_pid: encoder.pid.filter(|_| running),
        uptime: ctx.started_at.elapsed().as_secs_f64(),
        stream_ready: ctx.supervisor.store().is_ready(),
        quality: ctx.supervisor.quality().current().name(),
        state: encoder.state.as_str(),
        restarts: encoder.restarts,
        encoder_uptime: encoder.uptime().map(|d| d.as_secs_f64()),
        last_exit: encoder.last_exit.map(|reason| reason.to_string()),
    })
}

#[derive(Deserialize)]
struct QualityRequest {
    #[serde(default)]
    quality: String,
}

#[derive(Serialize)]
struct QualityResponse {
    quality: &'static str,
    changed: bool,
}

async fn set_quality(
    State(ctx): State<AppContext>,
    Json(req): Json<QualityRequest>,
) -> Result<impl IntoResponse, AppError> {
    let changed = ctx.supervisor.set_quality(&req.quality).await?;
    Ok(Json(QualityResponse {
        quality: ctx.supervisor.quality().current().name(),
        changed,
    }))
}
