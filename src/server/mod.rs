use crate::config::Config;
use crate::encoder::SupervisorHandle;
use crate::sandbox::PathSandbox;
use crate::streaming;
use anyhow::{Context, Result};
use axum::{
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

mod error;
pub mod routes_api;

pub use error::AppError;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    /// Allow-list for every request that names a filesystem path
    pub sandbox: Arc<PathSandbox>,
    /// Encoder lifecycle, quality selection and segment store
    pub supervisor: SupervisorHandle,
    /// Service start, reported as uptime
    pub started_at: Instant,
}

impl AppContext {
    pub fn new(config: Arc<Config>, supervisor: SupervisorHandle) -> Self {
        let sandbox = Arc::new(PathSandbox::new(&config.browse.roots));
        Self {
            config,
            sandbox,
            supervisor,
            started_at: Instant::now(),
        }
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext, static_dir: Option<PathBuf>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::RANGE]);

    let mut app = Router::new()
        // Health check
        .route("/health", get(health_check))
        .nest("/hls", streaming::hls_router())
        .nest(
            "/api",
            routes_api::api_routes().merge(streaming::media_routes()),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx);

    // Viewer page, with index.html for unknown paths
    if let Some(dir) = static_dir {
        if dir.exists() {
            tracing::info!("Serving static files from {:?}", dir);
            let index_path = dir.join("index.html");
            app = app.fallback_service(
                ServeDir::new(&dir)
                    .append_index_html_on_directories(true)
                    .not_found_service(ServeFile::new(index_path)),
            );
        }
    }

    app
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Serve HTTP until `shutdown` is cancelled, then drain in-flight requests.
pub async fn start_server(
    config: &Config,
    ctx: AppContext,
    shutdown: CancellationToken,
) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let app = create_router(ctx, config.server.static_dir.clone());

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    serve(listener, app, shutdown, config.server.drain_timeout()).await
}

/// Run `app` on an already bound listener until `shutdown` is cancelled.
///
/// In-flight responses get `drain` to finish. After that this returns
/// without waiting for connections that are still open.
pub async fn serve(
    listener: tokio::net::TcpListener,
    app: Router,
    shutdown: CancellationToken,
    drain: Duration,
) -> Result<()> {
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .into_future();

    let deadline = async {
        shutdown.cancelled().await;
        tokio::time::sleep(drain).await;
    };

    tokio::select! {
        result = server => result?,
        _ = deadline => {
            tracing::warn!("Open connections still draining after {:?}, closing", drain);
        }
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
