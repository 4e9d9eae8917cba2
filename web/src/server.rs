//! HTTP server for the web interface.
//!
//! Routes:
//!   GET /                                   → overview (heat map per camera)
//!   GET /view?camera=…&recording=…          → recording viewer
//!   GET /live?camera=…                      → live stream relay
//!   GET /api/health                         → health check
//!   GET /api/cameras/{camera}/recordings    → recording list as JSON
//!   GET /api/cameras/{camera}/heatmap       → heat map as JSON
//!   GET /resource/style.css                 → bundled stylesheet
//!   GET /resource/*                         → static files

use std::future::IntoFuture;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

use camsrv_common::heatmap::Heatmap;
use camsrv_common::recording;
use camsrv_common::settings::{CameraSettings, Settings};
use camsrv_common::video_list::RecordingList;

use crate::live;
use crate::pages::{self, CameraHeatmap, ViewPage};

/// Shared state for route handlers.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    /// Cancelled on shutdown; long-running responses stop on it.
    pub shutdown: CancellationToken,
    start_time: Instant,
}

impl AppState {
    /// Resolve the `camera` query parameter against the configured cameras.
    pub fn camera(&self, id: Option<&str>) -> Result<&CameraSettings, AppError> {
        let id = id.map(str::trim).filter(|id| !id.is_empty());
        let id = id.ok_or(AppError::MissingCamera)?;
        self.settings
            .camera(id)
            .ok_or_else(|| AppError::UnknownCamera(id.to_string()))
    }
}

/// Request failures, mapped to a status code and a JSON error body.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("No camera specified.")]
    MissingCamera,

    #[error("Camera \"{0}\" does not exist.")]
    UnknownCamera(String),

    #[error("Selected recording not found.")]
    RecordingNotFound,

    #[error("Live streaming is disabled.")]
    StreamDisabled,

    #[error(transparent)]
    Core(#[from] camsrv_common::Error),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::MissingCamera => StatusCode::BAD_REQUEST,
            AppError::UnknownCamera(_) | AppError::RecordingNotFound => StatusCode::NOT_FOUND,
            AppError::StreamDisabled => StatusCode::FORBIDDEN,
            AppError::Core(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{self}");
        } else {
            warn!("{self}");
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct CameraQuery {
    pub camera: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ViewQuery {
    camera: Option<String>,
    /// Kept as text: anything that is not an integer means "no selection".
    recording: Option<String>,
}

/// How long open connections may take to finish after shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub fn router(settings: Arc<Settings>, resource_dir: PathBuf, shutdown: CancellationToken) -> Router {
    let state = AppState {
        settings,
        shutdown,
        start_time: Instant::now(),
    };

    Router::new()
        .route("/", get(overview))
        .route("/view", get(view))
        .route("/live", get(live::live))
        .route("/api/health", get(health))
        .route("/api/cameras/{camera}/recordings", get(api_recordings))
        .route("/api/cameras/{camera}/heatmap", get(api_heatmap))
        .route("/resource/style.css", get(stylesheet))
        .nest_service("/resource", ServeDir::new(resource_dir))
        .with_state(state)
}

/// Start the HTTP server. Blocks until shutdown.
pub async fn run(
    settings: Arc<Settings>,
    resource_dir: PathBuf,
    listen_addr: &str,
    shutdown: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(listen_addr).await?;
    info!("HTTP server listening on {listen_addr}");
    serve(listener, settings, resource_dir, shutdown).await
}

/// Serve on `listener` until `shutdown` is set.
///
/// Live relays are cancelled first; connections still open after
/// [`SHUTDOWN_GRACE`] are dropped.
pub async fn serve(
    listener: TcpListener,
    settings: Arc<Settings>,
    resource_dir: PathBuf,
    shutdown: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let stop = CancellationToken::new();
    let app = router(settings, resource_dir, stop.clone());

    let mut server = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown(stop.clone().cancelled_owned())
            .into_future(),
    );

    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        }
        _ = shutdown_requested(shutdown) => {}
    }

    stop.cancel();
    match tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await {
        Ok(result) => result??,
        Err(_) => {
            warn!("Connections still open after {SHUTDOWN_GRACE:?}, closing them");
            server.abort();
        }
    }

    Ok(())
}

async fn shutdown_requested(flag: Arc<AtomicBool>) {
    while !flag.load(Ordering::Relaxed) {
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

/// Run a directory scan off the async runtime.
async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> camsrv_common::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("background task failed: {e}")))?
        .map_err(AppError::from)
}

fn recording_list(settings: &Settings, camera: &CameraSettings) -> camsrv_common::Result<RecordingList> {
    let files = recording::scan(&camera.destination, &settings.list_scan())?;
    Ok(RecordingList::build(
        &files,
        &camera.local_url,
        &settings.dates,
        &settings.colors,
    ))
}

fn heatmap(settings: &Settings, camera: &CameraSettings) -> camsrv_common::Result<Heatmap> {
    let files = recording::scan(&camera.destination, &settings.heatmap_scan())?;
    Ok(Heatmap::build(&files, &settings.dates, &settings.colors))
}

// ── route handlers ───────────────────────────────────────────────────────

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

async fn overview(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    if !state.settings.heatmap_enabled {
        return Ok(Html(pages::overview(&state.settings, None)));
    }

    let settings = state.settings.clone();
    let heatmaps = blocking(move || {
        settings
            .cameras
            .iter()
            .map(|camera| {
                Ok(CameraHeatmap {
                    camera: camera.id.clone(),
                    title: camera.title.clone(),
                    heatmap: heatmap(&settings, camera)?,
                })
            })
            .collect::<camsrv_common::Result<Vec<_>>>()
    })
    .await?;

    Ok(Html(pages::overview(&state.settings, Some(heatmaps))))
}

async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], pages::STYLESHEET)
}

async fn view(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Result<Html<String>, AppError> {
    let camera = state.camera(query.camera.as_deref())?.clone();
    let mut recording = query
        .recording
        .as_deref()
        .and_then(|r| r.trim().parse::<i64>().ok());

    let settings = state.settings.clone();
    let list = {
        let camera = camera.clone();
        blocking(move || recording_list(&settings, &camera)).await?
    };

    // Without a live stream there is nothing to show but recordings.
    if !state.settings.stream_enabled && recording.is_none() {
        recording = list.first_recording_id();
    }

    let recording_url = match recording {
        Some(id) => Some(list.find_url(id).ok_or(AppError::RecordingNotFound)?),
        None => None,
    };

    Ok(Html(pages::view(
        &state.settings,
        &ViewPage {
            camera: &camera,
            recordings: &list,
            recording,
            recording_url,
        },
    )))
}

async fn api_recordings(
    State(state): State<AppState>,
    Path(camera): Path<String>,
) -> Result<Json<RecordingList>, AppError> {
    let camera = state.camera(Some(&camera))?.clone();
    let settings = state.settings.clone();
    let list = blocking(move || recording_list(&settings, &camera)).await?;
    Ok(Json(list))
}

async fn api_heatmap(
    State(state): State<AppState>,
    Path(camera): Path<String>,
) -> Result<Json<Heatmap>, AppError> {
    let camera = state.camera(Some(&camera))?.clone();
    let settings = state.settings.clone();
    let heatmap = blocking(move || heatmap(&settings, &camera)).await?;
    Ok(Json(heatmap))
}
