//! HTTP routes: the UI form, the workflow API and operational endpoints.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use narrator_core::{NarratorError, ServerConfig};
use narrator_runtime::{AudioSession, AudioWorkflow, SessionStore};

use crate::ui;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<AudioWorkflow>,
    pub sessions: Arc<SessionStore>,
    pub config: Arc<ServerConfig>,
    pub metrics: Option<PrometheusHandle>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        workflow: Arc<AudioWorkflow>,
        sessions: Arc<SessionStore>,
        config: ServerConfig,
    ) -> Self {
        Self {
            workflow,
            sessions,
            config: Arc::new(config),
            metrics: None,
            start_time: Instant::now(),
        }
    }

    /// Attach a Prometheus handle for `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        // Stateful form
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", axum::routing::delete(close_session))
        .route("/api/sessions/{id}/generate", post(generate))
        .route("/api/sessions/{id}/delete", post(delete_audio))
        // Single-request form
        .route("/api/synthesize", post(synthesize))
        .route("/audio/{file_name}", get(serve_audio))
        // Operational
        .route("/health", get(health_handler))
        .route("/healthz", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/info", get(info_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Error body returned by the API.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{what} not found"))
    }
}

impl From<NarratorError> for ApiError {
    fn from(err: NarratorError) -> Self {
        let status = match &err {
            NarratorError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            NarratorError::NotFound(_) => StatusCode::NOT_FOUND,
            NarratorError::ResourceExhausted(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    pub text: String,
    #[serde(default)]
    pub base_name: String,
}

#[derive(Debug, Deserialize)]
pub struct SynthesizeBody {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AudioResponse {
    pub audio_path: String,
    pub audio_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub audio_path: String,
    pub audio_url: Option<String>,
    pub status: String,
}

/// Browser-facing URL for a generated file; `None` when there is no audio.
fn audio_url(path: &str) -> Option<String> {
    std::path::Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| format!("/audio/{name}"))
}

fn lookup_session(state: &AppState, id: &Uuid) -> Result<Arc<AudioSession>, ApiError> {
    state
        .sessions
        .get(id)
        .ok_or_else(|| ApiError::not_found("session"))
}

/// Run blocking workflow work off the async executor.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("worker failed: {e}"),
        )
    })
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(ui::render_page(state.config.ui, &state.config.title))
}

async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionCreated>), ApiError> {
    let session = state.sessions.create()?;
    Ok((
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id: session.id(),
        }),
    ))
}

async fn close_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> StatusCode {
    let workflow = Arc::clone(&state.workflow);
    let sessions = Arc::clone(&state.sessions);
    match blocking(move || sessions.remove(&id, &workflow)).await {
        Ok(true) => StatusCode::NO_CONTENT,
        Ok(false) => StatusCode::NOT_FOUND,
        Err(e) => e.status,
    }
}

#[instrument(skip(state, body), fields(text_len = body.text.len()))]
async fn generate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<GenerateBody>,
) -> ApiResult<AudioResponse> {
    let session = lookup_session(&state, &id)?;
    let workflow = Arc::clone(&state.workflow);

    let output =
        blocking(move || session.generate(&workflow, &body.text, &body.base_name)).await??;

    Ok(Json(AudioResponse {
        audio_url: audio_url(&output.audio_path),
        audio_path: output.audio_path,
    }))
}

#[instrument(skip(state))]
async fn delete_audio(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<DeleteResponse> {
    if !state.config.ui.deletion_enabled() {
        return Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "deletion is disabled for this form",
        ));
    }
    let session = lookup_session(&state, &id)?;
    let workflow = Arc::clone(&state.workflow);

    let result = blocking(move || session.delete(&workflow)).await?;

    Ok(Json(DeleteResponse {
        audio_url: audio_url(&result.audio_path),
        audio_path: result.audio_path,
        status: result.status_message,
    }))
}

#[instrument(skip(state, body), fields(text_len = body.text.len()))]
async fn synthesize(
    State(state): State<AppState>,
    Json(body): Json<SynthesizeBody>,
) -> ApiResult<AudioResponse> {
    let workflow = Arc::clone(&state.workflow);
    let output = blocking(move || workflow.generate(&body.text, "")).await??;

    Ok(Json(AudioResponse {
        audio_url: audio_url(&output.audio_path),
        audio_path: output.audio_path,
    }))
}

async fn serve_audio(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Response, ApiError> {
    let path = state
        .workflow
        .naming()
        .resolve_file_name(&file_name)
        .ok_or_else(|| ApiError::not_found("audio"))?;

    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok((
            [
                (header::CONTENT_TYPE, "audio/wav".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("inline; filename=\"{file_name}\""),
                ),
            ],
            bytes,
        )
            .into_response()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ApiError::not_found("audio")),
        Err(e) => {
            warn!(path = %path.display(), "Failed to read audio: {e}");
            Err(NarratorError::from(e).into())
        }
    }
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_secs: u64,
}

/// Info response.
#[derive(Serialize)]
struct InfoResponse {
    name: &'static str,
    version: &'static str,
    synthesizer: String,
    ui: narrator_core::UiMode,
    language: String,
    speed: f32,
    output_dir: String,
    active_sessions: usize,
}

/// Health check handler.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Readiness check handler.
async fn ready_handler() -> impl IntoResponse {
    StatusCode::OK
}

/// Info handler.
async fn info_handler(State(state): State<AppState>) -> impl IntoResponse {
    let workflow = state.workflow.config();
    Json(InfoResponse {
        name: "Narrator",
        version: env!("CARGO_PKG_VERSION"),
        synthesizer: state.workflow.synthesizer_name().to_string(),
        ui: state.config.ui,
        language: workflow.language.to_string(),
        speed: workflow.speed,
        output_dir: workflow.output_dir.display().to_string(),
        active_sessions: state.sessions.len(),
    })
}

/// Metrics handler (Prometheus format).
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => {
            info!("Metrics requested but no recorder is installed");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
