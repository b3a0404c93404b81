//! Axum API server
//!
//! Sessions live in a moka cache (idle sessions expire) and each one sits
//! behind a `tokio::sync::Mutex`, so actions on one session run one at a time.
//! Raster work runs in `spawn_blocking`; draw/edit events schedule a delayed
//! settle that only fires for the latest generation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use moka::future::Cache;
use tokio::sync::Mutex;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::config::PlannerConfig;
use crate::data::PlanningData;
use crate::error::PlannerError;
use crate::session::{Action, Debouncer, Session, SessionView};

pub type SharedSession = Arc<Mutex<Session>>;

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub data: Arc<PlanningData>,
    pub sessions: Cache<String, SharedSession>,
    pub debounce: Duration,
}

impl AppState {
    /// Load the datasets named by the config and build the session cache
    pub async fn new(config: &PlannerConfig) -> anyhow::Result<Self> {
        tracing::info!("Loading planning datasets...");
        let data_dir = config.data_dir.clone();
        let year = config.population_year;
        let data = tokio::task::spawn_blocking(move || PlanningData::load(&data_dir, year)).await??;

        Ok(Self::from_data(Arc::new(data), config))
    }

    pub fn from_data(data: Arc<PlanningData>, config: &PlannerConfig) -> Self {
        tracing::info!("Initializing Moka session cache...");
        let sessions = Cache::builder()
            .max_capacity(1_000)
            .time_to_idle(config.session_ttl)
            .build();

        Self { data, sessions, debounce: config.debounce }
    }

    /// Fetch a session, creating it on first use
    async fn session(&self, id: &str) -> SharedSession {
        let debounce = self.debounce;
        self.sessions
            .get_with(id.to_string(), async move {
                tracing::info!(session = id, "Created session");
                Arc::new(Mutex::new(Session::new(Debouncer::new(debounce))))
            })
            .await
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        .route("/api/countries", get(list_countries))

        // Session endpoints
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id/actions", post(post_action))

        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new()) // gzip + brotli compression
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http()) // Request logging
        .with_state(state)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn list_countries(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "countries": state.data.country_names()
    }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let session = state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("session '{}' not found", id)))?;

    let view = session.lock().await.state.view(&state.data);
    Ok(Json(view))
}

async fn post_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Action>, JsonRejection>,
) -> Result<Json<SessionView>, AppError> {
    let Json(action) = payload?;
    let session = state.session(&id).await;
    let mut guard = Arc::clone(&session).lock_owned().await;
    let data = Arc::clone(&state.data);

    tracing::info!(session = %id, action = action.kind(), "Dispatching action");

    // CPU-bound work: run in blocking thread pool
    let (outcome, view) = tokio::task::spawn_blocking(move || {
        let outcome = guard.dispatch(&action, &data, Instant::now());
        (outcome, guard.state.view(&data))
    })
    .await
    .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?;

    if let Some(generation) = outcome? {
        schedule_settle(state, id, session, generation);
    }

    Ok(Json(view))
}

/// Settle the AOI once the debounce interval has passed without a newer edit
fn schedule_settle(state: AppState, id: String, session: SharedSession, generation: u64) {
    tokio::spawn(async move {
        tokio::time::sleep(state.debounce).await;

        let mut guard = session.lock_owned().await;
        let data = Arc::clone(&state.data);
        let result = tokio::task::spawn_blocking(move || guard.settle(generation, &data, Instant::now())).await;

        match result {
            Ok(Ok(true)) => tracing::info!(session = %id, generation, "Project area settled"),
            Ok(Ok(false)) => tracing::debug!(session = %id, generation, "Settle superseded"),
            Ok(Err(e)) => tracing::warn!(session = %id, generation, "Settle failed: {}", e),
            Err(e) => tracing::error!(session = %id, "Settle task join error: {}", e),
        }
    });
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl From<PlannerError> for AppError {
    fn from(err: PlannerError) -> Self {
        let message = err.to_string();
        match &err {
            PlannerError::UnknownCountry(_) => AppError::NotFound(message),
            PlannerError::UnsupportedCountry { .. }
            | PlannerError::InvalidWeight { .. }
            | PlannerError::InvalidParameter { .. }
            | PlannerError::InvalidGeometry(_) => AppError::BadRequest(message),
            PlannerError::NoCountrySelected | PlannerError::NoAvailableArea | PlannerError::NoProjectArea => {
                AppError::Conflict(message)
            }
            PlannerError::GridMismatch { .. } | PlannerError::Data(_) => {
                tracing::error!("Internal planner error: {:#}", err);
                AppError::Internal(message)
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
