//! HTTP API routes
//!
//! Defines all REST API endpoints for the server.

use crate::error::Error;
use crate::format::{available_formats, FormatInfo};
use crate::geo::ip_location::{available_ip_providers, IpBackendInfo};
use crate::geo::ProviderNames;
use crate::resolve::{BrowserCoordinates, Resolution, ResolveWarning, ResolvedLocation};
use crate::server::state::AppState;
use crate::session::SessionSummary;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::debug;
use uuid::Uuid;

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/status", get(status_handler))
        .route("/api/providers", get(providers_handler))
        .route("/api/sessions", post(create_session_handler))
        .route("/api/sessions/:id", axum::routing::delete(delete_session_handler))
        .route("/api/sessions/:id/location", get(location_handler))
        .route("/api/sessions/:id/locate", post(locate_handler))
        .route(
            "/api/sessions/:id/browser",
            put(report_browser_handler).delete(forget_browser_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "INTERNAL_ERROR" => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidCoordinates(_) | Error::CoordinateParse { .. } => "INVALID_COORDINATES",
            Error::SessionNotFound(_) => "NOT_FOUND",
            Error::Config(_) => "CONFIG_ERROR",
            _ => "INTERNAL_ERROR",
        };
        ApiError {
            error: err.to_string(),
            code: code.to_string(),
        }
    }
}

fn parse_session_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError {
        error: format!("Invalid session id: {}", id),
        code: "INVALID_SESSION_ID".to_string(),
    })
}

/// Status response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Server is running
    pub running: bool,
    /// Server version
    pub version: String,
    /// Number of live sessions
    pub sessions: usize,
    /// Uptime in seconds
    pub uptime_secs: u64,
}

/// Server status endpoint
///
/// GET /api/status
async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let sessions = state.sessions.read().await.len();

    Json(StatusResponse {
        running: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        sessions,
        uptime_secs: state.uptime_secs(),
    })
}

/// Providers response
#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    /// Providers the resolver consults, in order
    pub configured: ProviderNames,
    /// Resolution strategies in precedence order
    pub strategies: Vec<&'static str>,
    /// Every IP-location backend that can be configured
    pub available_ip: Vec<IpBackendInfo>,
    pub formats: Vec<FormatInfo>,
}

/// List providers and strategies
///
/// GET /api/providers
async fn providers_handler(State(state): State<Arc<AppState>>) -> Json<ProvidersResponse> {
    Json(ProvidersResponse {
        configured: state.providers().clone(),
        strategies: state.resolver.strategy_names(),
        available_ip: available_ip_providers(),
        formats: available_formats(),
    })
}

/// Start a new session
///
/// POST /api/sessions
async fn create_session_handler(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<SessionSummary>) {
    let mut sessions = state.sessions.write().await;
    let session = sessions.create();
    debug!("Created session {}", session.id);
    (StatusCode::CREATED, Json(session.summary()))
}

/// End a session
///
/// DELETE /api/sessions/:id
async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_session_id(&id)?;
    state.sessions.write().await.remove(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Current location response
#[derive(Debug, Serialize, Deserialize)]
pub struct LocationResponse {
    /// `None` until the session has been located
    pub location: Option<ResolvedLocation>,
    pub updated_at: Option<DateTime<Utc>>,
    pub accuracy_disclaimer: bool,
}

/// Read a session's current location
///
/// GET /api/sessions/:id/location
async fn location_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LocationResponse>, ApiError> {
    let id = parse_session_id(&id)?;
    let sessions = state.sessions.read().await;
    let store = &sessions.get(&id)?.location;

    let location = store.get().cloned();
    Ok(Json(LocationResponse {
        accuracy_disclaimer: location
            .as_ref()
            .is_some_and(ResolvedLocation::needs_accuracy_disclaimer),
        location,
        updated_at: store.updated_at(),
    }))
}

/// Locate request body
#[derive(Debug, Default, Deserialize)]
pub struct LocateRequest {
    /// City search text, treated as submitted
    #[serde(default)]
    pub search: Option<String>,
    /// A fresh client fix, also remembered for the session
    #[serde(default)]
    pub browser: Option<BrowserCoordinates>,
}

/// Locate response
#[derive(Debug, Serialize, Deserialize)]
pub struct LocateResponse {
    pub location: ResolvedLocation,
    pub warnings: Vec<ResolveWarning>,
    pub accuracy_disclaimer: bool,
}

impl From<Resolution> for LocateResponse {
    fn from(resolution: Resolution) -> Self {
        Self {
            accuracy_disclaimer: resolution.location.needs_accuracy_disclaimer(),
            location: resolution.location,
            warnings: resolution.warnings,
        }
    }
}

/// Run a resolution for a session and store the result
///
/// POST /api/sessions/:id/locate
async fn locate_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<LocateRequest>,
) -> Result<Json<LocateResponse>, ApiError> {
    let id = parse_session_id(&id)?;
    if let Some(browser) = &req.browser {
        check_browser_fix(browser)?;
    }

    let mut signals = state.base_signals().await;
    if let Some(search) = req.search {
        signals = signals.with_search(search);
    }

    // Registry lock is not held across provider calls
    let signals = {
        let mut sessions = state.sessions.write().await;
        let session = sessions.get_mut(&id)?;
        if let Some(browser) = req.browser {
            session.browser.report(browser);
        }
        session.signals(signals)
    };

    let resolution = state.resolver.resolve_with_report(&signals).await;

    let mut sessions = state.sessions.write().await;
    sessions
        .get_mut(&id)?
        .location
        .set(resolution.location.clone());

    Ok(Json(LocateResponse::from(resolution)))
}

/// Remember the client's latest fix
///
/// PUT /api/sessions/:id/browser
async fn report_browser_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(browser): Json<BrowserCoordinates>,
) -> Result<StatusCode, ApiError> {
    let id = parse_session_id(&id)?;
    check_browser_fix(&browser)?;

    state.sessions.write().await.get_mut(&id)?.browser.report(browser);
    Ok(StatusCode::NO_CONTENT)
}

fn check_browser_fix(browser: &BrowserCoordinates) -> Result<(), ApiError> {
    match browser.coordinates() {
        Some(_) => Ok(()),
        None => Err(ApiError {
            error: format!("Coordinates out of range: {}, {}", browser.lat, browser.lon),
            code: "INVALID_COORDINATES".to_string(),
        }),
    }
}

/// Forget the client's fix so the next locate asks again
///
/// DELETE /api/sessions/:id/browser
async fn forget_browser_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_session_id(&id)?;
    state.sessions.write().await.get_mut(&id)?.browser.forget();
    Ok(StatusCode::NO_CONTENT)
}
