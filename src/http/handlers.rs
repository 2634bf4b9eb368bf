use super::state::AppState;
use crate::session::ActiveSession;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

const DEFAULT_PAGE_SIZE: usize = 100;
const MAX_PAGE_SIZE: usize = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
    /// Number of sessions to skip (newest first)
    pub skip: Option<usize>,

    /// Page size (default and cap: 100)
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfoResponse {
    pub message: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ActiveStreamsResponse {
    pub count: usize,
    pub sessions: Vec<ActiveSession>,
}

#[derive(Debug, Serialize)]
pub struct DeleteSessionResponse {
    pub message: String,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: String) -> axum::response::Response {
    (status, Json(ErrorResponse { error })).into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /
pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(ServiceInfoResponse {
        message: state.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
        }),
    )
}

/// GET /sessions
/// List stored sessions, newest first
pub async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<ListSessionsQuery>,
) -> impl IntoResponse {
    let skip = query.skip.unwrap_or(0);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);

    match state.services.store.list_sessions(skip, limit).await {
        Ok(sessions) => (StatusCode::OK, Json(sessions)).into_response(),
        Err(e) => {
            error!("Failed to list sessions: {:#}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to list sessions: {}", e),
            )
        }
    }
}

/// GET /sessions/:session_id
/// Get one stored session
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.services.store.get_session(&session_id).await {
        Ok(Some(session)) => (StatusCode::OK, Json(session)).into_response(),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            format!("Session {} not found", session_id),
        ),
        Err(e) => {
            error!("Failed to load session {}: {:#}", session_id, e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to load session: {}", e),
            )
        }
    }
}

/// DELETE /sessions/:session_id
/// Delete one stored session
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.services.store.delete_session(&session_id).await {
        Ok(true) => {
            info!("Deleted session {}", session_id);
            (
                StatusCode::OK,
                Json(DeleteSessionResponse {
                    message: "Session deleted successfully".to_string(),
                    session_id,
                }),
            )
                .into_response()
        }
        Ok(false) => error_response(
            StatusCode::NOT_FOUND,
            format!("Session {} not found", session_id),
        ),
        Err(e) => {
            error!("Failed to delete session {}: {:#}", session_id, e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to delete session: {}", e),
            )
        }
    }
}

/// GET /streams
/// Sessions currently streaming
pub async fn list_active_streams(State(state): State<AppState>) -> impl IntoResponse {
    let sessions = state.services.registry.list().await;
    Json(ActiveStreamsResponse {
        count: sessions.len(),
        sessions,
    })
}
