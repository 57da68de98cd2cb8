//! Session API handlers.
//!
//! Route shapes follow the browser client's session API:
//! new / chat / fetch / list / end.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::Session;
use crate::startup::AppState;
use support_core::error::AppError;

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// New session request. Anonymous when no user id is given.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSessionRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// New session response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSessionResponse {
    pub session_id: String,
}

/// One user turn.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[validate(length(min = 1, message = "sessionId is required"))]
    pub session_id: String,
    #[validate(length(min = 1, message = "message is required"))]
    pub message: String,
}

/// Assistant reply for one turn.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub escalation: bool,
    pub fallback: bool,
}

/// Sessions owned by one user, newest first.
#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<Session>,
}

/// Acknowledgement for simple operations.
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a session.
///
/// POST /api/session/new
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<NewSessionRequest>,
) -> Result<(StatusCode, Json<NewSessionResponse>), AppError> {
    let session = state.chat.create_session(req.user_id.as_deref()).await?;

    Ok((
        StatusCode::CREATED,
        Json(NewSessionResponse {
            session_id: session.session_id,
        }),
    ))
}

/// Send a user turn and get the assistant reply.
///
/// POST /api/session/chat
pub async fn send_turn(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    req.validate()?;

    let turn = state.chat.send_turn(&req.session_id, &req.message).await?;

    // The raw provider payload stays server-side; log it for diagnostics.
    tracing::debug!(raw = %turn.raw, "Provider payload for turn");

    Ok(Json(ChatResponse {
        reply: turn.text,
        escalation: turn.escalation,
        fallback: turn.fallback,
    }))
}

/// Fetch a session with its full message history.
///
/// GET /api/session/:id
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Session>, AppError> {
    let session = state.chat.fetch_session(&id).await?;
    Ok(Json(session))
}

/// List a user's sessions, newest first. Abandoned (empty) sessions are hidden.
///
/// GET /api/session/list/:user_id
pub async fn list_sessions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<SessionListResponse>, AppError> {
    let sessions = state.chat.list_sessions(&user_id).await?;
    Ok(Json(SessionListResponse { sessions }))
}

/// End a session. History stays inspectable; a terminal marker is appended.
///
/// POST /api/session/:id/end
pub async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, AppError> {
    state.chat.end_session(&id).await?;
    Ok(Json(OkResponse { ok: true }))
}
