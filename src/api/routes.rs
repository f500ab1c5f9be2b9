//! HTTP route handlers for the API

use super::cookie::{removal_cookie, CurrentSession};
use super::AppState;
use crate::error::SessionError;
use crate::session::SessionValue;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use axum_extra::extract::cookie::CookieJar;

fn session_error(e: SessionError) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": e.to_string() })),
    )
        .into_response()
}

// ============================================================================
// Health Check
// ============================================================================

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.store.len()
    }))
}

// ============================================================================
// Current Session
// ============================================================================

pub async fn get_session(
    State(state): State<AppState>,
    Extension(CurrentSession(id)): Extension<CurrentSession>,
) -> Response {
    match state.store.snapshot(&id) {
        Ok(info) => Json(info).into_response(),
        Err(e) => session_error(e),
    }
}

pub async fn get_value(
    State(state): State<AppState>,
    Extension(CurrentSession(id)): Extension<CurrentSession>,
    Path(key): Path<String>,
) -> Response {
    match state.store.get_value(&id, &key) {
        Ok(value) => Json(serde_json::json!({ "key": key, "value": value })).into_response(),
        Err(e) => session_error(e),
    }
}

pub async fn set_value(
    State(state): State<AppState>,
    Extension(CurrentSession(id)): Extension<CurrentSession>,
    Path(key): Path<String>,
    Json(value): Json<SessionValue>,
) -> Response {
    match state.store.set_value(&id, key, value) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => session_error(e),
    }
}

pub async fn delete_value(
    State(state): State<AppState>,
    Extension(CurrentSession(id)): Extension<CurrentSession>,
    Path(key): Path<String>,
) -> Response {
    match state.store.remove_value(&id, &key) {
        Ok(previous) => {
            Json(serde_json::json!({ "removed": previous.is_some() })).into_response()
        }
        Err(e) => session_error(e),
    }
}

// ============================================================================
// Logout
// ============================================================================

/// Destroy the session named by the cookie (if any) and expire the cookie
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(cookie) = jar.get(state.store.cookie_name()) {
        state.store.destroy(cookie.value());
    }
    let jar = jar.add(removal_cookie(&state.store));
    (jar, StatusCode::NO_CONTENT)
}
