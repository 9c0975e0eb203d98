//! Identity handlers and the shared user-resolution helper

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    Json,
};

use crate::{get_telegram_user, AppError, AppState};
use khata_core::models::User;

/// Resolve the authenticated, registered user or fail the request.
///
/// 401 when no Telegram identity is present, 404 when the identity has
/// never registered. Handlers that must degrade gracefully for unknown
/// users (the budget snapshot) bypass this and use the claims directly.
pub(crate) fn require_user(state: &AppState, headers: &HeaderMap) -> Result<User, AppError> {
    let claims = get_telegram_user(headers, &state.config)
        .ok_or_else(|| AppError::unauthorized("Missing Telegram identity"))?;
    state
        .db
        .get_user_by_telegram_id(claims.id)?
        .ok_or_else(|| AppError::not_found("User not registered"))
}

/// GET /api/me - The authenticated user's profile
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<User>, AppError> {
    let user = require_user(&state, request.headers())?;
    Ok(Json(user))
}

/// POST /api/users - Register the authenticated Telegram identity
///
/// Idempotent: an already-registered user gets their existing row back
/// with `last_active` refreshed.
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<User>, AppError> {
    let claims = get_telegram_user(request.headers(), &state.config)
        .ok_or_else(|| AppError::unauthorized("Missing Telegram identity"))?;

    let user = state.db.upsert_user(
        claims.id,
        claims.first_name.as_deref(),
        claims.last_name.as_deref(),
    )?;

    Ok(Json(user))
}
