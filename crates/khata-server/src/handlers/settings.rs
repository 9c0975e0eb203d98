//! Budget-period settings handlers

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::auth::require_user;
use crate::{core_error, AppError, AppState, MAX_BODY_SIZE};

/// Settings as exposed to the Mini App; a user with no row gets the
/// calendar-month defaults
#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub period_start_day: Option<u32>,
    pub period_end_day: Option<u32>,
}

/// Request body for updating settings. Both days set = custom period,
/// both absent = back to calendar months.
#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub period_start_day: Option<u32>,
    pub period_end_day: Option<u32>,
}

/// GET /api/settings - The user's budget-period configuration
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<SettingsResponse>, AppError> {
    let user = require_user(&state, request.headers())?;

    let settings = state.db.get_user_settings(user.id)?;
    let (start, end) = settings
        .map(|s| (s.period_start_day, s.period_end_day))
        .unwrap_or((None, None));

    Ok(Json(SettingsResponse {
        period_start_day: start,
        period_end_day: end,
    }))
}

/// PUT /api/settings - Update the whole cohort's period configuration
///
/// Settings are cohort-wide: the update lands on every family member in
/// one statement, never on just the caller.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<SettingsResponse>, AppError> {
    let headers = request.headers().clone();
    let user = require_user(&state, &headers)?;

    let bytes = axum::body::to_bytes(request.into_body(), MAX_BODY_SIZE)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: UpdateSettingsRequest =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    state
        .db
        .update_settings_for_cohort(user.id, req.period_start_day, req.period_end_day)
        .map_err(core_error)?;

    Ok(Json(SettingsResponse {
        period_start_day: req.period_start_day,
        period_end_day: req.period_end_day,
    }))
}
