//! Onboarding progress handlers

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    Json,
};
use serde::Deserialize;

use super::auth::require_user;
use crate::{AppError, AppState, MAX_BODY_SIZE};
use khata_core::models::OnboardingProgress;

/// Request body for updating onboarding progress
#[derive(Debug, Deserialize)]
pub struct UpdateOnboardingRequest {
    pub current_step: i64,
    #[serde(default)]
    pub completed: bool,
}

/// GET /api/onboarding - Where the user is in the onboarding flow
pub async fn get_onboarding(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<OnboardingProgress>, AppError> {
    let user = require_user(&state, request.headers())?;

    let progress = state.db.get_onboarding(user.id)?;
    Ok(Json(progress))
}

/// PUT /api/onboarding - Record a step transition
pub async fn update_onboarding(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<OnboardingProgress>, AppError> {
    let headers = request.headers().clone();
    let user = require_user(&state, &headers)?;

    let bytes = axum::body::to_bytes(request.into_body(), MAX_BODY_SIZE)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let req: UpdateOnboardingRequest =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    if req.current_step < 0 {
        return Err(AppError::bad_request("Step must be non-negative"));
    }

    let progress = state
        .db
        .set_onboarding(user.id, req.current_step, req.completed)?;

    Ok(Json(progress))
}
