//! Family cohort handler

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    Json,
};

use super::auth::require_user;
use crate::{AppError, AppState};
use khata_core::models::FamilyInfo;

/// GET /api/family - The caller's cohort members
pub async fn get_family(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<FamilyInfo>, AppError> {
    let user = require_user(&state, request.headers())?;

    let members = state.db.family_members(user.id)?;
    Ok(Json(FamilyInfo {
        is_family: members.len() > 1,
        members,
    }))
}
