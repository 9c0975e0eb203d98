//! Budget snapshot handler

use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    Json,
};

use super::expenses::MonthQuery;
use crate::{core_error, get_telegram_user, AppError, AppState};
use khata_core::models::BudgetSnapshot;

/// GET /api/budget?year=&month= - Aggregated spend-versus-budget view
///
/// Resolves the caller's family cohort and accounting period, then sums
/// the cohort's expenses inside it. An identity that never registered
/// still gets a zero-valued snapshot: the dashboard widget must always
/// have something to render.
pub async fn get_budget_snapshot(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonthQuery>,
    request: Request,
) -> Result<Json<BudgetSnapshot>, AppError> {
    let (year, month) = params.resolve()?;
    let claims = get_telegram_user(request.headers(), &state.config)
        .ok_or_else(|| AppError::unauthorized("Missing Telegram identity"))?;

    let today = chrono::Utc::now().date_naive();
    let snapshot = state
        .db
        .budget_snapshot(claims.id, year, month, today)
        .map_err(core_error)?;

    Ok(Json(snapshot))
}
