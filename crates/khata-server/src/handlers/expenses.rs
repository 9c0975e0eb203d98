//! Expense handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    Json,
};
use serde::Deserialize;

use super::auth::require_user;
use crate::{core_error, AppError, AppState, SuccessResponse, MAX_BODY_SIZE};
use khata_core::models::{Expense, NewExpense};

/// Query parameters naming a calendar month
#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl MonthQuery {
    /// Both parts are mandatory; axum already rejected non-numeric values
    pub(crate) fn resolve(&self) -> Result<(i32, u32), AppError> {
        match (self.year, self.month) {
            (Some(y), Some(m)) => Ok((y, m)),
            _ => Err(AppError::bad_request("year and month are required")),
        }
    }
}

/// GET /api/expenses?year=&month= - List the user's expenses for a month
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonthQuery>,
    request: Request,
) -> Result<Json<Vec<Expense>>, AppError> {
    let (year, month) = params.resolve()?;
    let user = require_user(&state, request.headers())?;

    let expenses = state
        .db
        .list_expenses_for_month(user.id, year, month)
        .map_err(core_error)?;

    Ok(Json(expenses))
}

/// POST /api/expenses - Record a new expense
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<Expense>, AppError> {
    let headers = request.headers().clone();
    let user = require_user(&state, &headers)?;

    let bytes = axum::body::to_bytes(request.into_body(), MAX_BODY_SIZE)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;
    let new: NewExpense =
        serde_json::from_slice(&bytes).map_err(|_| AppError::bad_request("Invalid JSON"))?;

    let expense = state.db.create_expense(user.id, &new).map_err(core_error)?;

    Ok(Json(expense))
}

/// DELETE /api/expenses/:id - Delete one of the caller's own expenses
pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<SuccessResponse>, AppError> {
    let user = require_user(&state, request.headers())?;

    let deleted = state.db.delete_expense(user.id, id)?;
    if !deleted {
        return Err(AppError::not_found(&format!("Expense {} not found", id)));
    }

    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/expenses/entry-dates?year=&month= - Days with at least one expense
pub async fn expense_entry_dates(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonthQuery>,
    request: Request,
) -> Result<Json<Vec<u32>>, AppError> {
    let (year, month) = params.resolve()?;
    let user = require_user(&state, request.headers())?;

    let days = state
        .db
        .expense_entry_days(user.id, year, month)
        .map_err(core_error)?;

    Ok(Json(days))
}
