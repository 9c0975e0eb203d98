//! Family cohort resolution and budget-snapshot aggregation
//!
//! A snapshot is computed fresh on every request as a strictly sequential
//! chain of reads: user -> cohort -> settings -> window -> budget -> sum.
//! Nothing here is cached or persisted.

use chrono::NaiveDate;
use tracing::debug;

use super::Database;
use crate::error::Result;
use crate::models::{BudgetSnapshot, User, CURRENCY, TRANSFERS_CATEGORY};
use crate::period::{self, budget_percentage, PeriodWindow};

impl Database {
    /// Resolve a user's family cohort.
    ///
    /// The membership list is stored serialized on the user row. Absent,
    /// empty, or unparsable data degrades silently to the singleton
    /// `{user_id}` rather than erroring; the result always contains the
    /// user and is sorted ascending.
    pub fn family_cohort(&self, user_id: i64) -> Result<Vec<i64>> {
        let user = self.get_user(user_id)?;
        let mut cohort = match user.and_then(|u| u.family) {
            Some(raw) => parse_family_list(&raw),
            None => vec![],
        };

        if !cohort.contains(&user_id) {
            cohort.push(user_id);
        }
        cohort.sort_unstable();
        cohort.dedup();
        Ok(cohort)
    }

    /// First non-null positive budget among the given users, lowest
    /// internal id wins ties
    pub fn first_positive_budget(&self, user_ids: &[i64]) -> Result<Option<f64>> {
        if user_ids.is_empty() {
            return Ok(None);
        }
        let conn = self.conn()?;
        let placeholders = vec!["?"; user_ids.len()].join(", ");
        let sql = format!(
            "SELECT budget FROM users
             WHERE id IN ({}) AND budget IS NOT NULL AND budget > 0
             ORDER BY id LIMIT 1",
            placeholders
        );
        let refs: Vec<&dyn rusqlite::ToSql> =
            user_ids.iter().map(|id| id as &dyn rusqlite::ToSql).collect();
        let budget = conn.query_row(&sql, refs.as_slice(), |row| row.get(0));
        match budget {
            Ok(b) => Ok(Some(b)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Sum of expenses for a cohort within `[start, end)`, excluding the
    /// Transfers category (money moved, not spent)
    pub fn sum_expenses(&self, user_ids: &[i64], start: NaiveDate, end: NaiveDate) -> Result<f64> {
        if user_ids.is_empty() {
            return Ok(0.0);
        }
        let conn = self.conn()?;
        let placeholders = vec!["?"; user_ids.len()].join(", ");
        let sql = format!(
            "SELECT COALESCE(SUM(amount), 0)
             FROM expenses
             WHERE user_id IN ({}) AND date >= ? AND date < ? AND category != ?",
            placeholders
        );

        let mut query_params: Vec<Box<dyn rusqlite::ToSql>> = user_ids
            .iter()
            .map(|id| Box::new(*id) as Box<dyn rusqlite::ToSql>)
            .collect();
        query_params.push(Box::new(start.to_string()));
        query_params.push(Box::new(end.to_string()));
        query_params.push(Box::new(TRANSFERS_CATEGORY));
        let refs: Vec<&dyn rusqlite::ToSql> = query_params.iter().map(|p| p.as_ref()).collect();

        let total: f64 = conn.query_row(&sql, refs.as_slice(), |row| row.get(0))?;
        Ok(total)
    }

    /// Compute the budget snapshot for a Telegram user viewing `year`/`month`.
    ///
    /// An unknown user yields a zero-valued snapshot rather than an error:
    /// the dashboard widget must always have something to render.
    pub fn budget_snapshot(
        &self,
        telegram_user_id: i64,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> Result<BudgetSnapshot> {
        // Reject a bad year/month before touching the store
        period::days_in_month(year, month)?;

        let user = match self.get_user_by_telegram_id(telegram_user_id)? {
            Some(u) => u,
            None => {
                debug!(telegram_user_id, "Snapshot requested for unknown user");
                return zero_snapshot(year, month, today);
            }
        };

        let cohort = self.family_cohort(user.id)?;
        let settings = self.get_user_settings(user.id)?;
        let window = period::resolve_window(
            settings.and_then(|s| s.period_start_day),
            year,
            month,
            today,
        )?;

        let budget = if cohort.len() > 1 {
            self.first_positive_budget(&cohort)?
        } else {
            user.budget
        };

        let total_expenses = self.sum_expenses(&cohort, window.start, window.end)?;

        Ok(snapshot_from_parts(
            &window,
            total_expenses,
            budget,
            cohort.len() as i64,
        ))
    }

    /// Cohort members as full user rows (for the family endpoint)
    pub fn family_members(&self, user_id: i64) -> Result<Vec<User>> {
        let cohort = self.family_cohort(user_id)?;
        self.get_users_by_ids(&cohort)
    }
}

/// Parse a serialized family list. Accepts a JSON array of ids or a
/// comma-separated string; anything else yields an empty list.
fn parse_family_list(raw: &str) -> Vec<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return vec![];
    }
    if let Ok(ids) = serde_json::from_str::<Vec<i64>>(trimmed) {
        return ids;
    }
    // Legacy rows store "1,2,3"
    let parsed: Option<Vec<i64>> = trimmed
        .split(',')
        .map(|part| part.trim().parse::<i64>().ok())
        .collect();
    parsed.unwrap_or_default()
}

fn snapshot_from_parts(
    window: &PeriodWindow,
    total_expenses: f64,
    budget: Option<f64>,
    cohort_size: i64,
) -> BudgetSnapshot {
    BudgetSnapshot {
        total_expenses,
        budget,
        current_date: window.position,
        days_in_month: window.total_days,
        budget_percentage: budget_percentage(total_expenses, budget),
        date_percentage: window.date_percentage(),
        currency: CURRENCY.to_string(),
        is_family: cohort_size > 1,
        family_members: cohort_size,
        custom_period: window.custom,
        period_start: window.start.to_string(),
        period_end: window.end.to_string(),
    }
}

/// The safe empty state for unknown users: calendar window boundaries so
/// the widget can render, everything else zeroed
fn zero_snapshot(year: i32, month: u32, today: NaiveDate) -> Result<BudgetSnapshot> {
    let window = period::resolve_window(None, year, month, today)?;
    Ok(BudgetSnapshot {
        total_expenses: 0.0,
        budget: None,
        current_date: window.position,
        days_in_month: window.total_days,
        budget_percentage: 0.0,
        date_percentage: 0.0,
        currency: CURRENCY.to_string(),
        is_family: false,
        family_members: 1,
        custom_period: false,
        period_start: window.start.to_string(),
        period_end: window.end.to_string(),
    })
}
