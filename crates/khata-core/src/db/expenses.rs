//! Expense CRUD and per-month queries

use rusqlite::params;

use super::{parse_date, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Expense, NewExpense, PaymentMode};
use crate::period;

fn expense_from_row(row: &rusqlite::Row) -> rusqlite::Result<Expense> {
    let date_str: String = row.get(2)?;
    let mode_str: String = row.get(6)?;
    let created_at_str: String = row.get(7)?;
    Ok(Expense {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: parse_date(&date_str),
        amount: row.get(3)?,
        category: row.get(4)?,
        description: row.get(5)?,
        payment_mode: mode_str.parse().unwrap_or(PaymentMode::Cash),
        created_at: parse_datetime(&created_at_str),
    })
}

impl Database {
    /// Record a new expense for a user
    pub fn create_expense(&self, user_id: i64, new: &NewExpense) -> Result<Expense> {
        if new.amount <= 0.0 {
            return Err(Error::InvalidData(format!(
                "Amount must be positive, got {}",
                new.amount
            )));
        }
        if new.category.trim().is_empty() {
            return Err(Error::InvalidData("Category is required".to_string()));
        }

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO expenses (user_id, date, amount, category, description, payment_mode)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                user_id,
                new.date.to_string(),
                new.amount,
                new.category.trim(),
                new.description,
                new.payment_mode.as_str(),
            ],
        )?;
        let id = conn.last_insert_rowid();

        let expense = conn.query_row(
            "SELECT id, user_id, date, amount, category, description, payment_mode, created_at
             FROM expenses WHERE id = ?",
            params![id],
            expense_from_row,
        )?;
        Ok(expense)
    }

    /// List a user's expenses for a calendar month, newest first
    pub fn list_expenses_for_month(
        &self,
        user_id: i64,
        year: i32,
        month: u32,
    ) -> Result<Vec<Expense>> {
        let (start, end) = month_bounds(year, month)?;
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, date, amount, category, description, payment_mode, created_at
            FROM expenses
            WHERE user_id = ?1 AND date >= ?2 AND date < ?3
            ORDER BY date DESC, id DESC
            "#,
        )?;
        let expenses = stmt
            .query_map(
                params![user_id, start.to_string(), end.to_string()],
                expense_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(expenses)
    }

    /// Delete an expense owned by the given user. Returns false when the row
    /// does not exist or belongs to someone else.
    pub fn delete_expense(&self, user_id: i64, expense_id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let affected = conn.execute(
            "DELETE FROM expenses WHERE id = ? AND user_id = ?",
            params![expense_id, user_id],
        )?;
        Ok(affected > 0)
    }

    /// Distinct days-of-month on which the user recorded at least one expense
    pub fn expense_entry_days(&self, user_id: i64, year: i32, month: u32) -> Result<Vec<u32>> {
        let (start, end) = month_bounds(year, month)?;
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT CAST(strftime('%d', date) AS INTEGER) AS day
            FROM expenses
            WHERE user_id = ?1 AND date >= ?2 AND date < ?3
            ORDER BY day
            "#,
        )?;
        let days = stmt
            .query_map(params![user_id, start.to_string(), end.to_string()], |row| {
                row.get::<_, u32>(0)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(days)
    }
}

fn month_bounds(year: i32, month: u32) -> Result<(chrono::NaiveDate, chrono::NaiveDate)> {
    // Reuse the calendar-window resolver for the [1st, 1st-of-next) bounds
    let window = period::resolve_window(None, year, month, chrono::Utc::now().date_naive())?;
    Ok((window.start, window.end))
}
