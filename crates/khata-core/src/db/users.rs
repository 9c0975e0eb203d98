//! User lookup and registration

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::User;

/// Column list shared by the user queries below
const USER_COLUMNS: &str = "id, telegram_user_id, first_name, last_name, budget, family, created_at, last_active";

fn user_from_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
    let created_at_str: String = row.get(6)?;
    let last_active_str: String = row.get(7)?;
    Ok(User {
        id: row.get(0)?,
        telegram_user_id: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        budget: row.get(4)?,
        family: row.get(5)?,
        created_at: parse_datetime(&created_at_str),
        last_active: parse_datetime(&last_active_str),
    })
}

impl Database {
    /// Look up a user by their Telegram identity
    pub fn get_user_by_telegram_id(&self, telegram_user_id: i64) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE telegram_user_id = ?", USER_COLUMNS),
                params![telegram_user_id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Look up a user by internal id
    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                params![id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Register a Telegram user, returning the existing row if already known.
    /// Also refreshes `last_active` on repeat contact.
    pub fn upsert_user(
        &self,
        telegram_user_id: i64,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<User> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO users (telegram_user_id, first_name, last_name)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(telegram_user_id) DO UPDATE SET
                first_name = COALESCE(excluded.first_name, first_name),
                last_name = COALESCE(excluded.last_name, last_name),
                last_active = CURRENT_TIMESTAMP
            "#,
            params![telegram_user_id, first_name, last_name],
        )?;

        let user = conn.query_row(
            &format!("SELECT {} FROM users WHERE telegram_user_id = ?", USER_COLUMNS),
            params![telegram_user_id],
            user_from_row,
        )?;
        Ok(user)
    }

    /// Set a user's monthly budget (None clears it)
    pub fn set_user_budget(&self, user_id: i64, budget: Option<f64>) -> Result<()> {
        if let Some(b) = budget {
            if b <= 0.0 {
                return Err(crate::error::Error::InvalidData(format!(
                    "Budget must be positive, got {}",
                    b
                )));
            }
        }
        let conn = self.conn()?;
        conn.execute(
            "UPDATE users SET budget = ? WHERE id = ?",
            params![budget, user_id],
        )?;
        Ok(())
    }

    /// Load the user rows for a cohort, ascending internal id
    pub fn get_users_by_ids(&self, ids: &[i64]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let conn = self.conn()?;
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM users WHERE id IN ({}) ORDER BY id",
            USER_COLUMNS, placeholders
        );
        let mut stmt = conn.prepare(&sql)?;
        let refs: Vec<&dyn rusqlite::ToSql> = ids.iter().map(|id| id as &dyn rusqlite::ToSql).collect();
        let users = stmt
            .query_map(refs.as_slice(), user_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }
}
