//! Onboarding step bookkeeping

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::OnboardingProgress;

impl Database {
    /// Fetch onboarding progress; a user with no row is at step 0, incomplete
    pub fn get_onboarding(&self, user_id: i64) -> Result<OnboardingProgress> {
        let conn = self.conn()?;
        let progress = conn
            .query_row(
                "SELECT user_id, current_step, completed, updated_at
                 FROM onboarding_progress WHERE user_id = ?",
                params![user_id],
                |row| {
                    let updated_at_str: String = row.get(3)?;
                    Ok(OnboardingProgress {
                        user_id: row.get(0)?,
                        current_step: row.get(1)?,
                        completed: row.get(2)?,
                        updated_at: parse_datetime(&updated_at_str),
                    })
                },
            )
            .optional()?;

        Ok(progress.unwrap_or(OnboardingProgress {
            user_id,
            current_step: 0,
            completed: false,
            updated_at: chrono::Utc::now(),
        }))
    }

    /// Advance (or rewind) the onboarding step; marking completed is sticky
    pub fn set_onboarding(
        &self,
        user_id: i64,
        current_step: i64,
        completed: bool,
    ) -> Result<OnboardingProgress> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO onboarding_progress (user_id, current_step, completed, updated_at)
            VALUES (?1, ?2, ?3, CURRENT_TIMESTAMP)
            ON CONFLICT(user_id) DO UPDATE SET
                current_step = excluded.current_step,
                completed = MAX(completed, excluded.completed),
                updated_at = CURRENT_TIMESTAMP
            "#,
            params![user_id, current_step, completed],
        )?;
        self.get_onboarding(user_id)
    }
}
