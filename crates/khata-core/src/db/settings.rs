//! Budget-period configuration with cohort-wide propagation

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::UserSettings;

impl Database {
    /// Fetch a user's budget-period settings, if any
    pub fn get_user_settings(&self, user_id: i64) -> Result<Option<UserSettings>> {
        let conn = self.conn()?;
        let settings = conn
            .query_row(
                "SELECT user_id, period_start_day, period_end_day, updated_at
                 FROM user_settings WHERE user_id = ?",
                params![user_id],
                |row| {
                    let updated_at_str: String = row.get(3)?;
                    Ok(UserSettings {
                        user_id: row.get(0)?,
                        period_start_day: row.get(1)?,
                        period_end_day: row.get(2)?,
                        updated_at: parse_datetime(&updated_at_str),
                    })
                },
            )
            .optional()?;
        Ok(settings)
    }

    /// Update budget-period settings for a user's whole cohort.
    ///
    /// Settings are cohort-wide once grouped: every member gets the same
    /// start/end values in a single multi-row upsert, so a failure cannot
    /// leave the cohort half-propagated. Passing `None` for both days
    /// reverts the cohort to calendar months.
    pub fn update_settings_for_cohort(
        &self,
        user_id: i64,
        start_day: Option<u32>,
        end_day: Option<u32>,
    ) -> Result<usize> {
        match (start_day, end_day) {
            (None, None) => {}
            (Some(s), Some(e)) => {
                if !(1..=28).contains(&s) {
                    return Err(Error::InvalidData(format!(
                        "Period start day must be 1-28, got {}",
                        s
                    )));
                }
                if !(1..=31).contains(&e) {
                    return Err(Error::InvalidData(format!(
                        "Period end day must be 1-31, got {}",
                        e
                    )));
                }
            }
            _ => {
                return Err(Error::InvalidData(
                    "Period start and end day must be set together".to_string(),
                ))
            }
        }

        let cohort = self.family_cohort(user_id)?;
        let conn = self.conn()?;

        let placeholders = vec!["?"; cohort.len()].join(", ");
        let sql = format!(
            r#"
            INSERT INTO user_settings (user_id, period_start_day, period_end_day, updated_at)
            SELECT id, ?1, ?2, CURRENT_TIMESTAMP FROM users WHERE id IN ({})
            ON CONFLICT(user_id) DO UPDATE SET
                period_start_day = excluded.period_start_day,
                period_end_day = excluded.period_end_day,
                updated_at = CURRENT_TIMESTAMP
            "#,
            placeholders
        );

        let mut query_params: Vec<Box<dyn rusqlite::ToSql>> =
            vec![Box::new(start_day), Box::new(end_day)];
        for id in &cohort {
            query_params.push(Box::new(*id));
        }
        let refs: Vec<&dyn rusqlite::ToSql> = query_params.iter().map(|p| p.as_ref()).collect();

        let updated = conn.execute(&sql, refs.as_slice())?;
        Ok(updated)
    }
}
