//! Budget-period calendar arithmetic
//!
//! An accounting period is a half-open date interval `[start, end)`. It is
//! either calendar-aligned (the 1st through the end of a month) or anchored
//! to a user-configured start day S (the S-th of one month through the day
//! before the S-th of the next). All comparisons use whole local calendar
//! days; there is no fractional-day math anywhere in this module.

use chrono::{Datelike, Months, NaiveDate};

use crate::error::{Error, Result};

/// A resolved accounting period plus the caller's position within it
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodWindow {
    /// Inclusive start of the period
    pub start: NaiveDate,
    /// Exclusive end of the period
    pub end: NaiveDate,
    /// 1-based ordinal of `today` within the period ("day N of M").
    /// Defaults to 1 when `today` falls outside the window.
    pub position: i64,
    /// Total length of the period in days
    pub total_days: i64,
    /// Whether a custom start day was in effect
    pub custom: bool,
}

impl PeriodWindow {
    /// Elapsed-time percentage ("day N of M"). Deliberately uncapped:
    /// under clock skew the position can exceed the period length and the
    /// caller sees that rather than a silent 100.
    pub fn date_percentage(&self) -> f64 {
        if self.total_days <= 0 {
            return 0.0;
        }
        100.0 * self.position as f64 / self.total_days as f64
    }
}

/// Spend-to-budget percentage, capped at 100 for display.
///
/// A missing or non-positive budget yields 0. The cap applies to the
/// percentage only; the raw expense total is reported separately.
pub fn budget_percentage(total_expenses: f64, budget: Option<f64>) -> f64 {
    match budget {
        Some(b) if b > 0.0 => (100.0 * total_expenses / b).min(100.0),
        _ => 0.0,
    }
}

/// Number of days in a calendar month
pub fn days_in_month(year: i32, month: u32) -> Result<i64> {
    let first = first_of_month(year, month)?;
    let next = first
        .checked_add_months(Months::new(1))
        .ok_or_else(|| Error::InvalidData(format!("Month out of range: {}-{}", year, month)))?;
    Ok((next - first).num_days())
}

/// Resolve the active accounting period.
///
/// With no custom start day the window is the viewed calendar month
/// `[year-month-01, nextMonth-01)` and the position is today's day-of-month.
///
/// With a custom start day S the window anchors to S relative to `today`
/// (not to the viewed month): if today's day-of-month is >= S the cycle
/// began on the S-th of today's month, otherwise on the S-th of the
/// previous month. The cycle runs exactly one calendar month. When `today`
/// falls outside the resolved window (e.g. viewing a non-current month)
/// the position degrades to 1.
pub fn resolve_window(
    custom_start_day: Option<u32>,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Result<PeriodWindow> {
    match custom_start_day {
        None => {
            let start = first_of_month(year, month)?;
            let end = start.checked_add_months(Months::new(1)).ok_or_else(|| {
                Error::InvalidData(format!("Month out of range: {}-{}", year, month))
            })?;
            Ok(PeriodWindow {
                start,
                end,
                position: today.day() as i64,
                total_days: (end - start).num_days(),
                custom: false,
            })
        }
        Some(s) => {
            if !(1..=28).contains(&s) {
                return Err(Error::InvalidData(format!(
                    "Period start day must be 1-28, got {}",
                    s
                )));
            }
            // Anchor to today's cycle, not the viewed month
            let anchor = if today.day() >= s {
                with_day(today, s)?
            } else {
                let prev = today
                    .checked_sub_months(Months::new(1))
                    .ok_or_else(|| Error::InvalidData("Date out of range".to_string()))?;
                with_day(prev, s)?
            };
            let end = anchor
                .checked_add_months(Months::new(1))
                .ok_or_else(|| Error::InvalidData("Date out of range".to_string()))?;

            let position = if today >= anchor && today < end {
                (today - anchor).num_days() + 1
            } else {
                1
            };

            Ok(PeriodWindow {
                start: anchor,
                end,
                position,
                total_days: (end - anchor).num_days(),
                custom: true,
            })
        }
    }
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::InvalidData(format!("Invalid year/month: {}-{}", year, month)))
}

fn with_day(date: NaiveDate, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), day).ok_or_else(|| {
        Error::InvalidData(format!(
            "Invalid day {} for {}-{}",
            day,
            date.year(),
            date.month()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2).unwrap(), 29);
        assert_eq!(days_in_month(2023, 2).unwrap(), 28);
        assert_eq!(days_in_month(2024, 4).unwrap(), 30);
        assert_eq!(days_in_month(2024, 12).unwrap(), 31);
    }

    #[test]
    fn test_calendar_window() {
        let w = resolve_window(None, 2024, 2, d(2024, 2, 10)).unwrap();
        assert_eq!(w.start, d(2024, 2, 1));
        assert_eq!(w.end, d(2024, 3, 1));
        assert_eq!(w.position, 10);
        assert_eq!(w.total_days, 29);
        assert!(!w.custom);
    }

    #[test]
    fn test_calendar_window_december_rollover() {
        let w = resolve_window(None, 2023, 12, d(2023, 12, 31)).unwrap();
        assert_eq!(w.end, d(2024, 1, 1));
        assert_eq!(w.total_days, 31);
        assert_eq!(w.position, 31);
    }

    #[test]
    fn test_custom_window_after_start_day() {
        // Today is the 20th, start day 15: cycle is [15th, next 15th)
        let w = resolve_window(Some(15), 2024, 3, d(2024, 3, 20)).unwrap();
        assert_eq!(w.start, d(2024, 3, 15));
        assert_eq!(w.end, d(2024, 4, 15));
        assert_eq!(w.position, 6); // 15th is day 1
        assert_eq!(w.total_days, 31);
        assert!(w.custom);
    }

    #[test]
    fn test_custom_window_before_start_day() {
        // Today is the 10th, start day 15: cycle began in the previous month
        let w = resolve_window(Some(15), 2024, 3, d(2024, 3, 10)).unwrap();
        assert_eq!(w.start, d(2024, 2, 15));
        assert_eq!(w.end, d(2024, 3, 15));
        assert_eq!(w.position, 25); // Feb 15 (leap year) .. Mar 10
        assert_eq!(w.total_days, 29);
    }

    #[test]
    fn test_custom_window_on_start_day() {
        let w = resolve_window(Some(15), 2024, 3, d(2024, 3, 15)).unwrap();
        assert_eq!(w.start, d(2024, 3, 15));
        assert_eq!(w.position, 1);
    }

    #[test]
    fn test_custom_window_january_wraps_to_december() {
        let w = resolve_window(Some(20), 2024, 1, d(2024, 1, 5)).unwrap();
        assert_eq!(w.start, d(2023, 12, 20));
        assert_eq!(w.end, d(2024, 1, 20));
    }

    #[test]
    fn test_custom_start_day_out_of_range_rejected() {
        assert!(resolve_window(Some(0), 2024, 3, d(2024, 3, 1)).is_err());
        assert!(resolve_window(Some(29), 2024, 3, d(2024, 3, 1)).is_err());
    }

    #[test]
    fn test_date_percentage_uncapped() {
        let w = PeriodWindow {
            start: d(2024, 4, 1),
            end: d(2024, 5, 1),
            position: 40,
            total_days: 30,
            custom: false,
        };
        let pct = w.date_percentage();
        assert!((pct - 133.333).abs() < 0.01);
    }

    #[test]
    fn test_budget_percentage_capped() {
        // Double the budget still reports exactly 100
        assert_eq!(budget_percentage(2000.0, Some(1000.0)), 100.0);
        assert_eq!(budget_percentage(500.0, Some(1000.0)), 50.0);
        assert_eq!(budget_percentage(500.0, None), 0.0);
        assert_eq!(budget_percentage(500.0, Some(0.0)), 0.0);
        assert_eq!(budget_percentage(500.0, Some(-10.0)), 0.0);
    }

    #[test]
    fn test_invalid_month_rejected() {
        assert!(resolve_window(None, 2024, 13, d(2024, 1, 1)).is_err());
        assert!(resolve_window(None, 2024, 0, d(2024, 1, 1)).is_err());
    }
}
