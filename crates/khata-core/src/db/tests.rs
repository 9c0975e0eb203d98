//! Database tests

use super::*;
use crate::models::*;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rusqlite::params;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn new_expense(date: NaiveDate, amount: f64, category: &str) -> NewExpense {
        NewExpense {
            date,
            amount,
            category: category.to_string(),
            description: None,
            payment_mode: PaymentMode::default(),
        }
    }

    /// Insert a user row directly, with optional budget and family list
    fn seed_user(
        db: &Database,
        telegram_id: i64,
        budget: Option<f64>,
        family: Option<&str>,
    ) -> i64 {
        let conn = db.conn().unwrap();
        conn.execute(
            "INSERT INTO users (telegram_user_id, first_name, budget, family) VALUES (?, ?, ?, ?)",
            params![telegram_id, format!("user{}", telegram_id), budget, family],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    #[test]
    fn test_in_memory_db() {
        let db = Database::in_memory().unwrap();
        assert!(db.get_user_by_telegram_id(42).unwrap().is_none());
    }

    #[test]
    fn test_upsert_user_idempotent() {
        let db = Database::in_memory().unwrap();

        let user = db.upsert_user(1001, Some("Asha"), None).unwrap();
        assert_eq!(user.telegram_user_id, 1001);
        assert_eq!(user.first_name.as_deref(), Some("Asha"));

        let again = db.upsert_user(1001, Some("Asha"), Some("K")).unwrap();
        assert_eq!(again.id, user.id);
        assert_eq!(again.last_name.as_deref(), Some("K"));
    }

    #[test]
    fn test_create_expense_defaults_to_cash() {
        let db = Database::in_memory().unwrap();
        let uid = seed_user(&db, 1, None, None);

        let expense = db
            .create_expense(uid, &new_expense(d(2024, 3, 5), 250.0, "Food"))
            .unwrap();
        assert_eq!(expense.payment_mode, PaymentMode::Cash);
        assert_eq!(expense.amount, 250.0);
        assert_eq!(expense.category, "Food");
    }

    #[test]
    fn test_create_expense_rejects_bad_input() {
        let db = Database::in_memory().unwrap();
        let uid = seed_user(&db, 1, None, None);

        assert!(db
            .create_expense(uid, &new_expense(d(2024, 3, 5), 0.0, "Food"))
            .is_err());
        assert!(db
            .create_expense(uid, &new_expense(d(2024, 3, 5), -10.0, "Food"))
            .is_err());
        assert!(db
            .create_expense(uid, &new_expense(d(2024, 3, 5), 10.0, "   "))
            .is_err());
    }

    #[test]
    fn test_list_expenses_for_month_filters_by_window() {
        let db = Database::in_memory().unwrap();
        let uid = seed_user(&db, 1, None, None);

        db.create_expense(uid, &new_expense(d(2024, 2, 29), 1.0, "Food"))
            .unwrap();
        db.create_expense(uid, &new_expense(d(2024, 3, 1), 2.0, "Food"))
            .unwrap();
        db.create_expense(uid, &new_expense(d(2024, 3, 31), 3.0, "Food"))
            .unwrap();
        db.create_expense(uid, &new_expense(d(2024, 4, 1), 4.0, "Food"))
            .unwrap();

        let march = db.list_expenses_for_month(uid, 2024, 3).unwrap();
        assert_eq!(march.len(), 2);
        // Newest first
        assert_eq!(march[0].date, d(2024, 3, 31));
        assert_eq!(march[1].date, d(2024, 3, 1));
    }

    #[test]
    fn test_expense_entry_days() {
        let db = Database::in_memory().unwrap();
        let uid = seed_user(&db, 1, None, None);

        db.create_expense(uid, &new_expense(d(2024, 3, 5), 1.0, "Food"))
            .unwrap();
        db.create_expense(uid, &new_expense(d(2024, 3, 5), 2.0, "Travel"))
            .unwrap();
        db.create_expense(uid, &new_expense(d(2024, 3, 12), 3.0, "Food"))
            .unwrap();

        let days = db.expense_entry_days(uid, 2024, 3).unwrap();
        assert_eq!(days, vec![5, 12]);
    }

    #[test]
    fn test_delete_expense_checks_ownership() {
        let db = Database::in_memory().unwrap();
        let alice = seed_user(&db, 1, None, None);
        let bob = seed_user(&db, 2, None, None);

        let expense = db
            .create_expense(alice, &new_expense(d(2024, 3, 5), 10.0, "Food"))
            .unwrap();

        assert!(!db.delete_expense(bob, expense.id).unwrap());
        assert!(db.delete_expense(alice, expense.id).unwrap());
        assert!(!db.delete_expense(alice, expense.id).unwrap());
    }

    #[test]
    fn test_corrupt_user_row_surfaces_as_error() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();
        // A text budget breaks row mapping; that must not read as "no user"
        conn.execute(
            "INSERT INTO users (telegram_user_id, budget) VALUES (?, ?)",
            params![777, "oops"],
        )
        .unwrap();
        drop(conn);

        assert!(db.get_user_by_telegram_id(777).is_err());
        assert!(db.budget_snapshot(777, 2024, 3, d(2024, 3, 10)).is_err());
    }

    // ========== Cohort resolution ==========

    #[test]
    fn test_cohort_defaults_to_singleton() {
        let db = Database::in_memory().unwrap();
        let uid = seed_user(&db, 1, None, None);
        assert_eq!(db.family_cohort(uid).unwrap(), vec![uid]);
    }

    #[test]
    fn test_cohort_parses_json_list() {
        let db = Database::in_memory().unwrap();
        let a = seed_user(&db, 1, None, None);
        let b = seed_user(&db, 2, None, None);
        let conn = db.conn().unwrap();
        conn.execute(
            "UPDATE users SET family = ? WHERE id = ?",
            params![format!("[{}, {}]", a, b), a],
        )
        .unwrap();

        assert_eq!(db.family_cohort(a).unwrap(), vec![a, b]);
    }

    #[test]
    fn test_cohort_parses_comma_list() {
        let db = Database::in_memory().unwrap();
        let a = seed_user(&db, 1, None, None);
        let b = seed_user(&db, 2, None, None);
        let conn = db.conn().unwrap();
        conn.execute(
            "UPDATE users SET family = ? WHERE id = ?",
            params![format!("{}, {}", a, b), b],
        )
        .unwrap();

        assert_eq!(db.family_cohort(b).unwrap(), vec![a, b]);
    }

    #[test]
    fn test_cohort_degrades_on_malformed_data() {
        let db = Database::in_memory().unwrap();
        let uid = seed_user(&db, 1, None, Some("not a list"));
        assert_eq!(db.family_cohort(uid).unwrap(), vec![uid]);

        let uid2 = seed_user(&db, 2, None, Some("[1, \"x\"]"));
        assert_eq!(db.family_cohort(uid2).unwrap(), vec![uid2]);

        let uid3 = seed_user(&db, 3, None, Some(""));
        assert_eq!(db.family_cohort(uid3).unwrap(), vec![uid3]);
    }

    #[test]
    fn test_cohort_always_contains_self() {
        let db = Database::in_memory().unwrap();
        let a = seed_user(&db, 1, None, None);
        let b = seed_user(&db, 2, None, None);
        let conn = db.conn().unwrap();
        // Family list that forgot to include the owner
        conn.execute(
            "UPDATE users SET family = ? WHERE id = ?",
            params![format!("[{}]", a), b],
        )
        .unwrap();

        assert_eq!(db.family_cohort(b).unwrap(), vec![a, b]);
    }

    // ========== Budget resolution ==========

    #[test]
    fn test_first_positive_budget_lowest_id_wins() {
        let db = Database::in_memory().unwrap();
        let a = seed_user(&db, 1, Some(5000.0), None);
        let b = seed_user(&db, 2, Some(9000.0), None);

        assert_eq!(db.first_positive_budget(&[a, b]).unwrap(), Some(5000.0));
        assert_eq!(db.first_positive_budget(&[b]).unwrap(), Some(9000.0));
    }

    #[test]
    fn test_first_positive_budget_skips_null_and_nonpositive() {
        let db = Database::in_memory().unwrap();
        let a = seed_user(&db, 1, None, None);
        let b = seed_user(&db, 2, Some(-100.0), None);
        let c = seed_user(&db, 3, Some(3000.0), None);

        assert_eq!(db.first_positive_budget(&[a, b, c]).unwrap(), Some(3000.0));
        assert_eq!(db.first_positive_budget(&[a, b]).unwrap(), None);
    }

    // ========== Aggregation ==========

    #[test]
    fn test_sum_excludes_transfers() {
        let db = Database::in_memory().unwrap();
        let uid = seed_user(&db, 1, None, None);

        db.create_expense(uid, &new_expense(d(2024, 3, 5), 100.0, "Food"))
            .unwrap();
        db.create_expense(uid, &new_expense(d(2024, 3, 6), 400.0, "Transfers"))
            .unwrap();

        let total = db
            .sum_expenses(&[uid], d(2024, 3, 1), d(2024, 4, 1))
            .unwrap();
        assert_eq!(total, 100.0);
    }

    #[test]
    fn test_sum_respects_half_open_window() {
        let db = Database::in_memory().unwrap();
        let uid = seed_user(&db, 1, None, None);

        db.create_expense(uid, &new_expense(d(2024, 3, 15), 10.0, "Food"))
            .unwrap();
        db.create_expense(uid, &new_expense(d(2024, 4, 15), 20.0, "Food"))
            .unwrap();

        // [Mar 15, Apr 15): start inclusive, end exclusive
        let total = db
            .sum_expenses(&[uid], d(2024, 3, 15), d(2024, 4, 15))
            .unwrap();
        assert_eq!(total, 10.0);
    }

    #[test]
    fn test_sum_spans_cohort() {
        let db = Database::in_memory().unwrap();
        let a = seed_user(&db, 1, None, None);
        let b = seed_user(&db, 2, None, None);

        db.create_expense(a, &new_expense(d(2024, 3, 5), 100.0, "Food"))
            .unwrap();
        db.create_expense(b, &new_expense(d(2024, 3, 6), 50.0, "Food"))
            .unwrap();

        let total = db
            .sum_expenses(&[a, b], d(2024, 3, 1), d(2024, 4, 1))
            .unwrap();
        assert_eq!(total, 150.0);
    }

    // ========== Snapshot ==========

    #[test]
    fn test_snapshot_unknown_user_is_safe_empty_state() {
        let db = Database::in_memory().unwrap();

        let snap = db.budget_snapshot(99999, 2024, 3, d(2024, 3, 10)).unwrap();
        assert_eq!(snap.total_expenses, 0.0);
        assert_eq!(snap.budget, None);
        assert!(!snap.is_family);
        assert_eq!(snap.family_members, 1);
        assert_eq!(snap.budget_percentage, 0.0);
        assert_eq!(snap.date_percentage, 0.0);
        assert!(!snap.custom_period);
    }

    #[test]
    fn test_snapshot_rejects_invalid_month() {
        let db = Database::in_memory().unwrap();
        seed_user(&db, 777, None, None);

        assert!(db.budget_snapshot(777, 2024, 13, d(2024, 3, 10)).is_err());
        assert!(db.budget_snapshot(777, 2024, 0, d(2024, 3, 10)).is_err());
    }

    #[test]
    fn test_snapshot_calendar_month() {
        let db = Database::in_memory().unwrap();
        let uid = seed_user(&db, 777, Some(1000.0), None);

        db.create_expense(uid, &new_expense(d(2024, 2, 10), 300.0, "Food"))
            .unwrap();
        db.create_expense(uid, &new_expense(d(2024, 2, 11), 200.0, "Transfers"))
            .unwrap();

        let snap = db.budget_snapshot(777, 2024, 2, d(2024, 2, 15)).unwrap();
        assert_eq!(snap.total_expenses, 300.0);
        assert_eq!(snap.budget, Some(1000.0));
        assert_eq!(snap.current_date, 15);
        assert_eq!(snap.days_in_month, 29);
        assert_eq!(snap.budget_percentage, 30.0);
        assert_eq!(snap.period_start, "2024-02-01");
        assert_eq!(snap.period_end, "2024-03-01");
        assert_eq!(snap.currency, CURRENCY);
    }

    #[test]
    fn test_snapshot_budget_percentage_capped() {
        let db = Database::in_memory().unwrap();
        let uid = seed_user(&db, 777, Some(100.0), None);

        db.create_expense(uid, &new_expense(d(2024, 2, 10), 200.0, "Food"))
            .unwrap();

        let snap = db.budget_snapshot(777, 2024, 2, d(2024, 2, 15)).unwrap();
        // Spend is reported uncapped, percentage is not
        assert_eq!(snap.total_expenses, 200.0);
        assert_eq!(snap.budget_percentage, 100.0);
    }

    #[test]
    fn test_snapshot_custom_period() {
        let db = Database::in_memory().unwrap();
        let uid = seed_user(&db, 777, None, None);
        db.update_settings_for_cohort(uid, Some(15), Some(14)).unwrap();

        // Expense inside the [Feb 15, Mar 15) cycle but outside calendar March
        db.create_expense(uid, &new_expense(d(2024, 2, 20), 111.0, "Food"))
            .unwrap();

        let snap = db.budget_snapshot(777, 2024, 3, d(2024, 3, 10)).unwrap();
        assert!(snap.custom_period);
        assert_eq!(snap.period_start, "2024-02-15");
        assert_eq!(snap.period_end, "2024-03-15");
        assert_eq!(snap.total_expenses, 111.0);
        assert_eq!(snap.current_date, 25);
        assert_eq!(snap.days_in_month, 29);
    }

    #[test]
    fn test_snapshot_family_budget_from_lowest_id() {
        let db = Database::in_memory().unwrap();
        let a = seed_user(&db, 1, Some(4000.0), None);
        let b = seed_user(&db, 2, Some(8000.0), None);
        let conn = db.conn().unwrap();
        let family = format!("[{}, {}]", a, b);
        conn.execute(
            "UPDATE users SET family = ?1 WHERE id IN (?2, ?3)",
            params![family, a, b],
        )
        .unwrap();

        db.create_expense(a, &new_expense(d(2024, 3, 5), 100.0, "Food"))
            .unwrap();
        db.create_expense(b, &new_expense(d(2024, 3, 6), 300.0, "Food"))
            .unwrap();

        // Member b requests: budget still comes from a (lowest id)
        let snap = db.budget_snapshot(2, 2024, 3, d(2024, 3, 10)).unwrap();
        assert!(snap.is_family);
        assert_eq!(snap.family_members, 2);
        assert_eq!(snap.budget, Some(4000.0));
        assert_eq!(snap.total_expenses, 400.0);
        assert_eq!(snap.budget_percentage, 10.0);
    }

    #[test]
    fn test_snapshot_singleton_uses_own_budget() {
        let db = Database::in_memory().unwrap();
        seed_user(&db, 1, Some(4000.0), None);
        let uid = seed_user(&db, 2, None, None);

        db.create_expense(uid, &new_expense(d(2024, 3, 5), 100.0, "Food"))
            .unwrap();

        let snap = db.budget_snapshot(2, 2024, 3, d(2024, 3, 10)).unwrap();
        assert_eq!(snap.budget, None);
        assert_eq!(snap.budget_percentage, 0.0);
    }

    // ========== Settings ==========

    #[test]
    fn test_settings_validation() {
        let db = Database::in_memory().unwrap();
        let uid = seed_user(&db, 1, None, None);

        assert!(db.update_settings_for_cohort(uid, Some(0), Some(14)).is_err());
        assert!(db.update_settings_for_cohort(uid, Some(29), Some(14)).is_err());
        assert!(db.update_settings_for_cohort(uid, Some(15), Some(32)).is_err());
        assert!(db.update_settings_for_cohort(uid, Some(15), None).is_err());
        assert!(db.update_settings_for_cohort(uid, None, Some(14)).is_err());
    }

    #[test]
    fn test_settings_propagate_to_cohort() {
        let db = Database::in_memory().unwrap();
        let a = seed_user(&db, 1, None, None);
        let b = seed_user(&db, 2, None, None);
        let conn = db.conn().unwrap();
        let family = format!("[{}, {}]", a, b);
        conn.execute(
            "UPDATE users SET family = ?1 WHERE id IN (?2, ?3)",
            params![family, a, b],
        )
        .unwrap();
        drop(conn);

        let updated = db.update_settings_for_cohort(a, Some(15), Some(14)).unwrap();
        assert_eq!(updated, 2);

        let for_b = db.get_user_settings(b).unwrap().unwrap();
        assert_eq!(for_b.period_start_day, Some(15));
        assert_eq!(for_b.period_end_day, Some(14));
    }

    #[test]
    fn test_settings_reset_to_calendar() {
        let db = Database::in_memory().unwrap();
        let uid = seed_user(&db, 1, None, None);

        db.update_settings_for_cohort(uid, Some(15), Some(14)).unwrap();
        db.update_settings_for_cohort(uid, None, None).unwrap();

        let settings = db.get_user_settings(uid).unwrap().unwrap();
        assert_eq!(settings.period_start_day, None);
        assert_eq!(settings.period_end_day, None);
    }

    // ========== Onboarding ==========

    #[test]
    fn test_onboarding_defaults() {
        let db = Database::in_memory().unwrap();
        let uid = seed_user(&db, 1, None, None);

        let progress = db.get_onboarding(uid).unwrap();
        assert_eq!(progress.current_step, 0);
        assert!(!progress.completed);
    }

    #[test]
    fn test_onboarding_completed_is_sticky() {
        let db = Database::in_memory().unwrap();
        let uid = seed_user(&db, 1, None, None);

        db.set_onboarding(uid, 3, true).unwrap();
        let progress = db.set_onboarding(uid, 1, false).unwrap();
        assert_eq!(progress.current_step, 1);
        assert!(progress.completed);
    }

    #[test]
    fn test_set_user_budget() {
        let db = Database::in_memory().unwrap();
        let uid = seed_user(&db, 1, None, None);

        db.set_user_budget(uid, Some(2500.0)).unwrap();
        let user = db.get_user(uid).unwrap().unwrap();
        assert_eq!(user.budget, Some(2500.0));

        assert!(db.set_user_budget(uid, Some(0.0)).is_err());

        db.set_user_budget(uid, None).unwrap();
        let user = db.get_user(uid).unwrap().unwrap();
        assert_eq!(user.budget, None);
    }
}
