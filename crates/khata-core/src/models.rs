//! Domain models for Khata

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Fixed currency label reported in budget snapshots
pub const CURRENCY: &str = "₹";

/// Category excluded from budget aggregation (inter-account transfers)
pub const TRANSFERS_CATEGORY: &str = "Transfers";

/// A registered Telegram user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub telegram_user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Monthly budget, if the user has configured one
    pub budget: Option<f64>,
    /// Serialized family-membership list (internal user ids, including self).
    /// Parsed defensively; anything unreadable means a singleton cohort.
    pub family: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

/// Budget-period configuration for a user (cohort-wide once grouped)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    pub user_id: i64,
    /// Day of month the accounting period starts on (1-28); None = calendar month
    pub period_start_day: Option<u32>,
    /// Day of month the accounting period ends on (1-31)
    pub period_end_day: Option<u32>,
    pub updated_at: DateTime<Utc>,
}

/// Payment mode for an expense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PaymentMode {
    #[serde(rename = "UPI")]
    Upi,
    #[serde(rename = "CASH")]
    #[default]
    Cash,
    #[serde(rename = "DEBIT CARD")]
    DebitCard,
    #[serde(rename = "CREDIT CARD")]
    CreditCard,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upi => "UPI",
            Self::Cash => "CASH",
            Self::DebitCard => "DEBIT CARD",
            Self::CreditCard => "CREDIT CARD",
        }
    }
}

impl std::str::FromStr for PaymentMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "UPI" => Ok(Self::Upi),
            "CASH" => Ok(Self::Cash),
            "DEBIT CARD" | "DEBIT" => Ok(Self::DebitCard),
            "CREDIT CARD" | "CREDIT" => Ok(Self::CreditCard),
            _ => Err(format!("Unknown payment mode: {}", s)),
        }
    }
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded expense
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub amount: f64,
    pub category: String,
    pub description: Option<String>,
    pub payment_mode: PaymentMode,
    pub created_at: DateTime<Utc>,
}

/// Input for creating an expense
#[derive(Debug, Clone, Deserialize)]
pub struct NewExpense {
    pub date: NaiveDate,
    pub amount: f64,
    pub category: String,
    pub description: Option<String>,
    #[serde(default)]
    pub payment_mode: PaymentMode,
}

/// Onboarding progress for a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingProgress {
    pub user_id: i64,
    pub current_step: i64,
    pub completed: bool,
    pub updated_at: DateTime<Utc>,
}

/// Family cohort view for a user
#[derive(Debug, Clone, Serialize)]
pub struct FamilyInfo {
    pub is_family: bool,
    pub members: Vec<User>,
}

/// Aggregated budget view for one accounting period
///
/// This is the wire contract consumed by the Mini App dashboard widget.
/// Computed fresh on every request; never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSnapshot {
    pub total_expenses: f64,
    pub budget: Option<f64>,
    /// 1-based position of today within the resolved period
    pub current_date: i64,
    /// Total days in the resolved period
    pub days_in_month: i64,
    /// Spend-to-budget ratio, capped at 100 for display
    pub budget_percentage: f64,
    /// Elapsed-time-in-period ratio, uncapped
    pub date_percentage: f64,
    pub currency: String,
    pub is_family: bool,
    pub family_members: i64,
    pub custom_period: bool,
    /// ISO-8601 period start (inclusive)
    pub period_start: String,
    /// ISO-8601 period end (exclusive)
    pub period_end: String,
}
