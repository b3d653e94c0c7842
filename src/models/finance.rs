use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Income,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialEntry {
    pub id: String,
    pub kind: EntryKind,
    /// Amount in cents.
    pub amount_cents: i64,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

/// Figures shown on the financial dashboard for a period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub income_cents: i64,
    pub expense_cents: i64,
    pub balance_cents: i64,
    pub patient_count: usize,
    pub active_staff_count: usize,
    pub low_stock_count: usize,
}
