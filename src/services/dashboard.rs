use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

use super::{InventoryService, PatientService, StaffService};
use crate::backend::{collections, select_as, Backend, Filter};
use crate::error::Result;
use crate::models::{DashboardSummary, EntryKind, FinancialEntry};

pub struct DashboardService {
    backend: Arc<dyn Backend>,
}

impl DashboardService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Financial totals for `[from, to)` plus headcounts and stock alerts.
    #[instrument(skip(self))]
    pub async fn summary(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<DashboardSummary> {
        let entries: Vec<FinancialEntry> = select_as(
            self.backend.as_ref(),
            collections::FINANCIAL_ENTRIES,
            &Filter::new(),
        )
        .await?;

        let mut summary = DashboardSummary::default();
        for entry in entries
            .iter()
            .filter(|e| e.occurred_at >= from && e.occurred_at < to)
        {
            match entry.kind {
                EntryKind::Income => summary.income_cents += entry.amount_cents,
                EntryKind::Expense => summary.expense_cents += entry.amount_cents,
            }
        }
        summary.balance_cents = summary.income_cents - summary.expense_cents;

        let patients = PatientService::new(Arc::clone(&self.backend));
        let staff = StaffService::new(Arc::clone(&self.backend));
        let inventory = InventoryService::new(Arc::clone(&self.backend));
        let (patients, staff, low_stock) =
            futures::try_join!(patients.list(), staff.list(), inventory.low_stock())?;
        summary.patient_count = patients.len();
        summary.active_staff_count = staff.iter().filter(|s| s.active).count();
        summary.low_stock_count = low_stock.len();
        Ok(summary)
    }
}
