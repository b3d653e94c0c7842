use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{info, instrument};

use crate::backend::{collections, insert_as, select_as, update_as, Backend, Direction, Filter};
use crate::error::{ClinicError, Result};
use crate::models::TimeClockEntry;

pub struct TimeClockService {
    backend: Arc<dyn Backend>,
}

impl TimeClockService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Entries for one staff member, most recent first.
    #[instrument(skip(self))]
    pub async fn entries_for(&self, staff_id: &str) -> Result<Vec<TimeClockEntry>> {
        select_as(
            self.backend.as_ref(),
            collections::TIME_CLOCK,
            &Filter::new()
                .where_eq("staff_id", staff_id)
                .order_by("clock_in", Direction::Desc),
        )
        .await
    }

    async fn open_entry(&self, staff_id: &str) -> Result<Option<TimeClockEntry>> {
        Ok(self
            .entries_for(staff_id)
            .await?
            .into_iter()
            .find(TimeClockEntry::is_open))
    }

    #[instrument(skip(self))]
    pub async fn clock_in(&self, staff_id: &str) -> Result<TimeClockEntry> {
        if let Some(open) = self.open_entry(staff_id).await? {
            return Err(ClinicError::Conflict(format!(
                "already clocked in since {}",
                open.clock_in.format("%Y-%m-%d %H:%M")
            )));
        }
        let entry: TimeClockEntry = insert_as(
            self.backend.as_ref(),
            collections::TIME_CLOCK,
            &json!({ "staff_id": staff_id, "clock_in": Utc::now(), "clock_out": null }),
        )
        .await?;
        info!(entry_id = %entry.id, "clocked in");
        Ok(entry)
    }

    #[instrument(skip(self))]
    pub async fn clock_out(&self, staff_id: &str) -> Result<TimeClockEntry> {
        let open = self
            .open_entry(staff_id)
            .await?
            .ok_or_else(|| ClinicError::Conflict("not clocked in".to_string()))?;
        let entry: TimeClockEntry = update_as(
            self.backend.as_ref(),
            collections::TIME_CLOCK,
            &open.id,
            json!({ "clock_out": Utc::now() }),
        )
        .await?;
        info!(entry_id = %entry.id, "clocked out");
        Ok(entry)
    }

    /// Hours worked inside `[from, to)`, counting an open entry up to `to`.
    pub async fn worked_hours(&self, staff_id: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<f64> {
        let seconds: i64 = self
            .entries_for(staff_id)
            .await?
            .iter()
            .map(|e| e.worked_within(from, to).num_seconds())
            .sum();
        Ok(seconds as f64 / 3600.0)
    }
}
