use std::sync::Arc;

use serde_json::json;
use tracing::{info, instrument, warn};

use crate::backend::{collections, select_as, update_as, Backend, Direction, Filter};
use crate::error::{ClinicError, Result};
use crate::models::{InventoryItem, InventoryKind};

pub struct InventoryService {
    backend: Arc<dyn Backend>,
}

impl InventoryService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Items of one kind, as shown on `/inventory/:type`.
    #[instrument(skip(self))]
    pub async fn list(&self, kind: InventoryKind) -> Result<Vec<InventoryItem>> {
        select_as(
            self.backend.as_ref(),
            collections::INVENTORY,
            &Filter::new()
                .where_eq("kind", kind.as_str())
                .order_by("name", Direction::Asc),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<InventoryItem>> {
        select_as(
            self.backend.as_ref(),
            collections::INVENTORY,
            &Filter::new().order_by("name", Direction::Asc),
        )
        .await
    }

    /// Items at or below their minimum quantity.
    pub async fn low_stock(&self) -> Result<Vec<InventoryItem>> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .filter(InventoryItem::is_low_stock)
            .collect())
    }

    /// Add `delta` (negative to consume) to an item's quantity.
    #[instrument(skip(self))]
    pub async fn adjust_stock(&self, item_id: &str, delta: i64) -> Result<InventoryItem> {
        let item = select_as::<InventoryItem>(
            self.backend.as_ref(),
            collections::INVENTORY,
            &Filter::new().where_eq("id", item_id),
        )
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ClinicError::Validation(format!("unknown inventory item {}", item_id)))?;

        let quantity = item.quantity + delta;
        if quantity < 0 {
            return Err(ClinicError::Conflict(format!(
                "only {} of {} in stock",
                item.quantity, item.name
            )));
        }

        let updated: InventoryItem = update_as(
            self.backend.as_ref(),
            collections::INVENTORY,
            item_id,
            json!({ "quantity": quantity }),
        )
        .await?;
        if updated.is_low_stock() {
            warn!(item = %updated.name, quantity = updated.quantity, "stock at or below minimum");
        }
        info!(item = %updated.name, delta, quantity = updated.quantity, "stock adjusted");
        Ok(updated)
    }
}
