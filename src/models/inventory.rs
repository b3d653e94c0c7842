use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Inventory category, also the `:type` segment of `/inventory/:type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryKind {
    Medication,
    Supply,
    Equipment,
}

impl InventoryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InventoryKind::Medication => "medication",
            InventoryKind::Supply => "supply",
            InventoryKind::Equipment => "equipment",
        }
    }
}

impl fmt::Display for InventoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InventoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "medication" => Ok(InventoryKind::Medication),
            "supply" => Ok(InventoryKind::Supply),
            "equipment" => Ok(InventoryKind::Equipment),
            other => Err(format!("unknown inventory type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub kind: InventoryKind,
    pub quantity: i64,
    pub min_quantity: i64,
    pub unit: Option<String>,
}

impl InventoryItem {
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_quantity
    }
}
