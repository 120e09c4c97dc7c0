//! Catalog domain model

use serde::{Deserialize, Serialize};

/// An item for sale in the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub name: String,
    pub price: i64,
}

/// A quantity of one item owned by an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub item: String,
    pub quantity: i64,
}
