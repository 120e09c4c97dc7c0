//! Ledger records: coin transfers and purchases
//!
//! Both are append-only. Once written they are never updated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A coin movement between two accounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Commit order of the transfer
    pub seq: i64,
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// A coin-for-inventory exchange against the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: Uuid,
    pub account_id: Uuid,
    pub item: String,
    pub quantity: i64,
    /// Equals the catalog price at the time of purchase
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
}

impl Purchase {
    /// A single unit of `item` bought at `price`
    pub fn single(account_id: Uuid, item: impl Into<String>, price: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            item: item.into(),
            quantity: 1,
            total_price: price,
            created_at: Utc::now(),
        }
    }
}
