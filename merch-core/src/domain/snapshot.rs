//! Account snapshot: a point-in-time view of balance, inventory and history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::catalog::InventoryEntry;

/// One side of a transfer, seen from the snapshot owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEntry {
    /// Name of the other account (sender for received, receiver for sent)
    pub counterparty: String,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// Consistent view of an account, read within a single transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub account_id: Uuid,
    pub name: String,
    pub balance: i64,
    pub inventory: Vec<InventoryEntry>,
    pub received: Vec<TransferEntry>,
    pub sent: Vec<TransferEntry>,
}

impl AccountSnapshot {
    /// Quantity owned of `item`, zero if never bought
    pub fn quantity_of(&self, item: &str) -> i64 {
        self.inventory
            .iter()
            .find(|e| e.item == item)
            .map(|e| e.quantity)
            .unwrap_or(0)
    }
}

/// Store-wide totals used to check coin conservation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStatus {
    pub accounts: i64,
    pub transfers: i64,
    pub purchases: i64,
    /// Sum of all current balances
    pub circulating: i64,
    /// Sum of all starting balances
    pub issued: i64,
    /// Sum of all purchase prices
    pub spent: i64,
}

impl LedgerStatus {
    /// Coins in circulation plus coins spent equal coins issued
    pub fn is_balanced(&self) -> bool {
        self.circulating + self.spent == self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_of() {
        let snapshot = AccountSnapshot {
            account_id: Uuid::new_v4(),
            name: "alice".to_string(),
            balance: 840,
            inventory: vec![InventoryEntry { item: "t-shirt".to_string(), quantity: 2 }],
            received: vec![],
            sent: vec![],
        };
        assert_eq!(snapshot.quantity_of("t-shirt"), 2);
        assert_eq!(snapshot.quantity_of("cup"), 0);
    }

    #[test]
    fn test_status_balance_check() {
        let mut status = LedgerStatus {
            accounts: 2,
            transfers: 1,
            purchases: 1,
            circulating: 1920,
            issued: 2000,
            spent: 80,
        };
        assert!(status.is_balanced());

        status.circulating += 1;
        assert!(!status.is_balanced());
    }
}
