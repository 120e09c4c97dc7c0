//! Ledger service - coin transfers and purchases
//!
//! Each mutation locks the accounts it touches (ascending id order) and then
//! runs one storage transaction. The lock makes the balance check inside the
//! transaction authoritative: no other ledger write on those accounts can
//! commit between the check and the debit.

use std::sync::Arc;

use uuid::Uuid;

use super::{run_blocking, KeyedLocks};
use crate::domain::{CatalogItem, Error, Purchase, Result, Transfer};
use crate::ports::LedgerRepository;

/// Ledger service for balance-mutating operations
pub struct LedgerService {
    repository: Arc<dyn LedgerRepository>,
    accounts: KeyedLocks<Uuid>,
}

impl LedgerService {
    pub fn new(repository: Arc<dyn LedgerRepository>) -> Self {
        Self {
            repository,
            accounts: KeyedLocks::new(),
        }
    }

    /// Send `amount` coins from `sender` to the account named `receiver_name`
    pub async fn transfer(&self, sender: Uuid, receiver_name: &str, amount: i64) -> Result<Transfer> {
        if amount <= 0 {
            return Err(Error::validation(format!("Amount must be positive, got {}", amount)));
        }
        if receiver_name.is_empty() {
            return Err(Error::validation("Receiver name must not be empty"));
        }

        // Ids never change, so the receiver can be resolved before locking.
        // An unknown receiver still goes through the transaction: it decides
        // between insufficient funds and not found.
        let repo = Arc::clone(&self.repository);
        let name = receiver_name.to_string();
        let receiver = run_blocking(move || repo.find_account_id(&name)).await?;

        let mut keys = vec![sender];
        keys.extend(receiver);
        let _locks = self.accounts.lock_all(&keys).await;

        let repo = Arc::clone(&self.repository);
        let name = receiver_name.to_string();
        let result = run_blocking(move || repo.transfer_coins(sender, &name, amount)).await;

        match &result {
            Ok(transfer) => tracing::info!(
                seq = transfer.seq,
                from = %sender,
                to = %transfer.to_account_id,
                amount,
                "coins transferred"
            ),
            Err(e) => tracing::warn!(
                from = %sender,
                to = receiver_name,
                amount,
                error = %e,
                "transfer rejected"
            ),
        }
        result
    }

    /// Buy one unit of `item` for `account`
    pub async fn purchase(&self, account: Uuid, item: &str) -> Result<Purchase> {
        if item.is_empty() {
            return Err(Error::validation("Item name must not be empty"));
        }

        let _lock = self.accounts.lock_all(&[account]).await;

        let repo = Arc::clone(&self.repository);
        let item_name = item.to_string();
        let result = run_blocking(move || repo.purchase_item(account, &item_name)).await;

        match &result {
            Ok(purchase) => tracing::info!(
                purchase_id = %purchase.id,
                account = %account,
                item,
                price = purchase.total_price,
                "item purchased"
            ),
            Err(e) => tracing::warn!(account = %account, item, error = %e, "purchase rejected"),
        }
        result
    }

    /// Items for sale, ordered by name
    pub async fn catalog(&self) -> Result<Vec<CatalogItem>> {
        let repo = Arc::clone(&self.repository);
        run_blocking(move || repo.catalog()).await
    }
}
