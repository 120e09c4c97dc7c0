//! Repository port - ledger storage abstraction

use uuid::Uuid;

use crate::domain::{Account, AccountSnapshot, CatalogItem, LedgerStatus, Purchase, Result, Transfer};

/// Ledger storage abstraction
///
/// Methods are blocking. Services call them from the blocking thread pool.
/// Every mutating method is atomic: it either applies all of its effects or
/// none of them.
pub trait LedgerRepository: Send + Sync + 'static {
    // === Accounts ===

    /// Resolve an account id by display name
    fn find_account_id(&self, name: &str) -> Result<Option<Uuid>>;

    /// Get the id and stored credential hash for a name
    fn find_credentials(&self, name: &str) -> Result<Option<(Uuid, String)>>;

    /// Insert a new account
    fn create_account(&self, account: &Account) -> Result<()>;

    // === Ledger ===

    /// Move `amount` coins from `sender` to the account named `receiver_name`
    ///
    /// Checks the sender's funds before resolving the receiver, so an
    /// oversized transfer fails with insufficient funds even when the
    /// receiver is unknown.
    fn transfer_coins(&self, sender: Uuid, receiver_name: &str, amount: i64) -> Result<Transfer>;

    /// Buy one unit of `item` for `account`
    fn purchase_item(&self, account: Uuid, item: &str) -> Result<Purchase>;

    // === Reads ===

    /// Balance, inventory and transfer history read in one transaction
    fn account_snapshot(&self, account: Uuid) -> Result<AccountSnapshot>;

    /// All catalog items, ordered by name
    fn catalog(&self) -> Result<Vec<CatalogItem>>;

    /// Store-wide totals
    fn ledger_status(&self) -> Result<LedgerStatus>;
}
