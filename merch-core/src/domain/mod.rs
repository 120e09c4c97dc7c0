//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod account;
mod catalog;
pub mod credential;
mod ledger;
pub mod result;
mod snapshot;

pub use account::Account;
pub use catalog::{CatalogItem, InventoryEntry};
pub use credential::Argon2Params;
pub use ledger::{Purchase, Transfer};
pub use result::{Error, ErrorKind, Result};
pub use snapshot::{AccountSnapshot, LedgerStatus, TransferEntry};
