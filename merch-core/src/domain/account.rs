//! Account domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A ledger participant holding a coin balance
///
/// The credential hash is a PHC string (algorithm, parameters, salt and
/// digest in one value) and is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    /// Display name, unique across the store
    pub name: String,
    #[serde(skip)]
    pub credential_hash: String,
    pub balance: i64,
    /// Balance granted at creation, kept for conservation checks
    pub initial_balance: i64,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account holding its starting balance
    pub fn new(name: impl Into<String>, credential_hash: impl Into<String>, starting_balance: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            credential_hash: credential_hash.into(),
            balance: starting_balance,
            initial_balance: starting_balance,
            created_at: Utc::now(),
        }
    }
}
