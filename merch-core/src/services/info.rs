//! Info service - aggregated account view

use std::sync::Arc;

use uuid::Uuid;

use super::{run_blocking, RequestGroup};
use crate::domain::{AccountSnapshot, Result};
use crate::ports::LedgerRepository;

/// Info service for account snapshots
pub struct InfoService {
    repository: Arc<dyn LedgerRepository>,
    requests: RequestGroup<AccountSnapshot>,
}

impl InfoService {
    pub fn new(repository: Arc<dyn LedgerRepository>) -> Self {
        Self {
            repository,
            requests: RequestGroup::new(),
        }
    }

    /// Balance, inventory and transfer history of `account`
    ///
    /// Concurrent requests for the same account share one read.
    pub async fn get_info(&self, account: Uuid) -> Result<AccountSnapshot> {
        let repo = Arc::clone(&self.repository);
        self.requests
            .run(format!("info:{}", account), move || {
                run_blocking(move || repo.account_snapshot(account))
            })
            .await
    }
}
