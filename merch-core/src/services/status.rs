//! Status service - store-wide ledger summary

use std::sync::Arc;

use super::run_blocking;
use crate::domain::{LedgerStatus, Result};
use crate::ports::LedgerRepository;

/// Status service for conservation checks
pub struct StatusService {
    repository: Arc<dyn LedgerRepository>,
}

impl StatusService {
    pub fn new(repository: Arc<dyn LedgerRepository>) -> Self {
        Self { repository }
    }

    /// Get overall ledger totals
    pub async fn get_status(&self) -> Result<LedgerStatus> {
        let repo = Arc::clone(&self.repository);
        let status = run_blocking(move || repo.ledger_status()).await?;
        if !status.is_balanced() {
            tracing::warn!(
                circulating = status.circulating,
                spent = status.spent,
                issued = status.issued,
                "ledger does not balance"
            );
        }
        Ok(status)
    }
}
