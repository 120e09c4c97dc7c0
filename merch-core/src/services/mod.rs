//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area. Storage calls are
//! blocking and run on tokio's blocking pool.

mod auth;
mod dedup;
mod info;
mod ledger;
mod locks;
pub mod migration;
mod status;

pub use auth::AuthService;
pub use dedup::RequestGroup;
pub use info::InfoService;
pub use ledger::LedgerService;
pub use locks::{KeyedGuard, KeyedLocks};
pub use migration::{MigrationResult, MigrationService};
pub use status::StatusService;

use crate::domain::Result;

/// Run a blocking storage call off the async workers
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}
