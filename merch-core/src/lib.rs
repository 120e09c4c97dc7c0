//! Merch Core - ledger engine for the company merch store
//!
//! Employees hold coin balances, send coins to each other and spend them on
//! store items. This crate keeps those balances consistent under concurrent
//! access, following hexagonal architecture:
//!
//! - **domain**: Core entities (Account, Transfer, Purchase, snapshots, errors)
//! - **ports**: Trait definitions for storage (LedgerRepository)
//! - **services**: Business logic orchestration (auth, ledger, info, status)
//! - **adapters**: Concrete implementations (DuckDB)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::duckdb::DuckDbRepository;
use config::{Config, DB_FILENAME};
use ports::LedgerRepository;
use services::*;

// Re-export commonly used types at crate root
pub use domain::{
    Account, AccountSnapshot, CatalogItem, Error, ErrorKind, InventoryEntry, LedgerStatus,
    Purchase, Transfer, TransferEntry,
};

/// Main context for store operations
///
/// Holds the repository, configuration and all services. Services share the
/// repository; each keeps its own locks and in-flight request tables.
pub struct MerchContext {
    pub config: Config,
    pub repository: Arc<DuckDbRepository>,
    pub auth_service: AuthService,
    pub ledger_service: LedgerService,
    pub info_service: InfoService,
    pub status_service: StatusService,
}

impl MerchContext {
    /// Open the store in `data_dir`, creating the database if needed
    pub fn new(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir)?;
        let db_path = data_dir.join(DB_FILENAME);
        let repository = DuckDbRepository::new(&db_path)
            .with_context(|| format!("Failed to open store at {}", db_path.display()))?;
        Self::with_repository(config, repository)
    }

    /// Build a context around an already opened repository
    pub fn with_repository(config: Config, repository: DuckDbRepository) -> Result<Self> {
        let migrations = repository
            .ensure_schema()
            .context("Failed to initialize schema")?;
        if !migrations.applied.is_empty() {
            tracing::info!(applied = ?migrations.applied, "schema upgraded");
        }

        let repository = Arc::new(repository);
        let port: Arc<dyn LedgerRepository> = repository.clone();

        Ok(Self {
            auth_service: AuthService::new(
                Arc::clone(&port),
                config.starting_balance,
                config.password_hashing.clone(),
            ),
            ledger_service: LedgerService::new(Arc::clone(&port)),
            info_service: InfoService::new(Arc::clone(&port)),
            status_service: StatusService::new(port),
            repository,
            config,
        })
    }
}
