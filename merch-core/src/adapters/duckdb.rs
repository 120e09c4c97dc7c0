//! DuckDB repository implementation
//!
//! One database handle is opened per process. Every operation works on its
//! own connection cloned from that handle, so concurrent callers run
//! concurrent DuckDB transactions instead of queueing on a single connection.
//!
//! Ledger mutations run inside an explicit transaction. DuckDB gives each
//! transaction a snapshot and rejects write-write conflicts at update time;
//! such a conflict is surfaced as an internal error, never retried here.
//! A `duckdb::Transaction` rolls back when dropped, so any early return
//! leaves no partial effect behind.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use duckdb::{params, Connection};
use uuid::Uuid;

use crate::domain::{
    Account, AccountSnapshot, CatalogItem, Error, InventoryEntry, LedgerStatus, Purchase, Result,
    Transfer, TransferEntry,
};
use crate::ports::LedgerRepository;
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of attempts when the database file is locked at open time
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an open error indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("could not set lock on file")
}

/// DuckDB repository implementation
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl DuckDbRepository {
    /// Open (or create) the database file at `db_path`
    ///
    /// Retries with exponential backoff while another process holds the
    /// file lock. This only covers opening the file; ledger operations are
    /// never retried.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut attempt = 0;
        loop {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: Some(db_path.to_path_buf()),
                    });
                }
                Err(e) if attempt + 1 < MAX_RETRIES && is_retryable_error(&e.to_string()) => {
                    let delay = Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                    tracing::warn!(
                        attempt = attempt + 1,
                        max = MAX_RETRIES,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "database busy, retrying open"
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => {
                    return Err(Error::internal(
                        format!("Failed to open database {}", db_path.display()),
                        e,
                    ))
                }
            }
        }
    }

    /// Open a private in-memory database
    pub fn in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: None,
        })
    }

    fn try_open_connection(db_path: &Path) -> duckdb::Result<Connection> {
        // Extension autoloading stays off: the schema needs no extensions
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Connection::open_with_flags(db_path, config)
    }

    /// Path of the database file, `None` for in-memory databases
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// A fresh connection to the shared database
    fn connect(&self) -> Result<Connection> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| Error::internal_msg("Database handle lock poisoned"))?;
        Ok(conn.try_clone()?)
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<MigrationResult> {
        let conn = self.connect()?;
        MigrationService::new(&conn).run_pending()
    }
}

impl LedgerRepository for DuckDbRepository {
    // === Account operations ===

    fn find_account_id(&self, name: &str) -> Result<Option<Uuid>> {
        let conn = self.connect()?;
        fetch_account_id(&conn, name)
    }

    fn find_credentials(&self, name: &str) -> Result<Option<(Uuid, String)>> {
        let conn = self.connect()?;
        let row = conn.query_row(
            "SELECT account_id, credential_hash FROM accounts WHERE name = ?",
            [name],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        );
        match row {
            Ok((id, hash)) => Ok(Some((parse_id(&id)?, hash))),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn create_account(&self, account: &Account) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO accounts (account_id, name, credential_hash, balance, initial_balance, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                account.id.to_string(),
                account.name,
                account.credential_hash,
                account.balance,
                account.initial_balance,
                account.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // === Ledger operations ===

    fn transfer_coins(&self, sender: Uuid, receiver_name: &str, amount: i64) -> Result<Transfer> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        let balance = fetch_balance(&tx, sender)?;
        if balance < amount {
            return Err(Error::InsufficientFunds {
                balance,
                required: amount,
            });
        }

        let receiver = fetch_account_id(&tx, receiver_name)?
            .ok_or_else(|| Error::not_found(format!("Account '{}'", receiver_name)))?;
        if receiver == sender {
            return Err(Error::validation("Cannot transfer coins to yourself"));
        }

        let created_at = Utc::now();
        tx.execute(
            "UPDATE accounts SET balance = balance - ? WHERE account_id = ?",
            params![amount, sender.to_string()],
        )?;
        tx.execute(
            "UPDATE accounts SET balance = balance + ? WHERE account_id = ?",
            params![amount, receiver.to_string()],
        )?;

        let seq: i64 = tx.query_row("SELECT nextval('transfer_seq')", [], |row| row.get(0))?;
        tx.execute(
            "INSERT INTO transfers (transfer_id, from_account_id, to_account_id, amount, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                seq,
                sender.to_string(),
                receiver.to_string(),
                amount,
                created_at.to_rfc3339(),
            ],
        )?;

        tx.commit()?;

        Ok(Transfer {
            seq,
            from_account_id: sender,
            to_account_id: receiver,
            amount,
            created_at,
        })
    }

    fn purchase_item(&self, account: Uuid, item: &str) -> Result<Purchase> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        // Price and balance come from the same snapshot
        let row = tx.query_row(
            "SELECT c.price, a.balance
             FROM catalog c
             JOIN accounts a ON a.account_id = ?
             WHERE c.item_name = ?",
            params![account.to_string(), item],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        );
        let (price, balance) = match row {
            Ok(found) => found,
            Err(duckdb::Error::QueryReturnedNoRows) => {
                return Err(Error::not_found(format!(
                    "Item '{}' for account {}",
                    item, account
                )))
            }
            Err(e) => return Err(e.into()),
        };

        if balance < price {
            return Err(Error::InsufficientFunds {
                balance,
                required: price,
            });
        }

        let purchase = Purchase::single(account, item, price);

        tx.execute(
            "UPDATE accounts SET balance = balance - ? WHERE account_id = ?",
            params![purchase.total_price, account.to_string()],
        )?;
        tx.execute(
            "INSERT INTO purchases (purchase_id, account_id, total_price, created_at)
             VALUES (?, ?, ?, ?)",
            params![
                purchase.id.to_string(),
                account.to_string(),
                purchase.total_price,
                purchase.created_at.to_rfc3339(),
            ],
        )?;
        tx.execute(
            "INSERT INTO purchase_items (purchase_id, item_name, quantity, price_at_purchase)
             VALUES (?, ?, ?, ?)",
            params![purchase.id.to_string(), item, purchase.quantity, price],
        )?;
        tx.execute(
            "INSERT INTO inventory (account_id, item_name, quantity)
             VALUES (?, ?, ?)
             ON CONFLICT (account_id, item_name)
             DO UPDATE SET quantity = inventory.quantity + EXCLUDED.quantity",
            params![account.to_string(), item, purchase.quantity],
        )?;

        tx.commit()?;

        Ok(purchase)
    }

    // === Reads ===

    fn account_snapshot(&self, account: Uuid) -> Result<AccountSnapshot> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let id = account.to_string();

        let row = tx.query_row(
            "SELECT name, balance FROM accounts WHERE account_id = ?",
            [&id],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
        );
        let (name, balance) = match row {
            Ok(found) => found,
            Err(duckdb::Error::QueryReturnedNoRows) => {
                return Err(Error::not_found(format!("Account {}", account)))
            }
            Err(e) => return Err(e.into()),
        };

        let inventory = {
            let mut stmt = tx.prepare(
                "SELECT item_name, quantity FROM inventory
                 WHERE account_id = ?
                 ORDER BY item_name",
            )?;
            let rows = stmt.query_map([&id], |row| {
                Ok(InventoryEntry {
                    item: row.get(0)?,
                    quantity: row.get(1)?,
                })
            })?;
            rows.collect::<std::result::Result<Vec<_>, _>>()?
        };

        let history = {
            let mut stmt = tx.prepare(
                "SELECT t.from_account_id, s.name, r.name, t.amount, t.created_at
                 FROM transfers t
                 JOIN accounts s ON s.account_id = t.from_account_id
                 JOIN accounts r ON r.account_id = t.to_account_id
                 WHERE t.from_account_id = ? OR t.to_account_id = ?
                 ORDER BY t.transfer_id",
            )?;
            let rows = stmt.query_map([&id, &id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?;
            rows.collect::<std::result::Result<Vec<_>, _>>()?
        };

        tx.commit()?;

        let mut received = Vec::new();
        let mut sent = Vec::new();
        for (from_id, sender_name, receiver_name, amount, created_at) in history {
            let created_at = parse_timestamp(&created_at)?;
            if from_id == id {
                sent.push(TransferEntry {
                    counterparty: receiver_name,
                    amount,
                    created_at,
                });
            } else {
                received.push(TransferEntry {
                    counterparty: sender_name,
                    amount,
                    created_at,
                });
            }
        }

        Ok(AccountSnapshot {
            account_id: account,
            name,
            balance,
            inventory,
            received,
            sent,
        })
    }

    fn catalog(&self) -> Result<Vec<CatalogItem>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT item_name, price FROM catalog ORDER BY item_name")?;
        let items = stmt
            .query_map([], |row| {
                Ok(CatalogItem {
                    name: row.get(0)?,
                    price: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn ledger_status(&self) -> Result<LedgerStatus> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        // SUM over BIGINT yields HUGEINT in DuckDB, cast back down
        let (accounts, circulating, issued) = tx.query_row(
            "SELECT COUNT(*),
                    CAST(COALESCE(SUM(balance), 0) AS BIGINT),
                    CAST(COALESCE(SUM(initial_balance), 0) AS BIGINT)
             FROM accounts",
            [],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?)),
        )?;
        let (purchases, spent) = tx.query_row(
            "SELECT COUNT(*), CAST(COALESCE(SUM(total_price), 0) AS BIGINT) FROM purchases",
            [],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )?;
        let transfers: i64 = tx.query_row("SELECT COUNT(*) FROM transfers", [], |row| row.get(0))?;

        tx.commit()?;

        Ok(LedgerStatus {
            accounts,
            transfers,
            purchases,
            circulating,
            issued,
            spent,
        })
    }
}

fn fetch_account_id(conn: &Connection, name: &str) -> Result<Option<Uuid>> {
    let row = conn.query_row("SELECT account_id FROM accounts WHERE name = ?", [name], |row| {
        row.get::<_, String>(0)
    });
    match row {
        Ok(id) => Ok(Some(parse_id(&id)?)),
        Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn fetch_balance(conn: &Connection, account: Uuid) -> Result<i64> {
    let row = conn.query_row(
        "SELECT balance FROM accounts WHERE account_id = ?",
        [account.to_string()],
        |row| row.get::<_, i64>(0),
    );
    match row {
        Ok(balance) => Ok(balance),
        Err(duckdb::Error::QueryReturnedNoRows) => {
            Err(Error::not_found(format!("Account {}", account)))
        }
        Err(e) => Err(e.into()),
    }
}

fn parse_id(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::internal(format!("Stored account id '{}' is not a UUID", s), e))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::internal(format!("Stored timestamp '{}' is malformed", s), e))
}
