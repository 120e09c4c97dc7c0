//! Concurrent access tests
//!
//! These tests hammer one store from many tasks at once and check that no
//! coins are created or lost, that balances never go negative and that
//! racing logins for one name end up with a single account.
//!
//! Run with: cargo test --test concurrent_access_test -- --nocapture
//! Run specific test: cargo test --test concurrent_access_test test_name -- --nocapture

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;
use uuid::Uuid;

use merch_core::adapters::duckdb::DuckDbRepository;
use merch_core::config::Config;
use merch_core::domain::credential::hash_password;
use merch_core::domain::{Account, Argon2Params};
use merch_core::ports::LedgerRepository;
use merch_core::{ErrorKind, MerchContext};

/// Number of concurrent tasks for stress tests.
const TASK_COUNT: usize = 8;

/// Number of operations per task
const ITERATIONS_PER_TASK: usize = 10;

fn cheap_params() -> Argon2Params {
    Argon2Params {
        time_cost: 1,
        memory_cost: 64,
        parallelism: 1,
    }
}

fn create_test_context(temp_dir: &TempDir) -> Arc<MerchContext> {
    let db_path = temp_dir.path().join("test_concurrent.duckdb");
    let repo = DuckDbRepository::new(&db_path).unwrap();
    let config = Config {
        starting_balance: 1000,
        password_hashing: cheap_params(),
    };
    Arc::new(MerchContext::with_repository(config, repo).unwrap())
}

fn seed_account(ctx: &MerchContext, name: &str, balance: i64) -> Uuid {
    let hash = hash_password("password", &cheap_params()).unwrap();
    let account = Account::new(name, hash, balance);
    ctx.repository.create_account(&account).unwrap();
    account.id
}

/// Two transfers that together exceed the balance: exactly one goes through.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_overdraft_only_one_succeeds() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);
    let a = seed_account(&ctx, "a", 100);
    let b = seed_account(&ctx, "b", 0);
    let c = seed_account(&ctx, "c", 0);

    let barrier = Arc::new(tokio::sync::Barrier::new(2));
    let mut handles = vec![];
    for receiver in ["b", "c"] {
        let ctx = Arc::clone(&ctx);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            ctx.ledger_service.transfer(a, receiver, 70).await
        }));
    }

    let mut succeeded = 0;
    let mut insufficient = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(e) if e.kind() == ErrorKind::InsufficientFunds => insufficient += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert_eq!(succeeded, 1);
    assert_eq!(insufficient, 1);

    let a_balance = ctx.info_service.get_info(a).await.unwrap().balance;
    let b_balance = ctx.info_service.get_info(b).await.unwrap().balance;
    let c_balance = ctx.info_service.get_info(c).await.unwrap().balance;
    assert_eq!(a_balance, 30);
    assert_eq!(b_balance + c_balance, 70);
}

/// Opposing transfers between the same pair must not deadlock.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_opposing_transfers_complete() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);
    let a = seed_account(&ctx, "a", 1000);
    let b = seed_account(&ctx, "b", 1000);

    let mut handles = vec![];
    for task_id in 0..TASK_COUNT {
        let ctx = Arc::clone(&ctx);
        let (sender, receiver) = if task_id % 2 == 0 { (a, "b") } else { (b, "a") };
        handles.push(tokio::spawn(async move {
            for _ in 0..ITERATIONS_PER_TASK {
                ctx.ledger_service.transfer(sender, receiver, 1).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let a_info = ctx.info_service.get_info(a).await.unwrap();
    let b_info = ctx.info_service.get_info(b).await.unwrap();
    assert_eq!(a_info.balance, 1000);
    assert_eq!(b_info.balance, 1000);
    assert_eq!(a_info.sent.len(), TASK_COUNT / 2 * ITERATIONS_PER_TASK);
    assert_eq!(a_info.received.len(), TASK_COUNT / 2 * ITERATIONS_PER_TASK);
}

/// Random-ish mix of transfers and purchases keeps the ledger balanced.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mixed_operations_conserve_coins() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);
    let names: Vec<String> = (0..4).map(|i| format!("user{}", i)).collect();
    let ids: Vec<Uuid> = names.iter().map(|n| seed_account(&ctx, n, 300)).collect();
    let items = ["pen", "cup", "socks", "book", "t-shirt"];

    let unexpected = Arc::new(AtomicUsize::new(0));
    let mut handles = vec![];
    for task_id in 0..TASK_COUNT {
        let ctx = Arc::clone(&ctx);
        let ids = ids.clone();
        let names = names.clone();
        let unexpected = Arc::clone(&unexpected);
        handles.push(tokio::spawn(async move {
            for i in 0..ITERATIONS_PER_TASK {
                let sender = ids[(task_id + i) % ids.len()];
                let result = if (task_id + i) % 3 == 0 {
                    ctx.ledger_service
                        .purchase(sender, items[i % items.len()])
                        .await
                        .map(|_| ())
                } else {
                    let receiver = &names[(task_id + i + 1) % names.len()];
                    let amount = ((task_id * 7 + i * 13) % 90 + 1) as i64;
                    ctx.ledger_service
                        .transfer(sender, receiver, amount)
                        .await
                        .map(|_| ())
                };
                if let Err(e) = result {
                    if e.kind() != ErrorKind::InsufficientFunds {
                        eprintln!("unexpected error: {}", e);
                        unexpected.fetch_add(1, Ordering::SeqCst);
                    }
                }
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(unexpected.load(Ordering::SeqCst), 0);

    let status = ctx.status_service.get_status().await.unwrap();
    assert_eq!(status.issued, 1200);
    assert!(status.is_balanced(), "ledger out of balance: {:?}", status);

    for id in ids {
        let info = ctx.info_service.get_info(id).await.unwrap();
        assert!(info.balance >= 0);
        let received: i64 = info.received.iter().map(|t| t.amount).sum();
        let sent: i64 = info.sent.iter().map(|t| t.amount).sum();
        assert!(info.balance <= 300 + received - sent);
    }
}

/// Racing first logins for one name register exactly one account.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_login_creates_one_account() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);

    let barrier = Arc::new(tokio::sync::Barrier::new(TASK_COUNT));
    let mut handles = vec![];
    for _ in 0..TASK_COUNT {
        let ctx = Arc::clone(&ctx);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            ctx.auth_service.authenticate("newcomer", "pw").await
        }));
    }

    let mut ids = vec![];
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap());
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);

    let status = ctx.status_service.get_status().await.unwrap();
    assert_eq!(status.accounts, 1);
    assert_eq!(status.issued, 1000);
}

/// Racing logins with different passwords never share a result.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_logins_with_different_passwords() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_test_context(&temp_dir);
    ctx.auth_service.authenticate("alice", "right").await.unwrap();

    let mut handles = vec![];
    for task_id in 0..TASK_COUNT {
        let ctx = Arc::clone(&ctx);
        let password = if task_id % 2 == 0 { "right" } else { "wrong" };
        handles.push(tokio::spawn(async move {
            (password, ctx.auth_service.authenticate("alice", password).await)
        }));
    }

    for handle in handles {
        let (password, result) = handle.await.unwrap();
        match password {
            "right" => assert!(result.is_ok()),
            _ => assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidCredentials),
        }
    }
}

/// Threads inserting the same name straight into the repository: the
/// unique name constraint lets only one through.
#[test]
fn test_repository_rejects_duplicate_names_across_threads() {
    let repo = Arc::new(DuckDbRepository::in_memory().unwrap());
    repo.ensure_schema().unwrap();

    let barrier = Arc::new(Barrier::new(TASK_COUNT));
    let success_count = Arc::new(AtomicUsize::new(0));
    let mut handles = vec![];

    for _ in 0..TASK_COUNT {
        let repo = Arc::clone(&repo);
        let barrier = Arc::clone(&barrier);
        let success_count = Arc::clone(&success_count);
        handles.push(thread::spawn(move || {
            let account = Account::new("dup", "hash".to_string(), 10);
            barrier.wait();
            if repo.create_account(&account).is_ok() {
                success_count.fetch_add(1, Ordering::SeqCst);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(success_count.load(Ordering::SeqCst), 1);
    assert!(repo.find_account_id("dup").unwrap().is_some());
}
