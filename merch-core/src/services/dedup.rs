//! Request deduplication for idempotent reads
//!
//! Concurrent callers asking the same question (same key) share one
//! execution: the first caller starts the work as a shared future, later
//! callers attach to it, and everyone receives a clone of the single result,
//! error included. The key is removed once the work settles, so a later call
//! runs fresh.
//!
//! Only reads and credential checks go through here. Writes are never
//! collapsed.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::domain::Result;

type InFlight<T> = Shared<BoxFuture<'static, Result<T>>>;

/// A group of in-flight requests keyed by operation and arguments
pub struct RequestGroup<T> {
    in_flight: Mutex<HashMap<String, (u64, InFlight<T>)>>,
    next_id: AtomicU64,
}

impl<T> RequestGroup<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            in_flight: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Run `work` for `key`, or join the execution already running for it
    ///
    /// `work` is only called when no execution is in flight for `key`.
    pub async fn run<F, Fut>(&self, key: impl Into<String>, work: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let key = key.into();

        let (id, shared) = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            match in_flight.get(&key) {
                Some((id, shared)) => {
                    tracing::debug!(key = %key, "joining in-flight request");
                    (*id, shared.clone())
                }
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let shared = work().boxed().shared();
                    in_flight.insert(key.clone(), (id, shared.clone()));
                    (id, shared)
                }
            }
        };

        let result = shared.await;

        // Whoever observes completion first clears the entry, but only if it
        // still belongs to this execution.
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(in_flight.get(&key), Some((current, _)) if *current == id) {
            in_flight.remove(&key);
        }

        result
    }

    /// Number of keys with an execution in flight
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl<T> Default for RequestGroup<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Error, ErrorKind};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    fn counted(
        calls: &Arc<AtomicUsize>,
        result: Result<u32>,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<u32>> {
        let calls = Arc::clone(calls);
        move || {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                result
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_concurrent_same_key_runs_once() {
        let group = RequestGroup::<u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b, c) = tokio::join!(
            group.run("info:1", counted(&calls, Ok(7))),
            group.run("info:1", counted(&calls, Ok(8))),
            group.run("info:1", counted(&calls, Ok(9))),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!((a.unwrap(), b.unwrap(), c.unwrap()), (7, 7, 7));
        assert_eq!(group.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_errors_are_shared() {
        let group = RequestGroup::<u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            group.run("auth:x", counted(&calls, Err(Error::InvalidCredentials))),
            group.run("auth:x", counted(&calls, Ok(1))),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap_err().kind(), ErrorKind::InvalidCredentials);
        assert_eq!(b.unwrap_err().kind(), ErrorKind::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_different_keys_run_separately() {
        let group = RequestGroup::<u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            group.run("exists:alice", counted(&calls, Ok(1))),
            group.run("exists:bob", counted(&calls, Ok(2))),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!((a.unwrap(), b.unwrap()), (1, 2));
    }

    #[tokio::test]
    async fn test_settled_key_runs_again() {
        let group = RequestGroup::<u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        assert_eq!(group.run("k", counted(&calls, Ok(1))).await.unwrap(), 1);
        assert_eq!(group.run("k", counted(&calls, Ok(2))).await.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancelled_leader_does_not_strand_followers() {
        let group = Arc::new(RequestGroup::<u32>::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let leader = {
            let group = Arc::clone(&group);
            let work = counted(&calls, Ok(5));
            tokio::spawn(async move { group.run("k", work).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let follower = {
            let group = Arc::clone(&group);
            let work = counted(&calls, Ok(6));
            tokio::spawn(async move { group.run("k", work).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        leader.abort();

        assert_eq!(follower.await.unwrap().unwrap(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(group.in_flight(), 0);
    }
}
