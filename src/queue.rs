//! Account Queue Scheduler
//!
//! One FIFO job chain per account id. At most one job per account is
//! in-flight at any instant; jobs for the same account run in enqueue
//! order; jobs for different accounts run fully concurrently. The ledger
//! enforces a per-account cooldown, so concurrent mutations against one
//! account must never race each other.
//!
//! Each job runs inside its own spawned task: a caller dropping the handle
//! it got back cannot abandon a job mid-flight. A chain whose last job has
//! settled is reaped from the map, guarded by an epoch counter against the
//! race where a new job is attached between "job finished" and "entry
//! removed".

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::ledger::AccountId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The job's result could not be delivered (runtime torn down or the
    /// job panicked before completing).
    #[error("queued job was dropped before completing")]
    Canceled,
}

struct ChainTail {
    /// Completion of the most recently enqueued job for this account.
    done: Shared<BoxFuture<'static, ()>>,
    /// Bumped on every attach; reaping only removes the entry when the
    /// finishing job is still the tail.
    epoch: u64,
}

struct Inner {
    chains: Mutex<HashMap<AccountId, ChainTail>>,
}

/// Per-account FIFO scheduler. Cheap to clone; clones share one chain map.
#[derive(Clone)]
pub struct AccountQueues {
    inner: Arc<Inner>,
}

impl AccountQueues {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                chains: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Number of accounts with a live chain (pending or running jobs).
    pub fn active_accounts(&self) -> usize {
        self.lock_chains().len()
    }

    /// Attach `job` to run strictly after every previously enqueued job for
    /// this account, and return a receiver for its result.
    ///
    /// Order is fixed synchronously at call time. The job runs regardless
    /// of whether the receiver is kept.
    pub fn enqueue<T, F>(&self, account_id: &AccountId, job: F) -> oneshot::Receiver<T>
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel::<()>();
        // Shared so the next enqueue can also await this job's completion.
        // The RecvError case (job panicked) still resolves, so a panic never
        // stalls the chain.
        let done: Shared<BoxFuture<'static, ()>> = async move {
            let _ = done_rx.await;
        }
        .boxed()
        .shared();

        let (previous, epoch) = {
            let mut chains = self.lock_chains();
            match chains.entry(account_id.clone()) {
                Entry::Occupied(mut occupied) => {
                    let tail = occupied.get_mut();
                    let previous = tail.done.clone();
                    tail.done = done;
                    tail.epoch += 1;
                    (Some(previous), tail.epoch)
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(ChainTail { done, epoch: 0 });
                    (None, 0)
                }
            }
        };

        let inner = Arc::clone(&self.inner);
        let account = account_id.clone();
        tokio::spawn(async move {
            if let Some(previous) = previous {
                previous.await;
            }

            let output = job.await;
            let _ = result_tx.send(output);
            let _ = done_tx.send(());

            let mut chains = inner
                .chains
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let still_tail = chains.get(&account).is_some_and(|tail| tail.epoch == epoch);
            if still_tail {
                chains.remove(&account);
            }
        });

        result_rx
    }

    /// Enqueue and await the job's own result.
    pub async fn run<T, F>(&self, account_id: &AccountId, job: F) -> Result<T, QueueError>
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
    {
        self.enqueue(account_id, job)
            .await
            .map_err(|_| QueueError::Canceled)
    }

    fn lock_chains(&self) -> std::sync::MutexGuard<'_, HashMap<AccountId, ChainTail>> {
        self.inner
            .chains
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for AccountQueues {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_jobs_run_in_enqueue_order_without_overlap() {
        let queues = AccountQueues::new();
        let account = AccountId::new("acct-1");

        let order = Arc::new(Mutex::new(Vec::new()));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));

        let mut receivers = Vec::new();
        for i in 0..16usize {
            let order = Arc::clone(&order);
            let in_flight = Arc::clone(&in_flight);
            let max_in_flight = Arc::clone(&max_in_flight);
            receivers.push(queues.enqueue(&account, async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_in_flight.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                order.lock().unwrap().push(i);
                in_flight.fetch_sub(1, Ordering::SeqCst);
                i
            }));
        }

        for (i, rx) in receivers.into_iter().enumerate() {
            assert_eq!(rx.await.unwrap(), i);
        }

        assert_eq!(*order.lock().unwrap(), (0..16).collect::<Vec<_>>());
        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_accounts_run_concurrently() {
        let queues = AccountQueues::new();
        let slow = AccountId::new("slow");
        let fast = AccountId::new("fast");

        // The slow account's job only finishes once the fast account's job
        // has run. If accounts serialized against each other this would
        // deadlock, so the whole test runs under a timeout.
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let slow_rx = queues.enqueue(&slow, async move {
            release_rx.await.expect("fast job should release us");
            "slow-done"
        });
        let fast_rx = queues.enqueue(&fast, async move {
            let _ = release_tx.send(());
            "fast-done"
        });

        let joined = tokio::time::timeout(Duration::from_secs(5), async {
            (fast_rx.await.unwrap(), slow_rx.await.unwrap())
        })
        .await
        .expect("accounts must not serialize against each other");

        assert_eq!(joined, ("fast-done", "slow-done"));
    }

    #[tokio::test]
    async fn test_idle_chains_are_reaped() {
        let queues = AccountQueues::new();
        let account = AccountId::new("acct-reap");

        let result = queues.run(&account, async { 7 }).await.unwrap();
        assert_eq!(result, 7);

        // The reap happens in the job's task after the result is delivered;
        // give it a bounded window to land.
        for _ in 0..200 {
            if queues.active_accounts() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("idle chain was not reaped");
    }

    #[tokio::test]
    async fn test_job_failure_does_not_stall_the_chain() {
        let queues = AccountQueues::new();
        let account = AccountId::new("acct-err");

        let first: Result<(), &str> = queues
            .run(&account, async { Err("ledger down") })
            .await
            .unwrap();
        assert!(first.is_err());

        // The chain keeps serving jobs after a failed one.
        let second = queues.run(&account, async { Ok::<_, &str>(5) }).await.unwrap();
        assert_eq!(second, Ok(5));
    }

    #[tokio::test]
    async fn test_dropped_receiver_still_runs_job() {
        let queues = AccountQueues::new();
        let account = AccountId::new("acct-drop");
        let ran = Arc::new(AtomicUsize::new(0));

        let ran_clone = Arc::clone(&ran);
        drop(queues.enqueue(&account, async move {
            ran_clone.fetch_add(1, Ordering::SeqCst);
        }));

        // A later job on the same chain runs after the dropped one.
        queues.run(&account, async {}).await.unwrap();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }
}
