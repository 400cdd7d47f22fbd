use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = HashMap<i64, Arc<AsyncMutex<()>>>;

/// Per-pull-request async locks, keyed by pull request id.
///
/// Holding the guard serializes read-modify-write cycles on one PR while
/// events for other PRs proceed in parallel. An entry lives only while
/// someone holds or waits on it.
#[derive(Debug, Default, Clone)]
pub struct PrLocks {
    inner: Arc<Mutex<LockMap>>,
}

fn lock_map(map: &Mutex<LockMap>) -> MutexGuard<'_, LockMap> {
    match map.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl PrLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, pr_id: i64) -> PrLockGuard {
        let entry = lock_map(&self.inner)
            .entry(pr_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();
        PrLockGuard {
            guard: Some(entry.lock_owned().await),
            pr_id,
            inner: self.inner.clone(),
        }
    }
}

/// Held lock on one pull request. Dropping it releases the lock and removes
/// the map entry when nobody else holds or waits on it.
#[derive(Debug)]
pub struct PrLockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    pr_id: i64,
    inner: Arc<Mutex<LockMap>>,
}

impl Drop for PrLockGuard {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = lock_map(&self.inner);
        // Only the map's own reference left: no holder, no waiter.
        if locks
            .get(&self.pr_id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(&self.pr_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn tracked(locks: &PrLocks) -> usize {
        lock_map(&locks.inner).len()
    }

    #[tokio::test]
    async fn test_same_pr_is_serialized() {
        let locks = PrLocks::new();
        let guard = locks.lock(1).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(1).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_prs_do_not_block() {
        let locks = PrLocks::new();
        let _first = locks.lock(1).await;
        tokio::time::timeout(Duration::from_secs(1), locks.lock(2))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_released_locks_are_evicted() {
        let locks = PrLocks::new();
        for pr_id in 0..100 {
            let _guard = locks.lock(pr_id).await;
        }
        assert_eq!(tracked(&locks), 0);
    }

    #[tokio::test]
    async fn test_entry_kept_while_contended() {
        let locks = PrLocks::new();
        let guard = locks.lock(1).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(1).await;
                tokio::time::sleep(Duration::from_millis(20)).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(guard);
        assert_eq!(tracked(&locks), 1);

        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tracked(&locks), 0);
    }
}
