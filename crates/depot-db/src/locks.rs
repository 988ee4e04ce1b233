//! # Stock Line Locks
//!
//! Serializes workflows that touch the same `(warehouse, product)` line.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  outbound A (wh-1/p-1) ──┐                                              │
//! │                          ├──► lock wh-1/p-1 ──► BEGIN IMMEDIATE ...     │
//! │  outbound B (wh-1/p-1) ──┘        (B waits until A commits)             │
//! │                                                                         │
//! │  receive M (wh-1/p-1, wh-2/p-1)                                         │
//! │      locks are always taken in StockKey order, so two mutations         │
//! │      moving stock in opposite directions cannot deadlock                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Locks are taken before a pooled connection is acquired. A workflow never
//! holds a connection while it waits for a line.
//!
//! The table only holds lines that are locked or awaited. A slot is removed
//! when the last guard or waiter referencing it lets go.

use depot_core::StockKey;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::error::{LedgerError, LedgerResult};

type Slot = Arc<AsyncMutex<()>>;
type Table = Arc<Mutex<HashMap<StockKey, Slot>>>;

/// Process-wide lock table, one async mutex per active stock line.
#[derive(Debug, Default)]
pub struct StockLocks {
    table: Table,
}

/// Held stock line locks. Released on drop.
#[derive(Debug)]
pub struct StockGuard {
    keys: Vec<StockKey>,
    guards: Vec<OwnedMutexGuard<()>>,
    table: Table,
}

impl StockGuard {
    /// Keys held, in acquisition order.
    pub fn keys(&self) -> &[StockKey] {
        &self.keys
    }
}

impl Drop for StockGuard {
    fn drop(&mut self) {
        self.guards.clear();
        prune(&self.table, &self.keys);
    }
}

fn lock_table(table: &Mutex<HashMap<StockKey, Slot>>) -> MutexGuard<'_, HashMap<StockKey, Slot>> {
    match table.lock() {
        Ok(table) => table,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Drops the slots for `keys` that nothing references any more.
///
/// Slots are only cloned under the table mutex, so a count of one seen here
/// cannot rise before the entry is removed.
fn prune(table: &Mutex<HashMap<StockKey, Slot>>, keys: &[StockKey]) {
    let mut table = lock_table(table);
    for key in keys {
        if table.get(key).is_some_and(|slot| Arc::strong_count(slot) == 1) {
            table.remove(key);
        }
    }
}

impl StockLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &StockKey) -> Slot {
        lock_table(&self.table)
            .entry(key.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Acquires every key, sorted and deduplicated, within `timeout` overall.
    ///
    /// On expiry the locks taken so far are released and the caller gets
    /// `ConcurrencyConflict` naming the line it was waiting on.
    pub async fn acquire(
        &self,
        keys: impl IntoIterator<Item = StockKey>,
        timeout: Duration,
    ) -> LedgerResult<StockGuard> {
        let ordered: BTreeSet<StockKey> = keys.into_iter().collect();
        let started = Instant::now();
        let mut held = StockGuard {
            keys: Vec::with_capacity(ordered.len()),
            guards: Vec::with_capacity(ordered.len()),
            table: Arc::clone(&self.table),
        };

        for key in ordered {
            let remaining = timeout.saturating_sub(started.elapsed());
            let slot = self.slot(&key);

            match tokio::time::timeout(remaining, slot.lock_owned()).await {
                Ok(guard) => {
                    held.keys.push(key);
                    held.guards.push(guard);
                }
                Err(_) => {
                    let waited_ms = started.elapsed().as_millis() as u64;
                    warn!(key = %key, waited_ms, "Timed out waiting for stock line lock");
                    let resource = format!("stock line {key}");
                    // the awaited slot is released with the partial guard
                    held.keys.push(key);
                    drop(held);
                    return Err(LedgerError::ConcurrencyConflict { resource, waited_ms });
                }
            }
        }

        debug!(
            keys = held.keys.len(),
            waited_ms = started.elapsed().as_millis() as u64,
            "Stock line locks acquired"
        );

        Ok(held)
    }

    /// Number of stock lines currently locked or awaited.
    pub fn len(&self) -> usize {
        lock_table(&self.table).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn key(w: &str) -> StockKey {
        StockKey::new(w, "p-1")
    }

    #[tokio::test]
    async fn test_keys_are_sorted_and_deduplicated() {
        let locks = StockLocks::new();
        let guard = locks
            .acquire(
                vec![key("wh-b"), key("wh-a"), key("wh-b")],
                Duration::from_secs(1),
            )
            .await
            .unwrap();

        assert_eq!(guard.keys(), &[key("wh-a"), key("wh-b")]);
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_held_lock_times_out() {
        let locks = StockLocks::new();
        let _held = locks
            .acquire(vec![key("wh-a")], Duration::from_secs(1))
            .await
            .unwrap();

        let err = locks
            .acquire(vec![key("wh-a")], Duration::from_millis(20))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConcurrencyConflict);
    }

    #[tokio::test]
    async fn test_release_on_drop() {
        let locks = StockLocks::new();
        {
            let _held = locks
                .acquire(vec![key("wh-a")], Duration::from_secs(1))
                .await
                .unwrap();
        }
        assert!(locks
            .acquire(vec![key("wh-a")], Duration::from_millis(20))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_partial_acquisition_released_on_timeout() {
        let locks = StockLocks::new();
        let held_b = locks
            .acquire(vec![key("wh-b")], Duration::from_secs(1))
            .await
            .unwrap();

        // takes wh-a, then times out on wh-b
        assert!(locks
            .acquire(vec![key("wh-a"), key("wh-b")], Duration::from_millis(20))
            .await
            .is_err());
        drop(held_b);

        // wh-a must have been released
        assert!(locks
            .acquire(vec![key("wh-a")], Duration::from_millis(20))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_released_lines_leave_the_table() {
        let locks = StockLocks::new();
        for w in ["wh-a", "wh-b", "wh-c"] {
            let _held = locks
                .acquire(vec![key(w), key("wh-z")], Duration::from_secs(1))
                .await
                .unwrap();
            assert_eq!(locks.len(), 2);
        }
        assert!(locks.is_empty());

        let _held = locks
            .acquire(vec![key("wh-d")], Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(locks.len(), 1);
    }

    #[tokio::test]
    async fn test_timed_out_waiter_leaves_no_slots() {
        let locks = StockLocks::new();
        let held_b = locks
            .acquire(vec![key("wh-b")], Duration::from_secs(1))
            .await
            .unwrap();

        assert!(locks
            .acquire(vec![key("wh-a"), key("wh-b")], Duration::from_millis(20))
            .await
            .is_err());
        assert_eq!(locks.len(), 1);

        drop(held_b);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_slot_kept_while_awaited() {
        let locks = Arc::new(StockLocks::new());
        let held = locks
            .acquire(vec![key("wh-a")], Duration::from_secs(1))
            .await
            .unwrap();

        let waiter = tokio::spawn({
            let locks = Arc::clone(&locks);
            async move {
                locks
                    .acquire(vec![key("wh-a")], Duration::from_secs(5))
                    .await
                    .map(|guard| guard.keys().to_vec())
            }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        // the waiter still references the slot, so releasing must not drop it
        drop(held);
        assert_eq!(waiter.await.unwrap().unwrap(), vec![key("wh-a")]);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_disjoint_lines_do_not_block() {
        let locks = StockLocks::new();
        let _a = locks
            .acquire(vec![key("wh-a")], Duration::from_secs(1))
            .await
            .unwrap();
        assert!(locks
            .acquire(vec![key("wh-b")], Duration::from_millis(20))
            .await
            .is_ok());
    }
}
