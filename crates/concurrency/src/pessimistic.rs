//! Pessimistic strategy: lock the row, then read
//!
//! The exclusive row lock is taken before the read and held until commit, so
//! concurrent callers on the same counter are fully serialized. There is no
//! retry; a lock timeout is terminal.

use crate::cancel::CancellationToken;
use crate::common::{commit_unless_cancelled, decremented, validate_quantity};
use lockbench_core::error::Result;
use lockbench_core::result::TransactionResult;
use lockbench_core::strategy::Strategy;
use lockbench_core::traits::CounterStore;
use lockbench_core::types::{CounterId, IsolationLevel};
use std::time::Instant;
use tracing::warn;

/// Decrement `counter_id` by `quantity` under an exclusive row lock
pub fn decrement<S: CounterStore + ?Sized>(
    store: &S,
    counter_id: CounterId,
    quantity: i64,
    cancel: &CancellationToken,
) -> TransactionResult {
    let start = Instant::now();
    match run(store, counter_id, quantity, cancel) {
        Ok((old_stock, new_stock)) => TransactionResult::succeeded(
            Strategy::Pessimistic,
            counter_id,
            old_stock,
            new_stock,
            0,
            start.elapsed(),
        ),
        Err(e) => {
            warn!(counter_id = %counter_id, error = %e, "pessimistic decrement failed");
            TransactionResult::failed(
                Strategy::Pessimistic,
                counter_id,
                0,
                0,
                0,
                start.elapsed(),
                &e,
            )
        }
    }
}

fn run<S: CounterStore + ?Sized>(
    store: &S,
    counter_id: CounterId,
    quantity: i64,
    cancel: &CancellationToken,
) -> Result<(i64, i64)> {
    validate_quantity(quantity)?;
    cancel.check()?;

    let mut txn = store.begin(IsolationLevel::Default)?;
    let old_stock = txn.read_for_update(counter_id)?.stock;
    let new_stock = decremented(counter_id, old_stock, quantity)?;
    txn.write(counter_id, new_stock)?;
    commit_unless_cancelled(txn, cancel)?;
    Ok((old_stock, new_stock))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockbench_core::error::ErrorKind;
    use lockbench_core::types::Counter;
    use lockbench_storage::{MemoryStore, StoreConfig};
    use std::time::Duration;

    #[test]
    fn decrements_and_bumps_version() {
        let store = MemoryStore::new();
        store.insert(Counter::new(CounterId(2), "gadget", 5)).unwrap();

        let r = decrement(&store, CounterId(2), 2, &CancellationToken::new());
        assert!(r.success);
        assert_eq!((r.old_stock, r.new_stock), (5, 3));

        let row = store.read(CounterId(2)).unwrap();
        assert_eq!((row.stock, row.version), (3, 1));
    }

    #[test]
    fn lock_timeout_is_terminal() {
        let store = MemoryStore::with_config(StoreConfig::new().with_lock_timeout_ms(20));
        store.insert(Counter::new(CounterId(1), "widget", 10)).unwrap();

        let mut holder = store.begin(IsolationLevel::Default).unwrap();
        holder.read_for_update(CounterId(1)).unwrap();

        let r = decrement(&store, CounterId(1), 1, &CancellationToken::new());
        assert!(!r.success);
        assert_eq!(r.error_kind, Some(ErrorKind::LockTimeout));
        assert!(r.elapsed >= Duration::from_millis(20));

        holder.rollback();
        assert_eq!(store.read(CounterId(1)).unwrap().stock, 10);
    }

    #[test]
    fn invalid_quantity_touches_nothing() {
        let store = MemoryStore::new();
        store.insert(Counter::new(CounterId(1), "widget", 10)).unwrap();

        let r = decrement(&store, CounterId(1), 0, &CancellationToken::new());
        assert!(!r.success);
        assert_eq!(r.error_kind, Some(ErrorKind::InvalidInput));
        assert_eq!(store.read(CounterId(1)).unwrap().version, 0);
    }
}
