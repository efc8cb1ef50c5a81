//! No-lock strategy: read, compute, blind write
//!
//! Nothing prevents two callers from reading the same stock and overwriting
//! each other. The operation reports success whenever the store calls succeed,
//! so lost updates are only visible in the final stock.

use crate::cancel::CancellationToken;
use crate::common::{commit_unless_cancelled, decremented, validate_quantity};
use lockbench_core::error::Result;
use lockbench_core::result::TransactionResult;
use lockbench_core::strategy::Strategy;
use lockbench_core::traits::CounterStore;
use lockbench_core::types::{CounterId, IsolationLevel};
use std::time::Instant;
use tracing::warn;

/// Decrement `counter_id` by `quantity` without any concurrency control
pub fn decrement<S: CounterStore + ?Sized>(
    store: &S,
    counter_id: CounterId,
    quantity: i64,
    cancel: &CancellationToken,
) -> TransactionResult {
    let start = Instant::now();
    match run(store, counter_id, quantity, cancel) {
        Ok((old_stock, new_stock)) => TransactionResult::succeeded(
            Strategy::NoLock,
            counter_id,
            old_stock,
            new_stock,
            0,
            start.elapsed(),
        ),
        Err(e) => {
            warn!(counter_id = %counter_id, error = %e, "no-lock decrement failed");
            TransactionResult::failed(Strategy::NoLock, counter_id, 0, 0, 0, start.elapsed(), &e)
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
    let old_stock = txn.read(counter_id)?.stock;
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
    use lockbench_storage::MemoryStore;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert(Counter::new(CounterId(1), "widget", 10)).unwrap();
        store
    }

    #[test]
    fn single_caller_decrements() {
        let store = store();
        let r = decrement(&store, CounterId(1), 3, &CancellationToken::new());
        assert!(r.success);
        assert_eq!((r.old_stock, r.new_stock, r.retries), (10, 7, 0));
        assert_eq!(r.strategy, Strategy::NoLock);

        let row = store.read(CounterId(1)).unwrap();
        assert_eq!((row.stock, row.version), (7, 1));
    }

    #[test]
    fn overdraft_is_not_prevented() {
        let store = store();
        let r = decrement(&store, CounterId(1), 15, &CancellationToken::new());
        assert!(r.success);
        assert_eq!(r.new_stock, -5);
    }

    #[test]
    fn missing_counter_reports_zeroes() {
        let store = store();
        let r = decrement(&store, CounterId(9), 1, &CancellationToken::new());
        assert!(!r.success);
        assert_eq!(r.error_kind, Some(ErrorKind::NotFound));
        assert_eq!(r.error.as_deref(), Some("Counter 9 not found"));
        assert_eq!((r.old_stock, r.new_stock), (0, 0));
    }
}
