//! Serializable strategy: let the store detect anomalies
//!
//! Runs read-compute-write in a serializable transaction. If a concurrent
//! writer changed the row first, the store rejects the commit and the store's
//! message is surfaced verbatim. No automatic retry.

use crate::cancel::CancellationToken;
use crate::common::{commit_unless_cancelled, decremented, validate_quantity};
use lockbench_core::error::Result;
use lockbench_core::result::TransactionResult;
use lockbench_core::strategy::Strategy;
use lockbench_core::traits::CounterStore;
use lockbench_core::types::{CounterId, IsolationLevel};
use std::time::Instant;
use tracing::warn;

/// Decrement `counter_id` by `quantity` in a serializable transaction
///
/// On failure `old_stock` and `new_stock` are reported as 0.
pub fn decrement<S: CounterStore + ?Sized>(
    store: &S,
    counter_id: CounterId,
    quantity: i64,
    cancel: &CancellationToken,
) -> TransactionResult {
    let start = Instant::now();
    match run(store, counter_id, quantity, cancel) {
        Ok((old_stock, new_stock)) => TransactionResult::succeeded(
            Strategy::Serializable,
            counter_id,
            old_stock,
            new_stock,
            0,
            start.elapsed(),
        ),
        Err(e) => {
            warn!(counter_id = %counter_id, error = %e, "serializable decrement failed");
            TransactionResult::failed(
                Strategy::Serializable,
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

    let mut txn = store.begin(IsolationLevel::Serializable)?;
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
    use lockbench_storage::testing::{Fault, FaultyStore};
    use lockbench_storage::{MemoryStore, SERIALIZATION_FAILURE};

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert(Counter::new(CounterId(4), "doohickey", 1000)).unwrap();
        store
    }

    #[test]
    fn uncontended_decrement_commits() {
        let store = store();
        let r = decrement(&store, CounterId(4), 1, &CancellationToken::new());
        assert!(r.success);
        assert_eq!((r.old_stock, r.new_stock), (1000, 999));
        assert_eq!(store.read(CounterId(4)).unwrap().version, 1);
    }

    #[test]
    fn rejected_commit_surfaces_store_message() {
        let store = FaultyStore::new(store(), Fault::RejectCommits(SERIALIZATION_FAILURE.into()));
        let r = decrement(&store, CounterId(4), 1, &CancellationToken::new());
        assert!(!r.success);
        assert_eq!(r.error.as_deref(), Some(SERIALIZATION_FAILURE));
        assert_eq!(r.error_kind, Some(ErrorKind::IsolationFailure));
        assert_eq!((r.old_stock, r.new_stock, r.retries), (0, 0, 0));
        assert_eq!(store.op_counts().commits, 1);
        assert_eq!(store.read(CounterId(4)).unwrap().stock, 1000);
    }
}
