//! Optimistic strategy: versioned compare-and-swap with bounded retry
//!
//! Each attempt reads `(stock, version)` without locking, computes the new
//! stock and issues a conditional write guarded by the version it read. A
//! write that matches no rows is a conflict: the attempt is rolled back and
//! the loop tries again, up to `RetryConfig::max_retries` attempts.
//!
//! Conflict is a return value of the store (rows affected == 0), never an
//! error. Every other store error ends the operation immediately.

use crate::cancel::CancellationToken;
use crate::common::{commit_unless_cancelled, decremented, validate_quantity};
use crate::retry::RetryConfig;
use lockbench_core::error::{Error, Result};
use lockbench_core::result::TransactionResult;
use lockbench_core::strategy::Strategy;
use lockbench_core::traits::CounterStore;
use lockbench_core::types::{CounterId, IsolationLevel};
use std::time::Instant;
use tracing::{debug, warn};

/// Outcome of a single compare-and-swap attempt
enum CasOutcome {
    /// The write matched and committed
    Applied,
    /// The version moved underneath us; nothing was written
    Conflict,
}

/// Values computed by the most recent attempt
#[derive(Default, Clone, Copy)]
struct Attempt {
    old_stock: i64,
    new_stock: i64,
}

/// Decrement `counter_id` by `quantity` with optimistic retry
///
/// On success `retries` is the number of conflicts consumed. On exhaustion the
/// result carries `retries == retry.max_retries` and the stock values of the
/// last attempt, which are not authoritative.
pub fn decrement<S: CounterStore + ?Sized>(
    store: &S,
    counter_id: CounterId,
    quantity: i64,
    retry: &RetryConfig,
    cancel: &CancellationToken,
) -> TransactionResult {
    let start = Instant::now();
    let mut last = Attempt::default();
    let mut retries = 0usize;

    let outcome = run(store, counter_id, quantity, retry, cancel, &mut last, &mut retries);
    match outcome {
        Ok(()) => TransactionResult::succeeded(
            Strategy::Optimistic,
            counter_id,
            last.old_stock,
            last.new_stock,
            retries,
            start.elapsed(),
        ),
        Err(e) => {
            warn!(counter_id = %counter_id, retries, error = %e, "optimistic decrement failed");
            TransactionResult::failed(
                Strategy::Optimistic,
                counter_id,
                last.old_stock,
                last.new_stock,
                retries,
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
    retry: &RetryConfig,
    cancel: &CancellationToken,
    last: &mut Attempt,
    retries: &mut usize,
) -> Result<()> {
    validate_quantity(quantity)?;

    while *retries < retry.max_retries {
        cancel.check()?;

        match attempt(store, counter_id, quantity, cancel, last)? {
            CasOutcome::Applied => return Ok(()),
            CasOutcome::Conflict => {
                *retries += 1;
                debug!(
                    counter_id = %counter_id,
                    attempt = *retries,
                    max_retries = retry.max_retries,
                    "version conflict, retrying"
                );
                if *retries < retry.max_retries {
                    let delay = retry.backoff(*retries - 1);
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                }
            }
        }
    }

    Err(Error::MaxRetriesExceeded { retries: *retries })
}

fn attempt<S: CounterStore + ?Sized>(
    store: &S,
    counter_id: CounterId,
    quantity: i64,
    cancel: &CancellationToken,
    last: &mut Attempt,
) -> Result<CasOutcome> {
    let mut txn = store.begin(IsolationLevel::Default)?;
    let current = txn.read(counter_id)?;
    let new_stock = decremented(counter_id, current.stock, quantity)?;
    *last = Attempt {
        old_stock: current.stock,
        new_stock,
    };

    if txn.conditional_write(counter_id, current.version, new_stock)? == 0 {
        txn.rollback();
        return Ok(CasOutcome::Conflict);
    }

    commit_unless_cancelled(txn, cancel)?;
    Ok(CasOutcome::Applied)
}
