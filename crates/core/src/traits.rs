//! The Counter Store contract
//!
//! The Strategy Engine only talks to storage through these two traits, so a
//! store implementation can be swapped (in-memory, fault-injecting, a real
//! database adapter) without touching the strategies.
//!
//! Thread safety: a `CounterStore` is shared by every worker (`Send + Sync`);
//! a `StoreTransaction` belongs to exactly one worker.

use crate::error::Result;
use crate::types::{Counter, CounterId, IsolationLevel};

/// A durable key-value counter store with transactional semantics
pub trait CounterStore: Send + Sync {
    /// Begin a transaction at the given isolation level
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the store cannot start a transaction.
    fn begin(&self, isolation: IsolationLevel) -> Result<Box<dyn StoreTransaction + '_>>;

    /// Point read of the latest committed row, outside any transaction
    ///
    /// Never mutates `stock` or `version`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the counter does not exist.
    fn read(&self, id: CounterId) -> Result<Counter>;

    /// Administrative reset: set `stock` to `stock` and `version` to 0
    ///
    /// Not part of any strategy; used by the harness between runs.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if any of the ids does not exist.
    fn reset(&self, ids: &[CounterId], stock: i64) -> Result<()>;
}

/// One open transaction against a [`CounterStore`]
///
/// Writes become visible to other transactions only on [`commit`]. Dropping
/// a transaction without committing rolls it back.
///
/// [`commit`]: StoreTransaction::commit
pub trait StoreTransaction {
    /// Isolation level this transaction was started with
    fn isolation(&self) -> IsolationLevel;

    /// Read the row without locking it
    ///
    /// Sees this transaction's own pending write if there is one.
    fn read(&mut self, id: CounterId) -> Result<Counter>;

    /// Read the row after acquiring its exclusive lock
    ///
    /// The lock is held until the transaction commits or rolls back; other
    /// callers requesting it block until then.
    fn read_for_update(&mut self, id: CounterId) -> Result<Counter>;

    /// Compare-and-swap on `version`
    ///
    /// Stages `stock = new_stock, version = expected_version + 1` only if the
    /// stored version still equals `expected_version`. Returns the number of
    /// rows affected: 1 on match, 0 on mismatch. A mismatch is not an error.
    fn conditional_write(
        &mut self,
        id: CounterId,
        expected_version: u64,
        new_stock: i64,
    ) -> Result<u64>;

    /// Unconditional write of `stock`; the version is bumped by one
    fn write(&mut self, id: CounterId, new_stock: i64) -> Result<()>;

    /// Make all staged writes visible atomically and release every lock
    ///
    /// # Errors
    ///
    /// Returns `IsolationFailure` if a serializable transaction observed a row
    /// that changed before it could commit. Nothing is applied in that case.
    fn commit(self: Box<Self>) -> Result<()>;

    /// Discard all staged writes and release every lock
    fn rollback(self: Box<Self>);
}
