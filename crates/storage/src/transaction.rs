//! Transactions over the in-memory store
//!
//! A MemoryTransaction tracks:
//! - write set: staged rows, applied atomically at commit
//! - lock set: owned row lock guards, released at commit/rollback
//! - read set (serializable only): version observed per row, validated at commit
//!
//! ## Rules
//!
//! - Any write takes the row lock first, as a SQL `UPDATE` would
//! - A mismatched conditional write does not keep a lock it had to take
//! - Reads never take a row lock, except `read_for_update`
//! - Serializable commit fails if any row read has a different committed
//!   version at validation time (first-committer-wins)

use crate::memory::{MemoryStore, Row, RowGuard};
use lockbench_core::error::{Error, Result};
use lockbench_core::traits::StoreTransaction;
use lockbench_core::types::{Counter, CounterId, IsolationLevel};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::debug;

/// Message carried by `IsolationFailure` when serializable validation fails
pub const SERIALIZATION_FAILURE: &str = "could not serialize access due to concurrent update";

/// Lifecycle state of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransactionStatus {
    /// Accepting reads and writes
    Active,
    /// All writes applied
    Committed,
    /// All writes discarded
    Aborted,
}

/// A row staged for commit
struct StagedWrite {
    row: Arc<Row>,
    counter: Counter,
}

/// Transaction against a [`MemoryStore`]
///
/// Created by [`CounterStore::begin`](lockbench_core::CounterStore::begin).
/// Dropping an active transaction rolls it back.
pub struct MemoryTransaction<'a> {
    store: &'a MemoryStore,
    isolation: IsolationLevel,
    status: TransactionStatus,
    read_set: FxHashMap<CounterId, u64>,
    write_set: FxHashMap<CounterId, StagedWrite>,
    locks: FxHashMap<CounterId, RowGuard>,
}

impl<'a> MemoryTransaction<'a> {
    pub(crate) fn new(store: &'a MemoryStore, isolation: IsolationLevel) -> Self {
        Self {
            store,
            isolation,
            status: TransactionStatus::Active,
            read_set: FxHashMap::default(),
            write_set: FxHashMap::default(),
            locks: FxHashMap::default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn status(&self) -> TransactionStatus {
        self.status
    }

    #[cfg(test)]
    pub(crate) fn holds_lock(&self, id: CounterId) -> bool {
        self.locks.contains_key(&id)
    }

    fn ensure_active(&self) -> Result<()> {
        match self.status {
            TransactionStatus::Active => Ok(()),
            other => Err(Error::InvalidInput(format!(
                "transaction is {:?}, not active",
                other
            ))),
        }
    }

    /// Our own staged row, or the last committed one
    fn visible(&self, id: CounterId, row: &Row) -> Counter {
        match self.write_set.get(&id) {
            Some(staged) => staged.counter.clone(),
            None => row.committed(),
        }
    }

    fn record_read(&mut self, counter: &Counter) {
        if self.isolation == IsolationLevel::Serializable {
            self.read_set.entry(counter.id).or_insert(counter.version);
        }
    }

    /// Take the row lock unless already held; returns true if newly taken
    fn acquire(&mut self, id: CounterId, row: &Row) -> Result<bool> {
        if self.locks.contains_key(&id) {
            return Ok(false);
        }
        let guard = self.store.lock_row(id, row)?;
        self.locks.insert(id, guard);
        Ok(true)
    }

    fn stage(&mut self, row: Arc<Row>, counter: Counter) {
        self.write_set.insert(counter.id, StagedWrite { row, counter });
    }

    fn validate(&self) -> Result<()> {
        for (id, seen) in &self.read_set {
            let current = self.store.row(*id)?.committed().version;
            if current != *seen {
                debug!(
                    counter_id = %id,
                    read_version = seen,
                    current_version = current,
                    "serializable validation failed"
                );
                return Err(Error::IsolationFailure(SERIALIZATION_FAILURE.to_string()));
            }
        }
        Ok(())
    }

    fn release(&mut self, status: TransactionStatus) {
        self.write_set.clear();
        self.read_set.clear();
        self.locks.clear();
        self.status = status;
    }
}

impl StoreTransaction for MemoryTransaction<'_> {
    fn isolation(&self) -> IsolationLevel {
        self.isolation
    }

    fn read(&mut self, id: CounterId) -> Result<Counter> {
        self.ensure_active()?;
        self.store.round_trip();
        let row = self.store.row(id)?;
        let counter = self.visible(id, &row);
        self.record_read(&counter);
        Ok(counter)
    }

    fn read_for_update(&mut self, id: CounterId) -> Result<Counter> {
        self.ensure_active()?;
        self.store.round_trip();
        let row = self.store.row(id)?;
        self.acquire(id, &row)?;
        let counter = self.visible(id, &row);
        self.record_read(&counter);
        Ok(counter)
    }

    fn conditional_write(
        &mut self,
        id: CounterId,
        expected_version: u64,
        new_stock: i64,
    ) -> Result<u64> {
        self.ensure_active()?;
        self.store.round_trip();
        let row = self.store.row(id)?;
        let newly_locked = self.acquire(id, &row)?;
        let current = self.visible(id, &row);

        if current.version != expected_version {
            if newly_locked {
                self.locks.remove(&id);
            }
            debug!(
                counter_id = %id,
                expected_version,
                actual_version = current.version,
                "conditional write matched no rows"
            );
            return Ok(0);
        }

        let next = current.next(new_stock);
        self.stage(row, next);
        Ok(1)
    }

    fn write(&mut self, id: CounterId, new_stock: i64) -> Result<()> {
        self.ensure_active()?;
        self.store.round_trip();
        let row = self.store.row(id)?;
        self.acquire(id, &row)?;
        let next = self.visible(id, &row).next(new_stock);
        self.stage(row, next);
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        self.ensure_active()?;
        let store = self.store;
        store.round_trip();

        let _commit_guard = store.commit_lock.lock();

        if self.isolation == IsolationLevel::Serializable {
            if let Err(e) = self.validate() {
                self.release(TransactionStatus::Aborted);
                return Err(e);
            }
        }

        for (_, staged) in self.write_set.drain() {
            *staged.row.data.write() = staged.counter;
        }
        self.release(TransactionStatus::Committed);
        Ok(())
    }

    fn rollback(mut self: Box<Self>) {
        self.release(TransactionStatus::Aborted);
    }
}

impl Drop for MemoryTransaction<'_> {
    fn drop(&mut self) {
        if self.status == TransactionStatus::Active {
            if !self.write_set.is_empty() {
                debug!(
                    pending = self.write_set.len(),
                    "transaction dropped while active; rolling back"
                );
            }
            self.release(TransactionStatus::Aborted);
        }
    }
}
