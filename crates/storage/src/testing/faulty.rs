//! Fault-injecting Counter Store wrapper
//!
//! Delegates to an inner store and overrides one behavior according to a
//! [`Fault`]. Operation counters let tests assert how many store calls a
//! strategy made (e.g. that an unavailable store was not retried).

use lockbench_core::error::{Error, Result};
use lockbench_core::traits::{CounterStore, StoreTransaction};
use lockbench_core::types::{Counter, CounterId, IsolationLevel};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Fault injected by a [`FaultyStore`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Fault {
    /// Behave exactly like the inner store
    #[default]
    None,
    /// Every conditional write reports 0 rows affected
    ForceConflicts,
    /// The first `n` conditional writes report 0 rows affected
    ConflictTimes(u64),
    /// `begin` and `read` fail with `StoreUnavailable(message)`
    Unavailable(String),
    /// Every commit fails with `IsolationFailure(message)`
    RejectCommits(String),
    /// `begin`, reads and writes work but every commit fails with
    /// `StoreUnavailable(message)`, as if the connection dropped mid-transaction
    UnavailableAtCommit(String),
}

/// Snapshot of store calls observed by a [`FaultyStore`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpCounts {
    /// Transactions begun (including failed attempts)
    pub begins: u64,
    /// Conditional writes issued
    pub conditional_writes: u64,
    /// Commits attempted
    pub commits: u64,
    /// Explicit rollbacks
    pub rollbacks: u64,
}

#[derive(Default)]
struct Counters {
    begins: AtomicU64,
    conditional_writes: AtomicU64,
    commits: AtomicU64,
    rollbacks: AtomicU64,
}

/// A store that injects a [`Fault`] in front of `S`
pub struct FaultyStore<S> {
    inner: S,
    fault: RwLock<Fault>,
    counters: Counters,
}

impl<S: CounterStore> FaultyStore<S> {
    /// Wrap `inner` with the given fault
    pub fn new(inner: S, fault: Fault) -> Self {
        Self {
            inner,
            fault: RwLock::new(fault),
            counters: Counters::default(),
        }
    }

    /// The wrapped store
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Replace the active fault
    pub fn set_fault(&self, fault: Fault) {
        *self.fault.write() = fault;
    }

    /// Calls observed so far
    pub fn op_counts(&self) -> OpCounts {
        OpCounts {
            begins: self.counters.begins.load(Ordering::Relaxed),
            conditional_writes: self.counters.conditional_writes.load(Ordering::Relaxed),
            commits: self.counters.commits.load(Ordering::Relaxed),
            rollbacks: self.counters.rollbacks.load(Ordering::Relaxed),
        }
    }

    fn unavailable(&self) -> Option<Error> {
        match &*self.fault.read() {
            Fault::Unavailable(msg) => Some(Error::StoreUnavailable(msg.clone())),
            _ => None,
        }
    }

    /// Whether the next conditional write must be forced to miss
    fn force_conflict(&self, seq: u64) -> bool {
        match &*self.fault.read() {
            Fault::ForceConflicts => true,
            Fault::ConflictTimes(n) => seq < *n,
            _ => false,
        }
    }
}

impl<S: CounterStore> CounterStore for FaultyStore<S> {
    fn begin(&self, isolation: IsolationLevel) -> Result<Box<dyn StoreTransaction + '_>> {
        self.counters.begins.fetch_add(1, Ordering::Relaxed);
        if let Some(err) = self.unavailable() {
            return Err(err);
        }
        let inner = self.inner.begin(isolation)?;
        Ok(Box::new(FaultyTransaction { store: self, inner }))
    }

    fn read(&self, id: CounterId) -> Result<Counter> {
        if let Some(err) = self.unavailable() {
            return Err(err);
        }
        self.inner.read(id)
    }

    fn reset(&self, ids: &[CounterId], stock: i64) -> Result<()> {
        self.inner.reset(ids, stock)
    }
}

struct FaultyTransaction<'a, S> {
    store: &'a FaultyStore<S>,
    inner: Box<dyn StoreTransaction + 'a>,
}

impl<S: CounterStore> StoreTransaction for FaultyTransaction<'_, S> {
    fn isolation(&self) -> IsolationLevel {
        self.inner.isolation()
    }

    fn read(&mut self, id: CounterId) -> Result<Counter> {
        self.inner.read(id)
    }

    fn read_for_update(&mut self, id: CounterId) -> Result<Counter> {
        self.inner.read_for_update(id)
    }

    fn conditional_write(
        &mut self,
        id: CounterId,
        expected_version: u64,
        new_stock: i64,
    ) -> Result<u64> {
        let seq = self
            .store
            .counters
            .conditional_writes
            .fetch_add(1, Ordering::Relaxed);
        if self.store.force_conflict(seq) {
            return Ok(0);
        }
        self.inner.conditional_write(id, expected_version, new_stock)
    }

    fn write(&mut self, id: CounterId, new_stock: i64) -> Result<()> {
        self.inner.write(id, new_stock)
    }

    fn commit(self: Box<Self>) -> Result<()> {
        self.store.counters.commits.fetch_add(1, Ordering::Relaxed);
        let rejected = match &*self.store.fault.read() {
            Fault::RejectCommits(msg) => Some(Error::IsolationFailure(msg.clone())),
            Fault::UnavailableAtCommit(msg) => Some(Error::StoreUnavailable(msg.clone())),
            _ => None,
        };
        match rejected {
            Some(err) => {
                self.inner.rollback();
                Err(err)
            }
            None => self.inner.commit(),
        }
    }

    fn rollback(self: Box<Self>) {
        self.store.counters.rollbacks.fetch_add(1, Ordering::Relaxed);
        self.inner.rollback();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn faulty(fault: Fault) -> FaultyStore<MemoryStore> {
        let inner = MemoryStore::new();
        inner
            .insert(Counter::new(CounterId(1), "widget", 10))
            .unwrap();
        FaultyStore::new(inner, fault)
    }

    #[test]
    fn force_conflicts_never_applies() {
        let store = faulty(Fault::ForceConflicts);
        for _ in 0..3 {
            let mut txn = store.begin(IsolationLevel::Default).unwrap();
            assert_eq!(txn.conditional_write(CounterId(1), 0, 9).unwrap(), 0);
            txn.rollback();
        }
        assert_eq!(store.inner().read(CounterId(1)).unwrap().version, 0);
        let counts = store.op_counts();
        assert_eq!(counts.conditional_writes, 3);
        assert_eq!(counts.rollbacks, 3);
    }

    #[test]
    fn conflict_times_then_passes_through() {
        let store = faulty(Fault::ConflictTimes(2));
        let mut results = Vec::new();
        for _ in 0..3 {
            let mut txn = store.begin(IsolationLevel::Default).unwrap();
            results.push(txn.conditional_write(CounterId(1), 0, 9).unwrap());
            txn.rollback();
        }
        assert_eq!(results, vec![0, 0, 1]);
    }

    #[test]
    fn unavailable_fails_begin_and_read() {
        let store = faulty(Fault::Unavailable("connection refused".into()));
        assert!(matches!(
            store.begin(IsolationLevel::Default),
            Err(Error::StoreUnavailable(msg)) if msg == "connection refused"
        ));
        assert!(matches!(
            store.read(CounterId(1)),
            Err(Error::StoreUnavailable(_))
        ));
        assert_eq!(store.op_counts().begins, 1);

        store.set_fault(Fault::None);
        assert_eq!(store.read(CounterId(1)).unwrap().stock, 10);
    }

    #[test]
    fn reject_commits_discards_writes() {
        let store = faulty(Fault::RejectCommits("deadlock detected".into()));
        let mut txn = store.begin(IsolationLevel::Serializable).unwrap();
        txn.write(CounterId(1), 0).unwrap();
        let err = txn.commit().unwrap_err();
        assert_eq!(err.to_string(), "deadlock detected");
        assert_eq!(store.read(CounterId(1)).unwrap().stock, 10);
    }

    #[test]
    fn unavailable_at_commit_discards_writes() {
        let store = faulty(Fault::UnavailableAtCommit("connection reset".into()));
        let mut txn = store.begin(IsolationLevel::Default).unwrap();
        let row = txn.read_for_update(CounterId(1)).unwrap();
        assert_eq!(txn.conditional_write(CounterId(1), row.version, 9).unwrap(), 1);
        assert!(matches!(
            txn.commit(),
            Err(Error::StoreUnavailable(msg)) if msg == "connection reset"
        ));

        let row = store.read(CounterId(1)).unwrap();
        assert_eq!((row.stock, row.version), (10, 0));
        assert_eq!(store.op_counts().commits, 1);

        // Row lock was released by the rollback
        let mut txn = store.begin(IsolationLevel::Default).unwrap();
        txn.read_for_update(CounterId(1)).unwrap();
        txn.rollback();
    }
}
