//! In-memory Counter Store
//!
//! # Design
//!
//! - DashMap: sharded row table, lookups never block on other rows
//! - Row: committed data behind an RwLock plus a separate row lock
//! - Commit lock: validation and apply of one transaction are not
//!   interleaved with another transaction's
//!
//! Readers only take the data RwLock for the duration of a clone, so a
//! point read never waits for a row lock held by an open transaction.

use crate::config::StoreConfig;
use crate::transaction::MemoryTransaction;
use dashmap::DashMap;
use lockbench_core::error::{Error, Result};
use lockbench_core::traits::{CounterStore, StoreTransaction};
use lockbench_core::types::{Counter, CounterId, IsolationLevel};
use parking_lot::{ArcMutexGuard, Mutex, RawMutex, RwLock};
use rustc_hash::FxHasher;
use std::hash::BuildHasherDefault;
use std::sync::Arc;
use tracing::{debug, info};

/// Owned guard on a row lock
pub(crate) type RowGuard = ArcMutexGuard<RawMutex, ()>;

/// A stored counter row
#[derive(Debug)]
pub(crate) struct Row {
    /// Last committed state
    pub(crate) data: RwLock<Counter>,
    /// Exclusive row lock, held by at most one transaction
    pub(crate) lock: Arc<Mutex<()>>,
}

impl Row {
    fn new(counter: Counter) -> Self {
        Self {
            data: RwLock::new(counter),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Clone of the last committed state
    pub(crate) fn committed(&self) -> Counter {
        self.data.read().clone()
    }
}

/// In-memory implementation of [`CounterStore`]
///
/// # Thread Safety
///
/// All operations are thread-safe. Share it between workers with `Arc`.
///
/// # Example
///
/// ```ignore
/// use lockbench_storage::MemoryStore;
/// use lockbench_core::{Counter, CounterId};
///
/// let store = MemoryStore::new();
/// store.insert(Counter::new(CounterId(1), "widget", 1000))?;
/// let counter = store.read(CounterId(1))?;
/// ```
pub struct MemoryStore {
    rows: DashMap<CounterId, Arc<Row>, BuildHasherDefault<FxHasher>>,
    pub(crate) commit_lock: Mutex<()>,
    config: StoreConfig,
}

impl MemoryStore {
    /// Create an empty store with default configuration
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create an empty store with the given configuration
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            rows: DashMap::with_hasher(BuildHasherDefault::default()),
            commit_lock: Mutex::new(()),
            config,
        }
    }

    /// Store configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Create a counter row
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a counter with the same id already exists.
    pub fn insert(&self, counter: Counter) -> Result<()> {
        use dashmap::mapref::entry::Entry;

        match self.rows.entry(counter.id) {
            Entry::Occupied(_) => Err(Error::InvalidInput(format!(
                "counter {} already exists",
                counter.id
            ))),
            Entry::Vacant(slot) => {
                debug!(counter_id = %counter.id, stock = counter.stock, "counter created");
                slot.insert(Arc::new(Row::new(counter)));
                Ok(())
            }
        }
    }

    /// Reset every counter in the store to `stock` at version 0
    pub fn reset_all(&self, stock: i64) -> Result<()> {
        let ids = self.ids();
        self.reset(&ids, stock)
    }

    /// All counter ids, sorted
    pub fn ids(&self) -> Vec<CounterId> {
        let mut ids: Vec<CounterId> = self.rows.iter().map(|r| *r.key()).collect();
        ids.sort();
        ids
    }

    /// Committed state of every counter, sorted by id
    pub fn snapshot(&self) -> Vec<Counter> {
        let mut rows: Vec<Counter> = self.rows.iter().map(|r| r.value().committed()).collect();
        rows.sort_by_key(|c| c.id);
        rows
    }

    /// Number of counters
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the store holds no counters
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a row handle without holding the map shard
    pub(crate) fn row(&self, id: CounterId) -> Result<Arc<Row>> {
        self.rows
            .get(&id)
            .map(|r| Arc::clone(r.value()))
            .ok_or(Error::NotFound(id))
    }

    /// Acquire a row lock, honoring the configured timeout
    pub(crate) fn lock_row(&self, id: CounterId, row: &Row) -> Result<RowGuard> {
        match self.config.lock_timeout() {
            Some(timeout) => row.lock.try_lock_arc_for(timeout).ok_or_else(|| {
                debug!(counter_id = %id, ?timeout, "row lock wait timed out");
                Error::LockTimeout {
                    id,
                    waited: timeout,
                }
            }),
            None => Ok(row.lock.lock_arc()),
        }
    }

    /// Simulated round trip to the store
    pub(crate) fn round_trip(&self) {
        if let Some(latency) = self.config.op_latency() {
            std::thread::sleep(latency);
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterStore for MemoryStore {
    fn begin(&self, isolation: IsolationLevel) -> Result<Box<dyn StoreTransaction + '_>> {
        Ok(Box::new(MemoryTransaction::new(self, isolation)))
    }

    fn read(&self, id: CounterId) -> Result<Counter> {
        self.round_trip();
        Ok(self.row(id)?.committed())
    }

    fn reset(&self, ids: &[CounterId], stock: i64) -> Result<()> {
        // Resolve every id first so a missing one leaves nothing half-reset.
        let rows = ids
            .iter()
            .map(|id| self.row(*id).map(|row| (*id, row)))
            .collect::<Result<Vec<_>>>()?;

        for (id, row) in rows {
            let _guard = row.lock.lock();
            let mut data = row.data.write();
            data.stock = stock;
            data.version = 0;
            data.updated_at = chrono::Utc::now();
            debug!(counter_id = %id, stock, "counter reset");
        }
        info!(count = ids.len(), stock, "counters reset");
        Ok(())
    }
}
