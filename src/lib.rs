//! lockbench - concurrency-control strategies for decrementing a shared counter
//!
//! Four ways to take `quantity` units out of a counter that many workers hit
//! at once, each reporting a uniform [`TransactionResult`]:
//!
//! | Strategy | Coordination | Lost updates |
//! |----------|--------------|--------------|
//! | `no-lock` | none | possible |
//! | `pessimistic` | row lock held until commit | impossible |
//! | `optimistic` | version compare-and-swap, bounded retry | impossible |
//! | `serializable` | commit-time validation, losers fail | impossible |
//!
//! # Quick Start
//!
//! ```ignore
//! use lockbench::{Counter, CounterId, MemoryStore, Strategy, StrategyEngine};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! store.insert(Counter::new(CounterId(1), "Product 1", 1000))?;
//!
//! let engine = StrategyEngine::new(store);
//! let result = engine.decrement(Strategy::Optimistic, CounterId(1), 1);
//! assert!(result.success);
//! ```
//!
//! # Architecture
//!
//! - `lockbench-core`: types, errors, the `CounterStore` contract
//! - `lockbench-storage`: in-memory store with row locks and versioned CAS
//! - `lockbench-concurrency`: the four strategies and the `StrategyEngine`

pub use lockbench_concurrency::{
    no_lock, optimistic, pessimistic, serializable, CancellationToken, RetryConfig,
    StrategyEngine,
};
pub use lockbench_core::{
    Counter, CounterId, CounterStore, Error, ErrorKind, IsolationLevel, Result, Strategy,
    StoreTransaction, TransactionResult,
};
pub use lockbench_storage::{testing, MemoryStore, StoreConfig, SERIALIZATION_FAILURE};
