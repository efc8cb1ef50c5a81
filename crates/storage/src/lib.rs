//! Storage layer for lockbench
//!
//! This crate implements the Counter Store contract in memory:
//! - MemoryStore: DashMap of rows, each with its own data and row lock
//! - MemoryTransaction: buffered writes, row locks, serializable validation
//! - StoreConfig: lock timeout and simulated round-trip latency
//! - testing: fault-injecting store wrapper for failure-path tests
//!
//! # Locking
//!
//! Every row carries a `parking_lot::Mutex<()>` used as its exclusive lock.
//! Transactions hold owned (`Arc`) guards, so a lock taken by
//! `read_for_update` or by a write stays held across calls until the
//! transaction ends.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod memory;
pub mod testing;
pub mod transaction;

pub use config::StoreConfig;
pub use memory::MemoryStore;
pub use transaction::{MemoryTransaction, SERIALIZATION_FAILURE};
