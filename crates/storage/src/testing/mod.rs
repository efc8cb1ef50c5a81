//! Testing utilities for failure paths
//!
//! This module provides tools for driving the strategies into states that a
//! healthy store rarely produces on demand:
//!
//! - **Faulty Store**: wraps any `CounterStore` and injects a chosen fault
//!   (forced CAS conflicts, unavailable store, rejected or dropped commits)
//!
//! # Example
//!
//! ```ignore
//! use lockbench_storage::testing::{Fault, FaultyStore};
//!
//! let store = FaultyStore::new(MemoryStore::new(), Fault::ForceConflicts);
//! // every conditional_write now reports 0 rows affected
//! ```

mod faulty;

pub use faulty::{Fault, FaultyStore, OpCounts};
