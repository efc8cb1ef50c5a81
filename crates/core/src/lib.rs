//! Core types and traits for lockbench
//!
//! This crate defines the foundational types used throughout the system:
//! - CounterId / Counter: the persisted counter row
//! - IsolationLevel: transaction isolation requested from the store
//! - Strategy: the four decrement strategies
//! - TransactionResult: uniform outcome of one decrement
//! - Error: error type hierarchy
//! - Traits: the Counter Store contract (CounterStore, StoreTransaction)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod result;
pub mod strategy;
pub mod traits;
pub mod types;

pub use error::{Error, ErrorKind, Result};
pub use result::TransactionResult;
pub use strategy::Strategy;
pub use traits::{CounterStore, StoreTransaction};
pub use types::{Counter, CounterId, IsolationLevel};
