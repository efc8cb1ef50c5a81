//! Strategy Engine for lockbench
//!
//! This crate implements the four decrement strategies over a
//! [`CounterStore`](lockbench_core::CounterStore):
//! - no_lock: read, compute, blind write (lost updates possible)
//! - pessimistic: exclusive row lock before reading
//! - optimistic: version compare-and-swap with bounded retry
//! - serializable: serializable transaction, fails on anomalies
//!
//! Every entry point takes the store as an explicit argument and returns a
//! [`TransactionResult`](lockbench_core::TransactionResult); errors never
//! cross this boundary. The engine keeps no in-process shared state: all
//! coordination is done by the store's locks and version checks.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cancel;
mod common;
pub mod engine;
pub mod no_lock;
pub mod optimistic;
pub mod pessimistic;
pub mod retry;
pub mod serializable;

pub use cancel::CancellationToken;
pub use engine::StrategyEngine;
pub use retry::RetryConfig;
