//! Strategy dispatcher
//!
//! `StrategyEngine` bundles a shared store handle with a retry policy so the
//! harness can issue decrements by [`Strategy`] value. It owns no mutable
//! state; cloning it is cheap and every clone talks to the same store.

use crate::cancel::CancellationToken;
use crate::retry::RetryConfig;
use crate::{no_lock, optimistic, pessimistic, serializable};
use lockbench_core::result::TransactionResult;
use lockbench_core::strategy::Strategy;
use lockbench_core::traits::CounterStore;
use lockbench_core::types::CounterId;
use std::sync::Arc;
use tracing::debug;

/// Store handle plus retry policy, dispatching decrements by strategy
#[derive(Clone)]
pub struct StrategyEngine {
    store: Arc<dyn CounterStore>,
    retry: RetryConfig,
}

impl StrategyEngine {
    /// Engine over `store` with the default retry policy
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self {
            store,
            retry: RetryConfig::default(),
        }
    }

    /// Replace the optimistic retry policy
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The shared store
    pub fn store(&self) -> &Arc<dyn CounterStore> {
        &self.store
    }

    /// The optimistic retry policy
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Decrement with the given strategy
    pub fn decrement(
        &self,
        strategy: Strategy,
        counter_id: CounterId,
        quantity: i64,
    ) -> TransactionResult {
        self.decrement_with_cancel(strategy, counter_id, quantity, &CancellationToken::new())
    }

    /// Decrement with the given strategy, observing `cancel`
    pub fn decrement_with_cancel(
        &self,
        strategy: Strategy,
        counter_id: CounterId,
        quantity: i64,
        cancel: &CancellationToken,
    ) -> TransactionResult {
        let store = self.store.as_ref();
        let result = match strategy {
            Strategy::NoLock => no_lock::decrement(store, counter_id, quantity, cancel),
            Strategy::Pessimistic => pessimistic::decrement(store, counter_id, quantity, cancel),
            Strategy::Optimistic => {
                optimistic::decrement(store, counter_id, quantity, &self.retry, cancel)
            }
            Strategy::Serializable => {
                serializable::decrement(store, counter_id, quantity, cancel)
            }
        };
        debug!(
            target: "lockbench::engine",
            strategy = %strategy,
            counter_id = %counter_id,
            success = result.success,
            retries = result.retries,
            elapsed_ms = result.elapsed_ms(),
            "decrement finished"
        );
        result
    }

    /// No-lock decrement
    pub fn decrement_no_lock(&self, counter_id: CounterId, quantity: i64) -> TransactionResult {
        self.decrement(Strategy::NoLock, counter_id, quantity)
    }

    /// Pessimistic decrement
    pub fn decrement_pessimistic(&self, counter_id: CounterId, quantity: i64) -> TransactionResult {
        self.decrement(Strategy::Pessimistic, counter_id, quantity)
    }

    /// Optimistic decrement using this engine's retry policy
    pub fn decrement_optimistic(&self, counter_id: CounterId, quantity: i64) -> TransactionResult {
        self.decrement(Strategy::Optimistic, counter_id, quantity)
    }

    /// Serializable decrement
    pub fn decrement_serializable(
        &self,
        counter_id: CounterId,
        quantity: i64,
    ) -> TransactionResult {
        self.decrement(Strategy::Serializable, counter_id, quantity)
    }
}

impl std::fmt::Debug for StrategyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyEngine")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
