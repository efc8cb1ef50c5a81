//! Uniform outcome of one decrement
//!
//! Every strategy returns a [`TransactionResult`] instead of an error: callers
//! inspect `success` and `error`. The value is transient and never persisted.

use crate::error::{Error, ErrorKind};
use crate::strategy::Strategy;
use crate::types::CounterId;
use serde::{Serialize, Serializer};
use std::time::Duration;

/// Outcome of a single decrement call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionResult {
    /// Whether the decrement committed
    pub success: bool,
    /// Strategy that produced this result
    pub strategy: Strategy,
    /// Target counter
    pub counter_id: CounterId,
    /// Stock observed before the decrement (0 if never observed)
    pub old_stock: i64,
    /// Stock written, or the last attempted value on optimistic exhaustion
    pub new_stock: i64,
    /// Optimistic conflicts consumed (always 0 for other strategies)
    pub retries: usize,
    /// Wall-clock duration of the whole call, including retries
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    /// Human-readable failure reason, present only when `success` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Failure category, present only when `success` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

fn serialize_millis<S: Serializer>(elapsed: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(elapsed.as_secs_f64() * 1000.0)
}

impl TransactionResult {
    /// Build a successful result
    pub fn succeeded(
        strategy: Strategy,
        counter_id: CounterId,
        old_stock: i64,
        new_stock: i64,
        retries: usize,
        elapsed: Duration,
    ) -> Self {
        Self {
            success: true,
            strategy,
            counter_id,
            old_stock,
            new_stock,
            retries,
            elapsed,
            error: None,
            error_kind: None,
        }
    }

    /// Build a failed result from an error
    ///
    /// `old_stock`/`new_stock` are whatever the strategy last computed; pass 0
    /// when nothing was observed.
    pub fn failed(
        strategy: Strategy,
        counter_id: CounterId,
        old_stock: i64,
        new_stock: i64,
        retries: usize,
        elapsed: Duration,
        error: &Error,
    ) -> Self {
        Self {
            success: false,
            strategy,
            counter_id,
            old_stock,
            new_stock,
            retries,
            elapsed,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
        }
    }

    /// Elapsed time in fractional milliseconds
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }
}
