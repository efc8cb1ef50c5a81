//! Store configuration
//!
//! Plain data, deserializable from the `[store]` table of `lockbench.toml`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a [`MemoryStore`](crate::MemoryStore)
///
/// # Example
///
/// ```toml
/// [store]
/// # Give up waiting for a row lock after this many milliseconds
/// lock_timeout_ms = 2000
/// # Sleep this long on every store call, like a network round trip
/// op_latency_us = 200
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Row lock wait limit in milliseconds (None = wait forever)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_timeout_ms: Option<u64>,
    /// Simulated latency of every store call in microseconds (0 = none)
    pub op_latency_us: u64,
}

impl StoreConfig {
    /// Create a StoreConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the row lock wait limit
    pub fn with_lock_timeout_ms(mut self, lock_timeout_ms: u64) -> Self {
        self.lock_timeout_ms = Some(lock_timeout_ms);
        self
    }

    /// Set the simulated per-call latency
    pub fn with_op_latency_us(mut self, op_latency_us: u64) -> Self {
        self.op_latency_us = op_latency_us;
        self
    }

    /// Row lock wait limit as a Duration
    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_ms.map(Duration::from_millis)
    }

    /// Simulated per-call latency as a Duration, if any
    pub fn op_latency(&self) -> Option<Duration> {
        (self.op_latency_us > 0).then(|| Duration::from_micros(self.op_latency_us))
    }
}
