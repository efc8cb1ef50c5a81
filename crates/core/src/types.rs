//! Core types for lockbench
//!
//! This module defines the foundational types:
//! - CounterId: Stable identity of a counter row
//! - Counter: The persisted counter row (stock + version)
//! - IsolationLevel: Isolation requested when a transaction begins

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a counter row
///
/// Identity is assigned once when the counter is created and never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CounterId(pub u64);

impl CounterId {
    /// Create a CounterId from a raw integer
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw integer value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for CounterId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for CounterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted counter row (e.g. a product's inventory)
///
/// ## Invariants
///
/// - `id` and `name` never change after creation
/// - `version` increases by exactly 1 per successful write
/// - `stock` is signed: overdraft below zero is representable and not rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    /// Stable identity
    pub id: CounterId,
    /// Display name
    pub name: String,
    /// Current stock
    pub stock: i64,
    /// Write counter used for optimistic concurrency
    pub version: u64,
    /// Time of the last successful write
    pub updated_at: DateTime<Utc>,
}

impl Counter {
    /// Create a counter at version 0
    pub fn new(id: CounterId, name: impl Into<String>, stock: i64) -> Self {
        Self {
            id,
            name: name.into(),
            stock,
            version: 0,
            updated_at: Utc::now(),
        }
    }

    /// Produce the row that results from writing `stock` on top of this one
    ///
    /// The returned row has `version + 1` and a fresh `updated_at`.
    pub fn next(&self, stock: i64) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            stock,
            version: self.version + 1,
            updated_at: Utc::now(),
        }
    }
}

/// Transaction isolation level requested from the Counter Store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    /// The store's default level (read committed)
    #[default]
    Default,
    /// Serializable: commit is rejected if any row read was changed concurrently
    Serializable,
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IsolationLevel::Default => write!(f, "default"),
            IsolationLevel::Serializable => write!(f, "serializable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_new_starts_at_version_zero() {
        let counter = Counter::new(CounterId(1), "widget", 1000);
        assert_eq!(counter.version, 0);
        assert_eq!(counter.stock, 1000);
        assert_eq!(counter.name, "widget");
    }

    #[test]
    fn test_counter_next_bumps_version_by_one() {
        let counter = Counter::new(CounterId(7), "widget", 10);
        let next = counter.next(9);
        assert_eq!(next.id, counter.id);
        assert_eq!(next.name, counter.name);
        assert_eq!(next.stock, 9);
        assert_eq!(next.version, 1);
        assert!(next.updated_at >= counter.updated_at);
    }

    #[test]
    fn test_counter_next_allows_negative_stock() {
        let counter = Counter::new(CounterId(1), "widget", 0);
        assert_eq!(counter.next(-3).stock, -3);
    }

    #[test]
    fn test_counter_id_display_and_serde() {
        let id = CounterId::from(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        assert_eq!(id.as_u64(), 42);
    }

    #[test]
    fn test_isolation_level_default() {
        assert_eq!(IsolationLevel::default(), IsolationLevel::Default);
        assert_eq!(IsolationLevel::Serializable.to_string(), "serializable");
    }
}
