//! Error types for lockbench
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Only `Conflict` is ever retried, and only inside the optimistic strategy.
//! Every other kind is terminal and surfaces to the caller as a failed
//! `TransactionResult`.

use crate::types::CounterId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for lockbench operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the Counter Store and the Strategy Engine
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// Counter id does not exist
    #[error("Counter {0} not found")]
    NotFound(CounterId),

    /// Optimistic version mismatch
    #[error("Version conflict on counter {id}: expected {expected}, got {actual}")]
    Conflict {
        /// Counter the conflict was detected on
        id: CounterId,
        /// Version the writer based its update on
        expected: u64,
        /// Version found in the store
        actual: u64,
    },

    /// Optimistic strategy gave up after its retry budget
    #[error("Max retries exceeded")]
    MaxRetriesExceeded {
        /// Attempts consumed
        retries: usize,
    },

    /// Serializable commit was rejected by the store
    ///
    /// The message is the store's own text and is surfaced verbatim.
    #[error("{0}")]
    IsolationFailure(String),

    /// The store could not be reached or refused the operation
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Waiting for a row lock exceeded the configured timeout
    #[error("Lock wait on counter {id} timed out after {waited:?}")]
    LockTimeout {
        /// Counter whose lock could not be acquired
        id: CounterId,
        /// How long the caller waited
        waited: Duration,
    },

    /// The caller cancelled the operation before it committed
    #[error("Operation cancelled")]
    Cancelled,

    /// Invalid request parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Machine-readable category of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`Error::NotFound`]
    NotFound,
    /// See [`Error::Conflict`]
    Conflict,
    /// See [`Error::MaxRetriesExceeded`]
    MaxRetriesExceeded,
    /// See [`Error::IsolationFailure`]
    IsolationFailure,
    /// See [`Error::StoreUnavailable`]
    StoreUnavailable,
    /// See [`Error::LockTimeout`]
    LockTimeout,
    /// See [`Error::Cancelled`]
    Cancelled,
    /// See [`Error::InvalidInput`]
    InvalidInput,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::MaxRetriesExceeded => "max_retries_exceeded",
            ErrorKind::IsolationFailure => "isolation_failure",
            ErrorKind::StoreUnavailable => "store_unavailable",
            ErrorKind::LockTimeout => "lock_timeout",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::InvalidInput => "invalid_input",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Conflict { .. } => ErrorKind::Conflict,
            Error::MaxRetriesExceeded { .. } => ErrorKind::MaxRetriesExceeded,
            Error::IsolationFailure(_) => ErrorKind::IsolationFailure,
            Error::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            Error::LockTimeout { .. } => ErrorKind::LockTimeout,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }

    /// True for optimistic version mismatches
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    /// True for every kind that must not be retried by the engine
    pub fn is_terminal(&self) -> bool {
        !self.is_conflict()
    }
}
