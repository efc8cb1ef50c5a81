//! Decrement strategy enumeration
//!
//! ## The Four Strategies
//!
//! | Strategy | Coordination | Retries | Lost updates |
//! |----------|--------------|---------|--------------|
//! | NoLock | none | never | possible |
//! | Pessimistic | row lock held until commit | never | impossible |
//! | Optimistic | version compare-and-swap | bounded | impossible |
//! | Serializable | commit-time validation | never | impossible (losers fail) |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four concurrency-control strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Read, compute, write with no coordination (negative control)
    #[serde(rename = "no-lock")]
    NoLock,
    /// Exclusive row lock acquired before reading
    #[serde(rename = "pessimistic")]
    Pessimistic,
    /// Versioned compare-and-swap with bounded retry
    #[serde(rename = "optimistic")]
    Optimistic,
    /// Serializable transaction, failing on anomalies
    #[serde(rename = "serializable")]
    Serializable,
}

impl Strategy {
    /// All strategies (for iteration)
    pub const ALL: [Strategy; 4] = [
        Strategy::NoLock,
        Strategy::Pessimistic,
        Strategy::Optimistic,
        Strategy::Serializable,
    ];

    /// Short identifier (for serialization, CLI arguments, reports)
    pub const fn id(&self) -> &'static str {
        match self {
            Strategy::NoLock => "no-lock",
            Strategy::Pessimistic => "pessimistic",
            Strategy::Optimistic => "optimistic",
            Strategy::Serializable => "serializable",
        }
    }

    /// Parse from short identifier
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "no-lock" => Some(Strategy::NoLock),
            "pessimistic" => Some(Strategy::Pessimistic),
            "optimistic" => Some(Strategy::Optimistic),
            "serializable" => Some(Strategy::Serializable),
            _ => None,
        }
    }

    /// Whether this strategy guarantees no lost updates
    pub const fn prevents_lost_updates(&self) -> bool {
        !matches!(self, Strategy::NoLock)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::from_id(s).ok_or_else(|| {
            format!(
                "unknown strategy '{}'; expected one of: no-lock, pessimistic, optimistic, serializable",
                s
            )
        })
    }
}
