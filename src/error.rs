//! Unified error types for apcalc.

use thiserror::Error;

/// The main error type for apcalc operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Argument outside the mathematical domain of the operation.
    #[error("Domain error in {operation}: {reason}")]
    Domain {
        operation: &'static str,
        reason: String,
    },

    /// Malformed random number generator descriptor. No tokens were consumed.
    #[error("Invalid generator descriptor: {0}")]
    Parse(String),

    /// Live/cached value accounting does not balance.
    #[error("Value accounting mismatch: {live} live values, expected {owned} owned + {cached} cached")]
    InvariantViolation {
        live: usize,
        owned: usize,
        cached: usize,
    },
}

impl Error {
    pub(crate) fn domain(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Domain {
            operation,
            reason: reason.into(),
        }
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
