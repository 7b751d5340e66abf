//! Error taxonomy for convergence polling.

use serde::{Deserialize, Serialize};

use crate::location::SourceLocation;

/// Errors produced while building or validating a [`PollConfig`](crate::PollConfig).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid poll configuration: {field} {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("environment variable {key} has unparsable value {value:?}")]
    InvalidEnv { key: String, value: String },
}

/// The attempt budget ran out before the window filled with `true` results.
///
/// Raised only under [`TimeoutDisposition::Strict`](crate::TimeoutDisposition::Strict);
/// skip mode reports the same payload as an inconclusive verdict instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("exceeded timeout at {location}: no consistent result after {attempts} attempt(s) in {elapsed_ms}ms")]
pub struct ConvergenceTimeout {
    pub attempts: u64,
    pub elapsed_ms: u64,
    pub location: SourceLocation,
}

/// Errors returned by [`wait_until_consistent`](crate::wait_until_consistent).
///
/// `E` is the predicate's own error type and is carried through untouched.
#[derive(Debug, thiserror::Error)]
pub enum WaitError<E> {
    #[error("predicate failed: {0}")]
    Predicate(#[source] E),

    #[error(transparent)]
    Timeout(#[from] ConvergenceTimeout),

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}

impl<E> WaitError<E> {
    /// Returns the predicate error, if that is what stopped the wait.
    pub fn into_predicate(self) -> Option<E> {
        match self {
            WaitError::Predicate(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout(_))
    }
}
