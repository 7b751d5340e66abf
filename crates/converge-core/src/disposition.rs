//! Timeout disposition: turning a poll outcome into a verdict the caller reports.
//!
//! Nothing here marks a test skipped on its own. Skip mode hands back an
//! [`WaitVerdict::Inconclusive`] and the caller decides how its test
//! framework should record that; strict mode raises [`ConvergenceTimeout`].

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::Instrument;

use crate::config::PollConfig;
use crate::error::{ConvergenceTimeout, WaitError};
use crate::location::SourceLocation;
use crate::obs;
use crate::poller::{poll_until_consistent, PollOutcome};

/// What a timed-out poll means to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutDisposition {
    /// Report the timeout as inconclusive, attributed to external flakiness.
    #[default]
    Skip,
    /// Report the timeout as a hard error.
    Strict,
}

impl TimeoutDisposition {
    /// Apply this disposition to a timeout.
    pub fn resolve(self, timeout: ConvergenceTimeout) -> Result<InconclusiveReport, ConvergenceTimeout> {
        match self {
            TimeoutDisposition::Skip => Ok(InconclusiveReport::from(timeout)),
            TimeoutDisposition::Strict => Err(timeout),
        }
    }
}

/// Successful convergence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvergenceReport {
    /// 0-indexed attempt at which the window became consistent.
    pub attempt: u32,
    pub elapsed_ms: u64,
}

/// A timeout reported under skip mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InconclusiveReport {
    pub attempts: u64,
    pub elapsed_ms: u64,
    pub location: SourceLocation,
    /// Human-readable reason suitable for a skipped-test message.
    pub message: String,
}

impl From<ConvergenceTimeout> for InconclusiveReport {
    fn from(timeout: ConvergenceTimeout) -> Self {
        let message = format!(
            "inconclusive at {}: condition never held consistently within {} attempt(s) ({}ms); \
             likely known external state flakiness",
            timeout.location, timeout.attempts, timeout.elapsed_ms
        );
        Self {
            attempts: timeout.attempts,
            elapsed_ms: timeout.elapsed_ms,
            location: timeout.location,
            message,
        }
    }
}

/// Caller-facing result of a wait that did not error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum WaitVerdict {
    Converged(ConvergenceReport),
    Inconclusive(InconclusiveReport),
}

impl WaitVerdict {
    pub fn is_converged(&self) -> bool {
        matches!(self, WaitVerdict::Converged(_))
    }

    pub fn is_inconclusive(&self) -> bool {
        matches!(self, WaitVerdict::Inconclusive(_))
    }

    /// Attempt index at which convergence was reached.
    pub fn converged_at(&self) -> Option<u32> {
        match self {
            WaitVerdict::Converged(report) => Some(report.attempt),
            WaitVerdict::Inconclusive(_) => None,
        }
    }

    /// Message to skip the enclosing test with, if the wait was inconclusive.
    pub fn skip_reason(&self) -> Option<&str> {
        match self {
            WaitVerdict::Converged(_) => None,
            WaitVerdict::Inconclusive(report) => Some(&report.message),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        match self {
            WaitVerdict::Converged(report) => report.elapsed_ms,
            WaitVerdict::Inconclusive(report) => report.elapsed_ms,
        }
    }
}

/// Poll `predicate` per `config` and apply the configured timeout disposition.
///
/// Validates `config` first. Elapsed wall-clock time is measured for the
/// reports only; termination is bounded by the attempt budget alone.
pub async fn wait_until_consistent<F, Fut, E>(
    config: &PollConfig,
    location: SourceLocation,
    predicate: F,
) -> Result<WaitVerdict, WaitError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    config.validate()?;

    let span = obs::poll_span(&location);
    let started = Instant::now();
    let outcome = poll_until_consistent(config, predicate)
        .instrument(span)
        .await
        .map_err(WaitError::Predicate)?;
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match outcome {
        PollOutcome::Converged { attempt } => {
            obs::emit_poll_converged(&location, attempt, config.min_consecutive, elapsed_ms);
            Ok(WaitVerdict::Converged(ConvergenceReport {
                attempt,
                elapsed_ms,
            }))
        }
        PollOutcome::TimedOut { attempts } => {
            obs::emit_poll_timed_out(&location, attempts, elapsed_ms);
            let timeout = ConvergenceTimeout {
                attempts,
                elapsed_ms,
                location,
            };
            let report = config.disposition().resolve(timeout)?;
            obs::emit_poll_skipped(&report.location, &report.message);
            Ok(WaitVerdict::Inconclusive(report))
        }
    }
}
