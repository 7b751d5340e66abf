//! Convergence poller: repeat an async predicate until it holds for N
//! consecutive evaluations, or the attempt budget runs out.
//!
//! Pacing is two-phase. For the first half of the budget the poller only
//! yields to the scheduler between attempts; past the halfway point it
//! sleeps for the configured duration. Both pauses are the only places the
//! poll suspends besides the predicate itself, so dropping the returned
//! future cancels the poll at the next of those points.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::PollConfig;
use crate::metrics::METRICS;
use crate::window::ConsistencyWindow;

/// How the poller pauses after an unsuccessful attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Cooperative yield, no timed delay.
    Yield,
    /// Wall-clock sleep.
    Sleep(Duration),
}

impl Pacing {
    /// Pacing for `attempt`: yield while `attempt <= max_tries / 2`, sleep afterwards.
    pub fn for_attempt(attempt: u32, max_tries: u32, sleep: Duration) -> Self {
        if attempt <= max_tries / 2 {
            Pacing::Yield
        } else {
            Pacing::Sleep(sleep)
        }
    }

    pub async fn pause(self) {
        match self {
            Pacing::Yield => tokio::task::yield_now().await,
            Pacing::Sleep(delay) => tokio::time::sleep(delay).await,
        }
    }
}

/// Terminal result of a poll that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PollOutcome {
    /// The window filled with `true` at this 0-indexed attempt.
    Converged { attempt: u32 },
    /// Every attempt was spent; `attempts` is the number of evaluations made.
    TimedOut { attempts: u64 },
}

impl PollOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, PollOutcome::Converged { .. })
    }

    /// Number of predicate evaluations the poll performed.
    pub fn evaluations(&self) -> u64 {
        match self {
            PollOutcome::Converged { attempt } => u64::from(*attempt) + 1,
            PollOutcome::TimedOut { attempts } => *attempts,
        }
    }
}

/// Evaluate `predicate` until the last `config.min_consecutive` results are all `true`.
///
/// Attempts are indexed `0..=config.max_tries`. A predicate error stops the
/// poll immediately and is returned unchanged; only `Ok(bool)` results feed
/// the window.
///
/// `config.min_consecutive` must be at least 1. This function does not call
/// [`PollConfig::validate`]; a window of 0 trips a debug assertion and is
/// treated as 1 in release builds. [`wait_until_consistent`](crate::wait_until_consistent)
/// rejects it before polling.
pub async fn poll_until_consistent<F, Fut, E>(
    config: &PollConfig,
    mut predicate: F,
) -> Result<PollOutcome, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    debug_assert!(
        config.min_consecutive >= 1,
        "min_consecutive must be at least 1"
    );
    let mut window = ConsistencyWindow::new(config.min_consecutive);
    let sleep = config.sleep_duration();
    METRICS.inc_polls_started();

    for attempt in 0..=config.max_tries {
        METRICS.inc_predicate_evaluations();
        let holds = predicate().await?;
        window.push(holds);

        if window.is_consistent() {
            METRICS.inc_polls_converged();
            return Ok(PollOutcome::Converged { attempt });
        }

        let pacing = Pacing::for_attempt(attempt, config.max_tries, sleep);
        tracing::trace!(attempt, holds, ?pacing, "poll attempt not yet consistent");
        pacing.pause().await;
    }

    METRICS.inc_polls_timed_out();
    Ok(PollOutcome::TimedOut {
        attempts: config.attempt_budget(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_tries: u32, min_consecutive: usize) -> PollConfig {
        PollConfig::default()
            .with_max_tries(max_tries)
            .with_min_consecutive(min_consecutive)
            .with_sleep_ms(10)
    }

    #[test]
    fn test_pacing_boundary_at_half_budget() {
        let sleep = Duration::from_millis(25);
        let plan: Vec<Pacing> = (0..=10).map(|i| Pacing::for_attempt(i, 10, sleep)).collect();
        assert!(plan[..=5].iter().all(|p| *p == Pacing::Yield));
        assert!(plan[6..].iter().all(|p| *p == Pacing::Sleep(sleep)));
    }

    #[test]
    fn test_pacing_odd_budget_uses_integer_division() {
        let sleep = Duration::from_millis(1);
        assert_eq!(Pacing::for_attempt(3, 7, sleep), Pacing::Yield);
        assert_eq!(Pacing::for_attempt(4, 7, sleep), Pacing::Sleep(sleep));
    }

    #[test]
    fn test_outcome_evaluations() {
        assert_eq!(PollOutcome::Converged { attempt: 4 }.evaluations(), 5);
        assert_eq!(PollOutcome::TimedOut { attempts: 11 }.evaluations(), 11);
        assert!(PollOutcome::Converged { attempt: 0 }.is_converged());
        assert_eq!(
            PollOutcome::Converged { attempt: u32::MAX }.evaluations(),
            1u64 << 32
        );
    }

    #[cfg(debug_assertions)]
    #[tokio::test]
    #[should_panic(expected = "min_consecutive must be at least 1")]
    async fn test_zero_window_rejected_in_debug() {
        let cfg = config(5, 0);
        let _ = poll_until_consistent(&cfg, || async { Ok::<_, String>(true) }).await;
    }

    #[test]
    fn test_outcome_serde_tagging() {
        let json = serde_json::to_value(PollOutcome::Converged { attempt: 2 }).unwrap();
        assert_eq!(json, serde_json::json!({"status": "converged", "attempt": 2}));
    }

    #[tokio::test]
    async fn test_always_true_converges_when_window_fills() {
        let outcome = poll_until_consistent(&config(10, 3), || async { Ok::<_, String>(true) })
            .await
            .unwrap();
        assert_eq!(outcome, PollOutcome::Converged { attempt: 2 });
    }

    #[tokio::test]
    async fn test_max_tries_zero_evaluates_once() {
        let mut calls = 0u32;
        let outcome = poll_until_consistent(&config(0, 1), || {
            calls += 1;
            async { Ok::<_, String>(false) }
        })
        .await
        .unwrap();
        assert_eq!(outcome, PollOutcome::TimedOut { attempts: 1 });
        assert_eq!(calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_then_fresh() {
        let mut calls = 0u32;
        let outcome = poll_until_consistent(&config(20, 3), || {
            calls += 1;
            let fresh = calls > 4;
            async move { Ok::<_, String>(fresh) }
        })
        .await
        .unwrap();
        assert_eq!(outcome, PollOutcome::Converged { attempt: 6 });
        assert_eq!(calls, 7);
    }

    #[tokio::test]
    async fn test_predicate_error_short_circuits() {
        let mut calls = 0u32;
        let result = poll_until_consistent(&config(50, 3), || {
            calls += 1;
            let n = calls;
            async move {
                if n == 2 {
                    Err("query failed".to_string())
                } else {
                    Ok(true)
                }
            }
        })
        .await;
        assert_eq!(result, Err("query failed".to_string()));
        assert_eq!(calls, 2);
    }
}
