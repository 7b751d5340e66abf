//! Structured diagnostics for poll lifecycle events.
//!
//! Every event carries the caller's source location so log lines can be
//! traced back to the waiting test. Nothing here affects poll results.
//!
//! Events are emitted at `info!`/`warn!` level; quick convergence is only
//! reported at `debug!`.

use tracing::{debug, info, warn};

use crate::location::SourceLocation;

/// Span wrapping one wait, tagged with its source location.
pub fn poll_span(location: &SourceLocation) -> tracing::Span {
    tracing::info_span!("converge.poll", location = %location)
}

/// Emit event: the window filled with `true` at `attempt`.
///
/// Convergence at the earliest possible attempt is logged at debug level
/// only; anything slower is worth an info line.
pub fn emit_poll_converged(
    location: &SourceLocation,
    attempt: u32,
    min_consecutive: usize,
    elapsed_ms: u64,
) {
    let evaluations = attempt.saturating_add(1);
    if evaluations as usize <= min_consecutive {
        debug!(
            event = "poll.converged",
            location = %location,
            attempt = attempt,
            elapsed_ms = elapsed_ms,
            "converged quickly"
        );
    } else {
        info!(
            event = "poll.converged",
            location = %location,
            attempt = attempt,
            elapsed_ms = elapsed_ms,
            "took {} attempts to converge",
            evaluations
        );
    }
}

/// Emit event: attempt budget exhausted.
pub fn emit_poll_timed_out(location: &SourceLocation, attempts: u64, elapsed_ms: u64) {
    warn!(
        event = "poll.timed_out",
        location = %location,
        attempts = attempts,
        elapsed_ms = elapsed_ms,
    );
}

/// Emit event: a timeout was downgraded to an inconclusive result.
pub fn emit_poll_skipped(location: &SourceLocation, message: &str) {
    warn!(event = "poll.skipped", location = %location, message = %message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn test_emit_slow_convergence_reports_attempts() {
        emit_poll_converged(&SourceLocation::new("a.rs", 3), 9, 3, 80);
        assert!(logs_contain("took 10 attempts to converge"));
        assert!(logs_contain("a.rs:3"));
    }

    #[traced_test]
    #[test]
    fn test_emit_quick_convergence() {
        emit_poll_converged(&SourceLocation::new("b.rs", 1), 2, 3, 0);
        assert!(logs_contain("converged quickly"));
    }

    #[traced_test]
    #[test]
    fn test_emit_timed_out_is_warning() {
        emit_poll_timed_out(&SourceLocation::new("c.rs", 5), 11, 125);
        assert!(logs_contain("WARN"));
        assert!(logs_contain("poll.timed_out"));
    }

    #[test]
    fn test_poll_span_create() {
        let _span = poll_span(&SourceLocation::unknown());
    }
}
