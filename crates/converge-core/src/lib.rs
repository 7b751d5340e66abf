//! Converge Core Library
//!
//! Waits out eventually-consistent state in async tests. A predicate is
//! polled until it holds for several *consecutive* evaluations, with cheap
//! cooperative yields early on and timed sleeps once convergence is slow.
//! A timeout is either reported as inconclusive (skip mode, the default) or
//! raised as an error (strict mode).
//!
//! ```ignore
//! use converge_core::{source_location, wait_until_consistent, PollConfig};
//!
//! let verdict = wait_until_consistent(&PollConfig::default(), source_location!(), || async {
//!     store.is_active("pro.monthly").await
//! })
//! .await?;
//! if let Some(reason) = verdict.skip_reason() {
//!     eprintln!("skipping: {reason}");
//! }
//! ```

pub mod config;
pub mod disposition;
pub mod error;
pub mod location;
pub mod metrics;
pub mod obs;
pub mod poller;
pub mod telemetry;
pub mod window;

pub use config::PollConfig;
pub use disposition::{
    wait_until_consistent, ConvergenceReport, InconclusiveReport, TimeoutDisposition, WaitVerdict,
};
pub use error::{ConfigError, ConvergenceTimeout, WaitError};
pub use location::SourceLocation;
pub use metrics::METRICS;
pub use obs::{emit_poll_converged, emit_poll_skipped, emit_poll_timed_out, poll_span};
pub use poller::{poll_until_consistent, Pacing, PollOutcome};
pub use telemetry::init_tracing;
pub use window::ConsistencyWindow;

/// converge-core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
