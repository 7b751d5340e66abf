//! Poll configuration: attempt budget, window size, pacing, timeout disposition.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::disposition::TimeoutDisposition;
use crate::error::ConfigError;

pub const ENV_MAX_TRIES: &str = "CONVERGE_MAX_TRIES";
pub const ENV_MIN_CONSECUTIVE: &str = "CONVERGE_MIN_CONSECUTIVE";
pub const ENV_SLEEP_MS: &str = "CONVERGE_SLEEP_MS";
pub const ENV_STRICT_TIMEOUT: &str = "CONVERGE_STRICT_TIMEOUT";

/// Configuration for a single convergence wait.
///
/// The defaults (window of 3, 25ms late-phase sleep) were tuned against one
/// external store's observed flakiness and are only starting points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollConfig {
    /// Highest attempt index evaluated. The predicate runs `max_tries + 1` times at most.
    pub max_tries: u32,
    /// Number of consecutive `true` results required to declare convergence.
    pub min_consecutive: usize,
    /// Late-phase delay between attempts (milliseconds).
    pub sleep_ms: u64,
    /// Treat a timeout as a hard error instead of an inconclusive result.
    pub strict_timeout: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_tries: 100,
            min_consecutive: 3,
            sleep_ms: 25,
            strict_timeout: false,
        }
    }
}

impl PollConfig {
    pub fn with_max_tries(mut self, max_tries: u32) -> Self {
        self.max_tries = max_tries;
        self
    }

    pub fn with_min_consecutive(mut self, min_consecutive: usize) -> Self {
        self.min_consecutive = min_consecutive;
        self
    }

    pub fn with_sleep_ms(mut self, sleep_ms: u64) -> Self {
        self.sleep_ms = sleep_ms;
        self
    }

    pub fn with_strict_timeout(mut self, strict: bool) -> Self {
        self.strict_timeout = strict;
        self
    }

    /// Total predicate evaluations a poll may perform (`max_tries + 1`).
    pub fn attempt_budget(&self) -> u64 {
        u64::from(self.max_tries) + 1
    }

    pub fn sleep_duration(&self) -> Duration {
        Duration::from_millis(self.sleep_ms)
    }

    pub fn disposition(&self) -> TimeoutDisposition {
        if self.strict_timeout {
            TimeoutDisposition::Strict
        } else {
            TimeoutDisposition::Skip
        }
    }

    /// Check the invariants the poller relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_consecutive == 0 {
            return Err(ConfigError::InvalidField {
                field: "min_consecutive",
                reason: "must be at least 1".into(),
            });
        }
        if self.sleep_ms == 0 {
            return Err(ConfigError::InvalidField {
                field: "sleep_ms",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Defaults overlaid with any `CONVERGE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) but reads values through `lookup`.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(v) = parse_var(&lookup, ENV_MAX_TRIES)? {
            config.max_tries = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_MIN_CONSECUTIVE)? {
            config.min_consecutive = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_SLEEP_MS)? {
            config.sleep_ms = v;
        }
        if let Some(raw) = lookup(ENV_STRICT_TIMEOUT) {
            config.strict_timeout = parse_flag(ENV_STRICT_TIMEOUT, &raw)?;
        }
        config.validate()?;
        Ok(config)
    }
}

fn parse_var<L, T>(lookup: &L, key: &str) -> Result<Option<T>, ConfigError>
where
    L: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv {
                key: key.to_string(),
                value: raw,
            }),
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}
