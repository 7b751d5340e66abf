//! Caller-supplied source location tags attached to diagnostics.

use serde::{Deserialize, Serialize};

/// A `file:line` pair identifying the call site that started a wait.
///
/// Purely descriptive: it prefixes log lines and timeout messages and never
/// influences polling behavior.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Location of whoever called this function.
    #[track_caller]
    pub fn caller() -> Self {
        let loc = std::panic::Location::caller();
        Self::new(loc.file(), loc.line())
    }

    /// Placeholder for callers that have no meaningful location.
    pub fn unknown() -> Self {
        Self::new("<unknown>", 0)
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::unknown()
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Expands to a [`SourceLocation`] for the line it is written on.
#[macro_export]
macro_rules! source_location {
    () => {
        $crate::SourceLocation::new(file!(), line!())
    };
}
