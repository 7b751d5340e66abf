//! Error types for entitlement queries and waits.

use converge_core::{ConfigError, ConvergenceTimeout, WaitError};

/// Errors produced by an [`EntitlementSource`](crate::EntitlementSource) or by
/// waiting on one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntitlementError {
    #[error("entitlement query failed: {0}")]
    Query(String),

    #[error("purchase of {product_id} failed: {reason}")]
    Purchase { product_id: String, reason: String },

    #[error(transparent)]
    Timeout(#[from] ConvergenceTimeout),

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}

impl From<WaitError<EntitlementError>> for EntitlementError {
    fn from(err: WaitError<EntitlementError>) -> Self {
        match err {
            WaitError::Predicate(inner) => inner,
            WaitError::Timeout(timeout) => EntitlementError::Timeout(timeout),
            WaitError::InvalidConfig(config) => EntitlementError::InvalidConfig(config),
        }
    }
}

/// Result type for entitlement operations.
pub type EntitlementResult<T> = std::result::Result<T, EntitlementError>;

#[cfg(test)]
mod tests {
    use super::*;
    use converge_core::SourceLocation;

    #[test]
    fn test_purchase_error_display() {
        let err = EntitlementError::Purchase {
            product_id: "pro.monthly".into(),
            reason: "user cancelled".into(),
        };
        assert_eq!(err.to_string(), "purchase of pro.monthly failed: user cancelled");
    }

    #[test]
    fn test_predicate_error_unwrapped_unchanged() {
        let inner = EntitlementError::Query("store offline".into());
        let converted = EntitlementError::from(WaitError::Predicate(inner.clone()));
        assert_eq!(converted, inner);
    }

    #[test]
    fn test_timeout_carried_over() {
        let timeout = ConvergenceTimeout {
            attempts: 3,
            elapsed_ms: 0,
            location: SourceLocation::unknown(),
        };
        let converted = EntitlementError::from(WaitError::Timeout(timeout.clone()));
        assert_eq!(converted, EntitlementError::Timeout(timeout));
    }
}
