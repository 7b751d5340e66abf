//! Structured diagnostics for entitlement waits.

use tracing::{info, warn};

use converge_core::SourceLocation;

use crate::cross_check::EntitlementMismatch;

/// Emit event: purchase issued before waiting for the entitlement.
pub fn emit_purchase_started(location: &SourceLocation, product_id: &str, quantity: u32) {
    info!(
        event = "entitlement.purchase",
        location = %location,
        product_id = %product_id,
        quantity = quantity,
    );
}

/// Emit event: active set and transaction listing disagree (warning level).
///
/// The two listings are updated by the store independently, so this is a
/// hint for whoever reads the logs, not a failure.
pub fn emit_entitlement_mismatch(
    location: &SourceLocation,
    product_id: &str,
    mismatch: &EntitlementMismatch,
) {
    warn!(
        event = "entitlement.mismatch",
        location = %location,
        product_id = %product_id,
        active_without_transaction = ?mismatch.active_without_transaction,
        transaction_without_active = ?mismatch.transaction_without_active,
        "active subscriptions and transaction states disagree; the store may update them on different schedules"
    );
}

/// Emit event: the cross-check could not run because a query failed.
pub fn emit_cross_check_unavailable(
    location: &SourceLocation,
    product_id: &str,
    error: &dyn std::fmt::Display,
) {
    warn!(
        event = "entitlement.cross_check_unavailable",
        location = %location,
        product_id = %product_id,
        error = %error,
    );
}
