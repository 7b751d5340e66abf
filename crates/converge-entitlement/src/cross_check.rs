//! Diagnostic comparison of the active-subscription set against the
//! transaction listing.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::TransactionRecord;

/// Disagreement between the two store views. Never an error on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementMismatch {
    /// Listed as active, but no transaction grants it.
    pub active_without_transaction: Vec<String>,
    /// Granted by a purchased transaction, but missing from the active set.
    pub transaction_without_active: Vec<String>,
}

impl EntitlementMismatch {
    /// Whether `product_id` appears on either side of the mismatch.
    pub fn involves(&self, product_id: &str) -> bool {
        self.active_without_transaction
            .iter()
            .chain(&self.transaction_without_active)
            .any(|id| id == product_id)
    }
}

/// Compare the active set with the ids of entitlement-granting transactions.
///
/// Returns `None` when both views agree.
pub fn cross_check(
    active: &BTreeSet<String>,
    transactions: &[TransactionRecord],
) -> Option<EntitlementMismatch> {
    let granted: BTreeSet<&str> = transactions
        .iter()
        .filter(|t| t.is_active())
        .map(|t| t.product_id.as_str())
        .collect();
    let active: BTreeSet<&str> = active.iter().map(String::as_str).collect();

    let active_without_transaction: Vec<String> =
        active.difference(&granted).map(|id| id.to_string()).collect();
    let transaction_without_active: Vec<String> =
        granted.difference(&active).map(|id| id.to_string()).collect();

    if active_without_transaction.is_empty() && transaction_without_active.is_empty() {
        None
    } else {
        Some(EntitlementMismatch {
            active_without_transaction,
            transaction_without_active,
        })
    }
}
