//! The external store the adapter polls.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::EntitlementResult;
use crate::model::{PurchaseOptions, TransactionRecord};

/// Asynchronous view of a store's entitlement state.
///
/// The two queries are independent data sources and may disagree while the
/// store propagates changes. Implementations must be safe to query
/// repeatedly; the adapter calls [`active_product_ids`](Self::active_product_ids)
/// once per poll attempt.
#[async_trait]
pub trait EntitlementSource: Send + Sync {
    /// Identifiers of currently active subscriptions.
    async fn active_product_ids(&self) -> EntitlementResult<BTreeSet<String>>;

    /// Known transactions with their current state.
    async fn transactions(&self) -> EntitlementResult<Vec<TransactionRecord>>;

    /// Perform a purchase. Errors are returned as-is and never retried.
    async fn purchase(&self, product_id: &str, options: &PurchaseOptions)
        -> EntitlementResult<()>;
}
