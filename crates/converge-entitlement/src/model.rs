//! Transaction and purchase model shared by entitlement sources.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a store transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    Purchased,
    Pending,
    Revoked,
    Expired,
    Failed,
}

impl TransactionState {
    /// Whether a transaction in this state should grant an entitlement.
    pub fn grants_entitlement(&self) -> bool {
        matches!(self, TransactionState::Purchased)
    }
}

/// One entry of the store's transaction listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub product_id: String,
    pub state: TransactionState,
}

impl TransactionRecord {
    pub fn new(product_id: impl Into<String>, state: TransactionState) -> Self {
        Self {
            product_id: product_id.into(),
            state,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.grants_entitlement()
    }
}

/// Options forwarded to the store's purchase action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOptions {
    pub quantity: u32,
    /// Opaque account token associating the purchase with an app user.
    pub app_account_token: Option<Uuid>,
}

impl Default for PurchaseOptions {
    fn default() -> Self {
        Self {
            quantity: 1,
            app_account_token: None,
        }
    }
}

impl PurchaseOptions {
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_app_account_token(mut self, token: Uuid) -> Self {
        self.app_account_token = Some(token);
        self
    }
}
