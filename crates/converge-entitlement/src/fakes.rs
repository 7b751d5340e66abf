//! In-memory entitlement source for tests and simulations.
//!
//! [`MemoryEntitlementSource`] models a store whose active-subscription view
//! lags behind or flip-flops: responses can be scripted per query, a product
//! can be made to oscillate forever, and purchases can take a configurable
//! number of queries to show up.

use std::collections::{BTreeSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::{EntitlementError, EntitlementResult};
use crate::model::{PurchaseOptions, TransactionRecord, TransactionState};
use crate::source::EntitlementSource;

#[derive(Debug, Default)]
struct FakeState {
    /// Responses served (front first) before falling back to `settled`.
    scripted: VecDeque<BTreeSet<String>>,
    settled: BTreeSet<String>,
    /// Present on even-indexed queries, absent on odd ones.
    oscillating: Option<String>,
    transactions: Vec<TransactionRecord>,
    /// Stale active-set responses queued by each successful purchase.
    activation_lag: usize,
    fail_active_query_at: Option<usize>,
    purchase_failure: Option<String>,
    active_queries: usize,
    transaction_queries: usize,
    purchases: Vec<(String, PurchaseOptions)>,
}

/// Scriptable in-memory [`EntitlementSource`].
#[derive(Debug, Default)]
pub struct MemoryEntitlementSource {
    state: Mutex<FakeState>,
}

impl MemoryEntitlementSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&mut self) -> &mut FakeState {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    /// Active set returned once scripted responses run out.
    pub fn with_active<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.state_mut().settled = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Queue one active-set response per entry, served in order.
    pub fn with_script<I, J, T>(mut self, responses: I) -> Self
    where
        I: IntoIterator<Item = J>,
        J: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let state = self.state_mut();
        for response in responses {
            state
                .scripted
                .push_back(response.into_iter().map(Into::into).collect());
        }
        self
    }

    /// Make `product_id` alternate between present and absent on every
    /// unscripted query, starting present.
    pub fn oscillating(mut self, product_id: impl Into<String>) -> Self {
        self.state_mut().oscillating = Some(product_id.into());
        self
    }

    pub fn with_transactions<I>(mut self, records: I) -> Self
    where
        I: IntoIterator<Item = TransactionRecord>,
    {
        self.state_mut().transactions = records.into_iter().collect();
        self
    }

    /// Number of stale active-set reads after each purchase before it shows up.
    pub fn with_activation_lag(mut self, queries: usize) -> Self {
        self.state_mut().activation_lag = queries;
        self
    }

    /// Fail the active-set query with this 0-based index.
    pub fn fail_active_query_at(mut self, query_index: usize) -> Self {
        self.state_mut().fail_active_query_at = Some(query_index);
        self
    }

    /// Reject every purchase with `reason`.
    pub fn fail_purchases(mut self, reason: impl Into<String>) -> Self {
        self.state_mut().purchase_failure = Some(reason.into());
        self
    }

    pub fn active_query_count(&self) -> usize {
        self.lock().active_queries
    }

    pub fn transaction_query_count(&self) -> usize {
        self.lock().transaction_queries
    }

    /// Every purchase attempted so far, including rejected ones.
    pub fn purchases(&self) -> Vec<(String, PurchaseOptions)> {
        self.lock().purchases.clone()
    }
}

#[async_trait]
impl EntitlementSource for MemoryEntitlementSource {
    async fn active_product_ids(&self) -> EntitlementResult<BTreeSet<String>> {
        let mut state = self.lock();
        let index = state.active_queries;
        state.active_queries += 1;

        if state.fail_active_query_at == Some(index) {
            return Err(EntitlementError::Query(format!(
                "injected failure on active query {index}"
            )));
        }
        if let Some(response) = state.scripted.pop_front() {
            return Ok(response);
        }

        let mut active = state.settled.clone();
        if let Some(id) = &state.oscillating {
            if index % 2 == 0 {
                active.insert(id.clone());
            } else {
                active.remove(id);
            }
        }
        Ok(active)
    }

    async fn transactions(&self) -> EntitlementResult<Vec<TransactionRecord>> {
        let mut state = self.lock();
        state.transaction_queries += 1;
        Ok(state.transactions.clone())
    }

    async fn purchase(
        &self,
        product_id: &str,
        options: &PurchaseOptions,
    ) -> EntitlementResult<()> {
        let mut state = self.lock();
        state
            .purchases
            .push((product_id.to_string(), options.clone()));

        if let Some(reason) = &state.purchase_failure {
            return Err(EntitlementError::Purchase {
                product_id: product_id.to_string(),
                reason: reason.clone(),
            });
        }

        let stale = state.settled.clone();
        for _ in 0..state.activation_lag {
            state.scripted.push_back(stale.clone());
        }
        state.settled.insert(product_id.to_string());
        state
            .transactions
            .push(TransactionRecord::new(product_id, TransactionState::Purchased));
        Ok(())
    }
}
