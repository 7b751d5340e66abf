//! Entitlement waits: poll a store until a product shows up as active.
//!
//! - [`wait_for_entitlement`] polls "does the active set contain `product_id`"
//!   with the consistency window from [`PollConfig`].
//! - [`purchase_and_wait`] performs a purchase first, then waits.
//! - [`EntitlementWaiter`] bundles a shared source with a config.
//!
//! After the poll converges or times out, the active set is cross-checked
//! against the transaction listing and any disagreement is logged. The
//! cross-check never changes the verdict.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use converge_core::{wait_until_consistent, PollConfig, SourceLocation, WaitError, WaitVerdict};

use crate::cross_check::{cross_check, EntitlementMismatch};
use crate::error::{EntitlementError, EntitlementResult};
use crate::model::PurchaseOptions;
use crate::obs;
use crate::source::EntitlementSource;

/// Verdict of an entitlement wait plus the diagnostic cross-check result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementReport {
    pub product_id: String,
    pub verdict: WaitVerdict,
    /// Present when the two store views disagreed after the wait.
    pub mismatch: Option<EntitlementMismatch>,
}

/// Wait until `product_id` is consistently reported as active.
///
/// Query failures abort the wait unchanged. A timeout follows the
/// config's disposition: inconclusive verdict in skip mode,
/// [`EntitlementError::Timeout`] in strict mode.
///
/// The cross-check also runs after a strict-mode timeout, but there is no
/// report to attach it to: the mismatch is only visible as the
/// `entitlement.mismatch` warning.
pub async fn wait_for_entitlement<S>(
    source: &S,
    product_id: &str,
    config: &PollConfig,
    location: SourceLocation,
) -> EntitlementResult<EntitlementReport>
where
    S: EntitlementSource + ?Sized,
{
    let result = wait_until_consistent(config, location.clone(), move || async move {
        let active = source.active_product_ids().await?;
        Ok::<_, EntitlementError>(active.contains(product_id))
    })
    .await;

    let mismatch = match &result {
        Ok(_) | Err(WaitError::Timeout(_)) => diagnose(source, product_id, &location).await,
        Err(_) => None,
    };

    Ok(EntitlementReport {
        product_id: product_id.to_string(),
        verdict: result?,
        mismatch,
    })
}

/// Purchase `product_id`, then wait for it to become active.
///
/// A failed purchase is returned as-is without waiting.
pub async fn purchase_and_wait<S>(
    source: &S,
    product_id: &str,
    options: &PurchaseOptions,
    config: &PollConfig,
    location: SourceLocation,
) -> EntitlementResult<EntitlementReport>
where
    S: EntitlementSource + ?Sized,
{
    obs::emit_purchase_started(&location, product_id, options.quantity);
    source.purchase(product_id, options).await?;
    wait_for_entitlement(source, product_id, config, location).await
}

async fn diagnose<S>(
    source: &S,
    product_id: &str,
    location: &SourceLocation,
) -> Option<EntitlementMismatch>
where
    S: EntitlementSource + ?Sized,
{
    let views = async {
        let active = source.active_product_ids().await?;
        let transactions = source.transactions().await?;
        Ok::<_, EntitlementError>((active, transactions))
    };

    match views.await {
        Ok((active, transactions)) => {
            let mismatch = cross_check(&active, &transactions)?;
            obs::emit_entitlement_mismatch(location, product_id, &mismatch);
            Some(mismatch)
        }
        Err(err) => {
            obs::emit_cross_check_unavailable(location, product_id, &err);
            None
        }
    }
}

/// A shared entitlement source paired with the poll settings to use against it.
#[derive(Clone)]
pub struct EntitlementWaiter {
    source: Arc<dyn EntitlementSource>,
    config: PollConfig,
}

impl EntitlementWaiter {
    pub fn new(source: Arc<dyn EntitlementSource>, config: PollConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// See [`wait_for_entitlement`].
    pub async fn wait_for(
        &self,
        product_id: &str,
        location: SourceLocation,
    ) -> EntitlementResult<EntitlementReport> {
        wait_for_entitlement(self.source.as_ref(), product_id, &self.config, location).await
    }

    /// See [`purchase_and_wait`].
    pub async fn purchase_and_wait(
        &self,
        product_id: &str,
        options: &PurchaseOptions,
        location: SourceLocation,
    ) -> EntitlementResult<EntitlementReport> {
        purchase_and_wait(
            self.source.as_ref(),
            product_id,
            options,
            &self.config,
            location,
        )
        .await
    }
}
