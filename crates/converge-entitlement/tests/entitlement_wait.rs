//! End-to-end entitlement waits against the in-memory store.

use std::sync::Arc;

use converge_core::{source_location, PollConfig, SourceLocation};
use converge_entitlement::{
    purchase_and_wait, wait_for_entitlement, EntitlementError, EntitlementSource,
    EntitlementWaiter, MemoryEntitlementSource, PurchaseOptions, TransactionRecord,
    TransactionState,
};

const PRODUCT: &str = "pro.monthly";

fn config() -> PollConfig {
    PollConfig::default().with_max_tries(20).with_sleep_ms(25)
}

fn purchased() -> TransactionRecord {
    TransactionRecord::new(PRODUCT, TransactionState::Purchased)
}

// -------------------------------------------------------------------------
// wait_for_entitlement
// -------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_stale_reads_then_converges() {
    let source = MemoryEntitlementSource::new()
        .with_script([Vec::<&str>::new(), vec![], vec![], vec![]])
        .with_active([PRODUCT])
        .with_transactions([purchased()]);

    let report = wait_for_entitlement(&source, PRODUCT, &config(), source_location!())
        .await
        .unwrap();

    // 4 stale reads, then 3 consecutive fresh ones.
    assert_eq!(report.verdict.converged_at(), Some(6));
    assert!(report.mismatch.is_none());
    assert_eq!(report.product_id, PRODUCT);
    // 7 polls + 1 cross-check read.
    assert_eq!(source.active_query_count(), 8);
    assert_eq!(source.transaction_query_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_flip_flopping_store_is_inconclusive_in_skip_mode() {
    let source = MemoryEntitlementSource::new()
        .oscillating(PRODUCT)
        .with_transactions([purchased()]);

    let report = wait_for_entitlement(
        &source,
        PRODUCT,
        &config(),
        SourceLocation::new("tests/subscriptions.rs", 14),
    )
    .await
    .unwrap();

    let reason = report.verdict.skip_reason().expect("inconclusive");
    assert!(reason.contains("21 attempt(s)"));
    assert!(reason.contains("tests/subscriptions.rs:14"));
    assert_eq!(source.active_query_count(), 22);
    assert_eq!(source.transaction_query_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_flip_flopping_store_fails_in_strict_mode() {
    let source = MemoryEntitlementSource::new().oscillating(PRODUCT);

    let err = wait_for_entitlement(
        &source,
        PRODUCT,
        &config().with_strict_timeout(true),
        SourceLocation::unknown(),
    )
    .await
    .unwrap_err();

    match err {
        EntitlementError::Timeout(timeout) => assert_eq!(timeout.attempts, 21),
        other => panic!("expected Timeout, got {:?}", other),
    }
    // Cross-check still ran as a diagnostic.
    assert_eq!(source.transaction_query_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_query_failure_propagates_without_cross_check() {
    let source = MemoryEntitlementSource::new()
        .with_active([PRODUCT])
        .fail_active_query_at(2);

    let err = wait_for_entitlement(&source, PRODUCT, &config(), SourceLocation::unknown())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EntitlementError::Query("injected failure on active query 2".into())
    );
    assert_eq!(source.active_query_count(), 3);
    assert_eq!(source.transaction_query_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cross_check_failure_is_not_fatal() {
    // Poll converges on queries 0-2; the cross-check read (query 3) fails.
    let source = MemoryEntitlementSource::new()
        .with_active([PRODUCT])
        .fail_active_query_at(3);

    let report = wait_for_entitlement(&source, PRODUCT, &config(), SourceLocation::unknown())
        .await
        .unwrap();

    assert!(report.verdict.is_converged());
    assert!(report.mismatch.is_none());
}

#[tokio::test]
async fn test_invalid_config_is_reported() {
    let source = MemoryEntitlementSource::new();
    let err = wait_for_entitlement(
        &source,
        PRODUCT,
        &config().with_sleep_ms(0),
        SourceLocation::unknown(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, EntitlementError::InvalidConfig(_)));
    assert_eq!(source.active_query_count(), 0);
}

// -------------------------------------------------------------------------
// purchase_and_wait
// -------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_purchase_then_wait_through_activation_lag() {
    let source = MemoryEntitlementSource::new().with_activation_lag(5);
    let token = uuid::Uuid::new_v4();
    let options = PurchaseOptions::default().with_app_account_token(token);

    let report = purchase_and_wait(&source, PRODUCT, &options, &config(), source_location!())
        .await
        .unwrap();

    assert_eq!(report.verdict.converged_at(), Some(7));
    assert!(report.mismatch.is_none());

    let purchases = source.purchases();
    assert_eq!(purchases.len(), 1);
    assert_eq!(purchases[0].0, PRODUCT);
    assert_eq!(purchases[0].1.app_account_token, Some(token));
}

#[tokio::test]
async fn test_failed_purchase_skips_wait() {
    let source = MemoryEntitlementSource::new().fail_purchases("payment sheet dismissed");

    let err = purchase_and_wait(
        &source,
        PRODUCT,
        &PurchaseOptions::default(),
        &config(),
        SourceLocation::unknown(),
    )
    .await
    .unwrap_err();

    assert_eq!(
        err,
        EntitlementError::Purchase {
            product_id: PRODUCT.into(),
            reason: "payment sheet dismissed".into(),
        }
    );
    assert_eq!(source.active_query_count(), 0);
}

// -------------------------------------------------------------------------
// EntitlementWaiter
// -------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_waiter_over_shared_source() {
    let store = Arc::new(MemoryEntitlementSource::new().with_activation_lag(1));
    let source: Arc<dyn EntitlementSource> = store.clone();
    let waiter = EntitlementWaiter::new(source, config());

    let report = waiter
        .purchase_and_wait(
            PRODUCT,
            &PurchaseOptions::default().with_quantity(2),
            SourceLocation::caller(),
        )
        .await
        .unwrap();
    assert_eq!(report.verdict.converged_at(), Some(3));

    let again = waiter.wait_for(PRODUCT, SourceLocation::caller()).await.unwrap();
    assert_eq!(again.verdict.converged_at(), Some(2));
    assert_eq!(store.purchases()[0].1.quantity, 2);
}

#[tokio::test(start_paused = true)]
async fn test_transaction_without_active_reported_after_timeout() {
    let source = MemoryEntitlementSource::new().with_transactions([purchased()]);

    let report = wait_for_entitlement(&source, PRODUCT, &config(), SourceLocation::unknown())
        .await
        .unwrap();

    assert!(report.verdict.is_inconclusive());
    let mismatch = report.mismatch.expect("transaction grants but active set is empty");
    assert_eq!(mismatch.transaction_without_active, vec![PRODUCT]);
}
