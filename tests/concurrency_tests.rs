mod common;

use common::Harness;
use payout_engine::domain::account::Balance;
use payout_engine::domain::payout::PayoutStatus;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_same_host_entries_settle_in_order_without_overdraw() {
    let harness = Harness::new();
    harness.seed_host(10, dec!(100.00)).await;
    harness.seed_due_payout(1, 10, 100, dec!(60.00)).await;
    harness.seed_due_payout(2, 10, 101, dec!(40.00)).await;

    let report = harness.orchestrator().run().await.unwrap();

    assert_eq!(report.processed, 2);
    assert_eq!(report.total_amount, dec!(100.00));

    let account = harness.account(10).await;
    assert_eq!(account.pending_balance, Balance::new(dec!(0.00)));
    assert_eq!(account.current_balance, Balance::new(dec!(100.00)));
    assert_eq!(account.payouts_completed, 2);
    assert_eq!(harness.processor.requests().await.len(), 2);
}

#[tokio::test]
async fn test_same_host_never_goes_negative_when_balance_runs_out() {
    let harness = Harness::new();
    harness.seed_host(10, dec!(100.00)).await;
    harness.seed_due_payout(1, 10, 100, dec!(60.00)).await;
    harness.seed_due_payout(2, 10, 101, dec!(60.00)).await;

    let report = harness.orchestrator().run().await.unwrap();

    // The first entry settles; the second is re-evaluated against the
    // updated balance and rejected instead of overdrawing.
    assert_eq!(report.processed, 1);
    assert_eq!(report.failures.len(), 1);
    assert!(!report.failures[0].is_soft());

    assert_eq!(harness.payout(1).await.status, PayoutStatus::Paid);
    assert_eq!(harness.payout(2).await.status, PayoutStatus::Failed);

    let account = harness.account(10).await;
    assert_eq!(account.pending_balance, Balance::new(dec!(40.00)));
    assert!(account.pending_balance >= Balance::new(Decimal::ZERO));
    assert_eq!(account.payouts_completed, 1);
    assert_eq!(account.payouts_failed, 1);

    // Exactly one transfer went out; nothing was double-applied.
    assert_eq!(harness.processor.requests().await.len(), 1);
}

#[tokio::test]
async fn test_many_hosts_settle_concurrently_with_isolated_balances() {
    let harness = Harness::new();
    for host in 1..=12 {
        harness.seed_host(host, dec!(50.00)).await;
        harness
            .seed_due_payout(host, host, 1000 + host, dec!(50.00))
            .await;
    }

    let report = harness.orchestrator().run().await.unwrap();

    assert_eq!(report.processed, 12);
    assert_eq!(report.total_amount, dec!(600.00));
    for host in 1..=12 {
        let account = harness.account(host).await;
        assert_eq!(account.pending_balance, Balance::new(dec!(0.00)));
        assert_eq!(account.current_balance, Balance::new(dec!(50.00)));
    }
}

#[tokio::test]
async fn test_fee_netting_stays_consistent_across_same_host_entries() {
    let harness = Harness::new();
    harness.seed_host(10, dec!(100.00)).await;
    harness.seed_due_payout(1, 10, 100, dec!(30.00)).await;
    harness.seed_due_payout(2, 10, 101, dec!(70.00)).await;
    harness.seed_fee(1, 10, dec!(50.00)).await;

    let fee_total_before = harness.fee_total(10).await;
    let report = harness.orchestrator().run().await.unwrap();
    assert_eq!(report.processed, 2);

    // Entry 1 consumes 30.00 of the fee via a split; entry 2 consumes the
    // remaining 20.00. Conservation holds across both settlements.
    assert_eq!(harness.fee_total(10).await, fee_total_before);
    let requests = harness.processor.requests().await;
    let transferred: i64 = requests.iter().map(|r| r.amount_minor_units).sum();
    assert_eq!(transferred, 5_000);

    let pending_left: Decimal = harness
        .fees_for(10)
        .await
        .iter()
        .filter(|f| f.is_pending())
        .map(|f| f.amount.0)
        .sum();
    assert_eq!(pending_left, Decimal::ZERO);
}
