use payout_engine::application::netting::plan_deductions;
use payout_engine::domain::account::Balance;
use payout_engine::domain::fee::{FeeObligation, FeeStatus};
use rand::Rng;
use rust_decimal::Decimal;

fn random_fees(rng: &mut impl Rng, host: u64) -> Vec<FeeObligation> {
    let count = rng.gen_range(0..8);
    (0..count)
        .map(|i| {
            let cents: i64 = rng.gen_range(1..20_000);
            FeeObligation::new(i + 1, host, Balance::new(Decimal::new(cents, 2)))
        })
        .collect()
}

fn applied_total(pending: &[FeeObligation], walk: &payout_engine::application::netting::DeductionWalk) -> Decimal {
    // Sum over the post-walk state: untouched rows keep their amounts,
    // consumed rows keep theirs (now deducted), a split contributes its
    // remainder plus the consumed slice.
    let touched: Vec<u64> = walk
        .consumed
        .iter()
        .map(|f| f.id)
        .chain(walk.split.iter().map(|s| s.remainder.id))
        .collect();
    let untouched: Decimal = pending
        .iter()
        .filter(|f| !touched.contains(&f.id))
        .map(|f| f.amount.0)
        .sum();
    let consumed: Decimal = walk.consumed.iter().map(|f| f.amount.0).sum();
    let split: Decimal = walk
        .split
        .as_ref()
        .map(|s| s.remainder.amount.0 + s.consumed_amount)
        .unwrap_or(Decimal::ZERO);
    untouched + consumed + split
}

#[test]
fn test_conservation_holds_for_random_fee_sets() {
    let mut rng = rand::thread_rng();
    for _ in 0..500 {
        let pending = random_fees(&mut rng, 10);
        let gross = Decimal::new(rng.gen_range(1..30_000), 2);

        let before: Decimal = pending.iter().map(|f| f.amount.0).sum();
        let walk = plan_deductions(&pending, gross, 1);

        assert_eq!(
            before,
            applied_total(&pending, &walk),
            "fee amounts must be conserved (pending: {pending:?}, gross: {gross})"
        );
    }
}

#[test]
fn test_net_always_within_zero_and_gross() {
    let mut rng = rand::thread_rng();
    for _ in 0..500 {
        let pending = random_fees(&mut rng, 10);
        let gross = Decimal::new(rng.gen_range(1..30_000), 2);

        let walk = plan_deductions(&pending, gross, 1);
        let net = gross - walk.total_deducted;

        assert!(net >= Decimal::ZERO, "net {net} below zero");
        assert!(net <= gross, "net {net} above gross {gross}");
    }
}

#[test]
fn test_deducted_records_always_link_their_payout() {
    let mut rng = rand::thread_rng();
    for _ in 0..200 {
        let pending = random_fees(&mut rng, 10);
        let gross = Decimal::new(rng.gen_range(1..30_000), 2);

        let walk = plan_deductions(&pending, gross, 42);
        for fee in &walk.consumed {
            assert_eq!(fee.status, FeeStatus::Deducted);
            assert_eq!(fee.deducted_from_payout, Some(42));
        }
        if let Some(split) = &walk.split {
            assert_eq!(split.remainder.status, FeeStatus::Pending);
            assert!(split.consumed_amount > Decimal::ZERO);
        }
    }
}

#[test]
fn test_at_most_one_split_per_walk() {
    let mut rng = rand::thread_rng();
    for _ in 0..200 {
        let pending = random_fees(&mut rng, 10);
        let gross = Decimal::new(rng.gen_range(1..30_000), 2);

        let walk = plan_deductions(&pending, gross, 1);
        // The walk either consumed whole records, or ended on exactly one
        // partial record.
        let partially_consumed = walk.split.iter().count();
        assert!(partially_consumed <= 1);
    }
}
