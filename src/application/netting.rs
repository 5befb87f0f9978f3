use crate::domain::account::{Amount, Balance};
use crate::domain::fee::FeeObligation;
use crate::domain::ports::FeeObligationStoreRef;
use crate::error::Result;
use rust_decimal::Decimal;
use tracing::debug;

/// Result of planning fee deductions against one payout. `mutations` holds
/// every obligation record the settlement commit must upsert: fully consumed
/// records, the reduced remainder of a split, and the new deducted record a
/// split produces.
#[derive(Debug, Clone)]
pub struct NettingPlan {
    pub net_amount: Decimal,
    pub total_deducted: Decimal,
    pub mutations: Vec<FeeObligation>,
}

/// Outcome of the pure deduction walk, before the split remainder has been
/// assigned an id.
#[derive(Debug, Clone, PartialEq)]
pub struct DeductionWalk {
    pub total_deducted: Decimal,
    /// Obligations consumed in full, already marked deducted.
    pub consumed: Vec<FeeObligation>,
    pub split: Option<FeeSplit>,
}

/// At most one obligation per walk is split: its stored amount shrinks by the
/// consumed part, which becomes a separate deducted record.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeSplit {
    /// The original record with its amount reduced, still pending.
    pub remainder: FeeObligation,
    pub consumed_amount: Decimal,
}

/// Walks pending obligations oldest-first, consuming up to `gross` in total.
/// The deduction budget is capped at the gross amount, so the net can never
/// go negative; any fee balance past the cap stays pending for a later
/// payout cycle.
pub fn plan_deductions(pending: &[FeeObligation], gross: Decimal, payout: u64) -> DeductionWalk {
    let owed: Decimal = pending.iter().map(|f| f.amount.0).sum();
    let mut budget = owed.min(gross);

    let mut walk = DeductionWalk {
        total_deducted: Decimal::ZERO,
        consumed: Vec::new(),
        split: None,
    };

    for fee in pending {
        if budget <= Decimal::ZERO {
            break;
        }
        if fee.amount.0 <= budget {
            let mut consumed = fee.clone();
            consumed.deduct(payout);
            budget -= fee.amount.0;
            walk.total_deducted += fee.amount.0;
            walk.consumed.push(consumed);
        } else {
            let mut remainder = fee.clone();
            remainder.amount.0 -= budget;
            walk.split = Some(FeeSplit {
                remainder,
                consumed_amount: budget,
            });
            walk.total_deducted += budget;
            budget = Decimal::ZERO;
        }
    }

    walk
}

/// Computes the net transfer amount for a payout by opportunistically
/// consuming the host's pending fee obligations.
#[derive(Clone)]
pub struct FeeNetting {
    fees: FeeObligationStoreRef,
}

impl FeeNetting {
    pub fn new(fees: FeeObligationStoreRef) -> Self {
        Self { fees }
    }

    /// Plans the deduction for `payout`. Nothing is persisted here; the
    /// returned mutations ride the settlement commit so fee state only
    /// changes when the payout lands.
    pub async fn net(&self, host: u64, gross: Amount, payout: u64) -> Result<NettingPlan> {
        let pending = self.fees.list_pending(host).await?;
        let walk = plan_deductions(&pending, gross.value(), payout);

        let mut mutations = walk.consumed;
        if let Some(split) = walk.split {
            let deducted_id = self.fees.allocate_id().await?;
            let mut deducted =
                FeeObligation::new(deducted_id, host, Balance::new(split.consumed_amount));
            deducted.deduct(payout);
            mutations.push(split.remainder);
            mutations.push(deducted);
        }

        let plan = NettingPlan {
            net_amount: gross.value() - walk.total_deducted,
            total_deducted: walk.total_deducted,
            mutations,
        };
        debug!(
            host,
            payout,
            gross = %gross.value(),
            net = %plan.net_amount,
            deducted = %plan.total_deducted,
            "netting plan computed"
        );
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::Balance;
    use crate::domain::fee::FeeStatus;
    use rust_decimal_macros::dec;

    fn fee(id: u64, amount: Decimal) -> FeeObligation {
        FeeObligation::new(id, 10, Balance::new(amount))
    }

    fn conservation_holds(pending: &[FeeObligation], walk: &DeductionWalk) {
        let before: Decimal = pending.iter().map(|f| f.amount.0).sum();
        let untouched: Decimal = pending
            .iter()
            .filter(|f| {
                !walk.consumed.iter().any(|c| c.id == f.id)
                    && walk.split.as_ref().map(|s| s.remainder.id) != Some(f.id)
            })
            .map(|f| f.amount.0)
            .sum();
        let consumed: Decimal = walk.consumed.iter().map(|f| f.amount.0).sum();
        let split: Decimal = walk
            .split
            .as_ref()
            .map(|s| s.remainder.amount.0 + s.consumed_amount)
            .unwrap_or(Decimal::ZERO);
        assert_eq!(before, untouched + consumed + split);
    }

    #[test]
    fn test_no_fees_passes_gross_through() {
        let walk = plan_deductions(&[], dec!(100.0), 1);
        assert_eq!(walk.total_deducted, Decimal::ZERO);
        assert!(walk.consumed.is_empty());
        assert!(walk.split.is_none());
    }

    #[test]
    fn test_full_deduction_of_smaller_fee() {
        let pending = [fee(1, dec!(30.0))];
        let walk = plan_deductions(&pending, dec!(100.0), 7);

        assert_eq!(walk.total_deducted, dec!(30.0));
        assert_eq!(walk.consumed.len(), 1);
        assert_eq!(walk.consumed[0].status, FeeStatus::Deducted);
        assert_eq!(walk.consumed[0].deducted_from_payout, Some(7));
        assert!(walk.split.is_none());
        conservation_holds(&pending, &walk);
    }

    #[test]
    fn test_split_when_fee_exceeds_gross() {
        let pending = [fee(1, dec!(120.0))];
        let walk = plan_deductions(&pending, dec!(100.0), 7);

        assert_eq!(walk.total_deducted, dec!(100.0));
        assert!(walk.consumed.is_empty());
        let split = walk.split.as_ref().unwrap();
        assert_eq!(split.consumed_amount, dec!(100.0));
        assert_eq!(split.remainder.amount, Balance::new(dec!(20.0)));
        assert_eq!(split.remainder.status, FeeStatus::Pending);
        conservation_holds(&pending, &walk);
    }

    #[test]
    fn test_walk_is_oldest_first_and_stops_at_budget() {
        let pending = [fee(1, dec!(40.0)), fee(2, dec!(40.0)), fee(3, dec!(40.0))];
        let walk = plan_deductions(&pending, dec!(100.0), 7);

        assert_eq!(walk.total_deducted, dec!(100.0));
        assert_eq!(
            walk.consumed.iter().map(|f| f.id).collect::<Vec<_>>(),
            vec![1, 2]
        );
        let split = walk.split.as_ref().unwrap();
        assert_eq!(split.remainder.id, 3);
        assert_eq!(split.consumed_amount, dec!(20.0));
        assert_eq!(split.remainder.amount, Balance::new(dec!(20.0)));
        conservation_holds(&pending, &walk);
    }

    #[test]
    fn test_exact_budget_consumes_without_split() {
        let pending = [fee(1, dec!(60.0)), fee(2, dec!(40.0))];
        let walk = plan_deductions(&pending, dec!(100.0), 7);

        assert_eq!(walk.total_deducted, dec!(100.0));
        assert_eq!(walk.consumed.len(), 2);
        assert!(walk.split.is_none());
        conservation_holds(&pending, &walk);
    }

    #[test]
    fn test_net_never_negative() {
        let pending = [fee(1, dec!(500.0))];
        let walk = plan_deductions(&pending, dec!(100.0), 7);
        assert_eq!(walk.total_deducted, dec!(100.0));
        assert!(dec!(100.0) - walk.total_deducted >= Decimal::ZERO);
        conservation_holds(&pending, &walk);
    }
}
