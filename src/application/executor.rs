use crate::application::netting::{FeeNetting, NettingPlan};
use crate::application::retry::RetryPolicy;
use crate::config::SettlementConfig;
use crate::domain::account::HostAccount;
use crate::domain::payout::PayoutEntry;
use crate::domain::ports::{
    AlertEvent, AuditRecord, SettlementCommit, SettlementPorts, TransferMetadata, TransferReceipt,
    TransferRequest,
};
use crate::error::{Result, SettlementError};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::json;
use tracing::{error, info};

/// Drives one settlement for an eligible payout: claim the entry, compute
/// the net amount, move the money, commit the books atomically.
///
/// Returns `Ok(true)` when the payout lands, `Ok(false)` when it exhausts
/// its transfer attempts and is failed with an alert. Storage errors
/// propagate to the caller's failure boundary.
pub struct TransferExecutor {
    ports: SettlementPorts,
    netting: FeeNetting,
    retry: RetryPolicy,
    currency: String,
}

impl TransferExecutor {
    pub fn new(ports: SettlementPorts, config: &SettlementConfig) -> Self {
        let netting = FeeNetting::new(ports.fees.clone());
        let retry = RetryPolicy::linear(config.max_attempts, config.backoff_base);
        Self {
            ports,
            netting,
            retry,
            currency: config.currency.clone(),
        }
    }

    pub async fn process(&self, mut entry: PayoutEntry) -> Result<bool> {
        // Claiming the entry is persisted on its own, before any attempt, so
        // a concurrent run cannot pick the same payout up again.
        entry.mark_processing()?;
        self.ports.payouts.put(entry.clone()).await?;

        let account = self
            .ports
            .accounts
            .get(entry.host)
            .await?
            .ok_or(SettlementError::UnknownHost(entry.host))?;
        let destination = account.connected_account_id.clone().ok_or_else(|| {
            SettlementError::Validation(format!("host {} has no connected account", entry.host))
        })?;

        // The per-attempt operation owns clones of everything it touches so
        // no borrow is held across the backoff sleeps. The netting plan is
        // recomputed on every attempt: nothing has been committed yet, so a
        // fresh read is the only view that cannot be stale.
        let attempt_op = {
            let netting = self.netting.clone();
            let gateway = self.ports.gateway.clone();
            let currency = self.currency.clone();
            let (payout, booking, host) = (entry.id, entry.booking, entry.host);
            let gross = entry.amount;
            move |_attempt: u32| {
                let netting = netting.clone();
                let gateway = gateway.clone();
                let currency = currency.clone();
                let destination = destination.clone();
                async move {
                    let plan = netting.net(host, gross, payout).await?;
                    if plan.net_amount <= Decimal::ZERO {
                        // Fees consumed the whole payout; there is nothing
                        // to move externally.
                        return Ok((plan, None));
                    }
                    let request = TransferRequest {
                        destination,
                        amount_minor_units: to_minor_units(plan.net_amount)?,
                        currency,
                        idempotency_key: format!("payout-{payout}"),
                        metadata: TransferMetadata {
                            payout,
                            booking,
                            host,
                        },
                    };
                    let receipt = gateway.create_transfer(request).await?;
                    Ok((plan, Some(receipt)))
                }
            }
        };

        match self.retry.run(attempt_op).await {
            Ok((plan, receipt)) => self.commit_paid(entry, account, plan, receipt).await,
            Err(SettlementError::Processor(cause)) => {
                self.commit_failed(entry, account, cause.to_string()).await
            }
            Err(err) => Err(err),
        }
    }

    async fn commit_paid(
        &self,
        mut entry: PayoutEntry,
        mut account: HostAccount,
        plan: NettingPlan,
        receipt: Option<TransferReceipt>,
    ) -> Result<bool> {
        let now = self.ports.clock.now();
        let transfer_ref = receipt.map(|r| r.transfer_id);
        entry.mark_paid(transfer_ref.clone(), now)?;
        account.settle(entry.amount)?;

        let audit = AuditRecord::new(
            "payout.paid",
            entry.id,
            json!({
                "host": entry.host,
                "booking": entry.booking,
                "gross": entry.amount.value(),
                "net": plan.net_amount,
                "fees_deducted": plan.total_deducted,
                "transfer_ref": transfer_ref,
            }),
            now,
        );
        self.ports
            .unit_of_work
            .commit(SettlementCommit {
                entry: entry.clone(),
                account: Some(account),
                fee_updates: plan.mutations,
                audit,
            })
            .await?;

        info!(
            payout = entry.id,
            host = entry.host,
            gross = %entry.amount.value(),
            net = %plan.net_amount,
            transfer_ref = transfer_ref.as_deref().unwrap_or("-"),
            "payout settled"
        );
        Ok(true)
    }

    async fn commit_failed(
        &self,
        mut entry: PayoutEntry,
        mut account: HostAccount,
        cause: String,
    ) -> Result<bool> {
        let now = self.ports.clock.now();
        entry.mark_failed(now)?;
        account.record_failed_payout();

        let audit = AuditRecord::new(
            "payout.failed",
            entry.id,
            json!({
                "host": entry.host,
                "gross": entry.amount.value(),
                "error": cause,
                "attempts": self.retry.max_attempts,
            }),
            now,
        );
        self.ports
            .unit_of_work
            .commit(SettlementCommit {
                entry: entry.clone(),
                account: Some(account),
                fee_updates: Vec::new(),
                audit,
            })
            .await?;

        error!(
            payout = entry.id,
            host = entry.host,
            attempts = self.retry.max_attempts,
            %cause,
            "payout failed after exhausting transfer attempts"
        );
        self.ports
            .alerts
            .alert(AlertEvent {
                host: entry.host,
                amount: entry.amount,
                error: cause,
                attempts: self.retry.max_attempts,
            })
            .await?;
        Ok(false)
    }
}

/// Processor APIs take integer minor units; internal bookkeeping stays in
/// decimal major units until this boundary.
fn to_minor_units(amount: Decimal) -> Result<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .ok_or_else(|| SettlementError::Validation(format!("amount {amount} out of range")))
}
