use crate::application::executor::TransferExecutor;
use crate::config::SettlementConfig;
use crate::domain::account::HostAccount;
use crate::domain::eligibility::{
    DeferralReason, Eligibility, EligibilityContext, evaluate,
};
use crate::domain::payout::PayoutEntry;
use crate::domain::ports::{AuditRecord, SettlementCommit, SettlementPorts};
use crate::error::{Result, SettlementError};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// How an entry fell out of a run without being paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Left pending; picked up again once its hold or trip resolves.
    Deferred,
    /// Failed an eligibility gate; entry transitioned to failed.
    Ineligible,
    /// Exhausted its transfer attempts; entry transitioned to failed.
    TransferFailed,
    /// Storage or internal error inside the entry's failure boundary.
    Internal,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub payout: u64,
    pub host: u64,
    pub kind: FailureKind,
    pub detail: String,
}

impl BatchFailure {
    pub fn is_soft(&self) -> bool {
        self.kind == FailureKind::Deferred
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct BatchReport {
    /// Payouts settled in this run.
    pub processed: usize,
    /// Sum of the gross amounts settled.
    pub total_amount: Decimal,
    pub failures: Vec<BatchFailure>,
}

enum EntryOutcome {
    Paid(Decimal),
    Failure(BatchFailure),
}

/// One periodic settlement run: scan due entries, gate each through the
/// eligibility rules, and hand the eligible ones to the executor.
///
/// Entries are grouped by host; a host's queue runs strictly in order while
/// distinct hosts proceed concurrently under a semaphore bound. Balance
/// mutations for one host are never in flight twice at once.
#[derive(Clone)]
pub struct BatchOrchestrator {
    ports: SettlementPorts,
    executor: Arc<TransferExecutor>,
    config: SettlementConfig,
}

impl BatchOrchestrator {
    pub fn new(ports: SettlementPorts, config: SettlementConfig) -> Self {
        let executor = Arc::new(TransferExecutor::new(ports.clone(), &config));
        Self {
            ports,
            executor,
            config,
        }
    }

    pub async fn run(&self) -> Result<BatchReport> {
        let now = self.ports.clock.now();
        let due = self.ports.payouts.list_due(now).await?;
        info!(due = due.len(), "settlement batch starting");

        // Group per host, keeping oldest-eligible-first order both within
        // each queue and across queue launch order.
        let mut queues: Vec<(u64, Vec<PayoutEntry>)> = Vec::new();
        let mut index: HashMap<u64, usize> = HashMap::new();
        for entry in due {
            match index.get(&entry.host) {
                Some(&i) => queues[i].1.push(entry),
                None => {
                    index.insert(entry.host, queues.len());
                    queues.push((entry.host, vec![entry]));
                }
            }
        }

        let limit = self.config.max_concurrent_hosts.max(1);
        let semaphore = Arc::new(Semaphore::new(limit));
        let mut tasks = JoinSet::new();
        for (host, entries) in queues {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| SettlementError::Storage(e.to_string()))?;
            let orchestrator = self.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let mut outcomes = Vec::with_capacity(entries.len());
                for entry in entries {
                    outcomes.push(orchestrator.settle_one(entry).await);
                }
                (host, outcomes)
            });
        }

        let mut report = BatchReport::default();
        while let Some(joined) = tasks.join_next().await {
            let (host, outcomes) = joined.map_err(|e| SettlementError::Storage(e.to_string()))?;
            for outcome in outcomes {
                match outcome {
                    EntryOutcome::Paid(gross) => {
                        report.processed += 1;
                        report.total_amount += gross;
                    }
                    EntryOutcome::Failure(failure) => {
                        if !failure.is_soft() {
                            warn!(
                                host,
                                payout = failure.payout,
                                kind = ?failure.kind,
                                detail = %failure.detail,
                                "payout not settled"
                            );
                        }
                        report.failures.push(failure);
                    }
                }
            }
        }

        info!(
            processed = report.processed,
            total_amount = %report.total_amount,
            failures = report.failures.len(),
            "settlement batch finished"
        );
        Ok(report)
    }

    /// Per-entry failure boundary: nothing that happens to one payout may
    /// abort the rest of the batch.
    async fn settle_one(&self, entry: PayoutEntry) -> EntryOutcome {
        let payout = entry.id;
        let host = entry.host;
        match self.try_settle(entry).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(payout, host, %err, "entry settlement errored");
                EntryOutcome::Failure(BatchFailure {
                    payout,
                    host,
                    kind: FailureKind::Internal,
                    detail: err.to_string(),
                })
            }
        }
    }

    async fn try_settle(&self, mut entry: PayoutEntry) -> Result<EntryOutcome> {
        let Some(account) = self.ports.accounts.get(entry.host).await? else {
            let detail = SettlementError::UnknownHost(entry.host).to_string();
            self.fail_ineligible(entry.clone(), None, &detail).await?;
            return Ok(EntryOutcome::Failure(BatchFailure {
                payout: entry.id,
                host: entry.host,
                kind: FailureKind::Ineligible,
                detail,
            }));
        };

        let trip = self.ports.trips.trip(entry.booking).await?;
        let disputes = self.ports.trips.open_disputes(entry.booking).await?;
        let verdict = evaluate(&EligibilityContext {
            entry: &entry,
            account: &account,
            trip: trip.as_ref(),
            open_disputes: &disputes,
        });

        match verdict {
            Eligibility::Eligible => {
                let gross = entry.amount.value();
                let payout = entry.id;
                let host = entry.host;
                if self.executor.process(entry).await? {
                    Ok(EntryOutcome::Paid(gross))
                } else {
                    Ok(EntryOutcome::Failure(BatchFailure {
                        payout,
                        host,
                        kind: FailureKind::TransferFailed,
                        detail: "transfer attempts exhausted".to_string(),
                    }))
                }
            }
            Eligibility::Deferred(reason) => {
                if reason == DeferralReason::OpenDispute {
                    // Persist the hold immediately so the entry is not
                    // rescanned until the window elapses.
                    let held_until = self.ports.clock.now() + self.config.dispute_hold();
                    entry.defer_until(held_until)?;
                    self.ports.payouts.put(entry.clone()).await?;
                    info!(
                        payout = entry.id,
                        host = entry.host,
                        %held_until,
                        "payout held for open dispute"
                    );
                }
                Ok(EntryOutcome::Failure(BatchFailure {
                    payout: entry.id,
                    host: entry.host,
                    kind: FailureKind::Deferred,
                    detail: reason.to_string(),
                }))
            }
            Eligibility::Ineligible(reason) => {
                let detail = reason.to_string();
                if reason.is_consistency_violation() {
                    error!(
                        payout = entry.id,
                        host = entry.host,
                        pending = %account.pending_balance,
                        amount = %entry.amount.value(),
                        "payout exceeds pending balance, upstream bookkeeping is inconsistent"
                    );
                }
                self.fail_ineligible(entry.clone(), Some(account), &detail)
                    .await?;
                Ok(EntryOutcome::Failure(BatchFailure {
                    payout: entry.id,
                    host: entry.host,
                    kind: FailureKind::Ineligible,
                    detail,
                }))
            }
        }
    }

    async fn fail_ineligible(
        &self,
        mut entry: PayoutEntry,
        account: Option<HostAccount>,
        reason: &str,
    ) -> Result<()> {
        let now = self.ports.clock.now();
        entry.mark_failed(now)?;
        let account = account.map(|mut a| {
            a.record_failed_payout();
            a
        });
        let audit = AuditRecord::new(
            "payout.failed",
            entry.id,
            json!({
                "host": entry.host,
                "gross": entry.amount.value(),
                "reason": reason,
            }),
            now,
        );
        self.ports
            .unit_of_work
            .commit(SettlementCommit {
                entry,
                account,
                fee_updates: Vec::new(),
                audit,
            })
            .await
    }
}
