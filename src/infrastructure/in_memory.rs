use crate::domain::account::HostAccount;
use crate::domain::booking::{DisputeRecord, TripRecord};
use crate::domain::fee::{FeeObligation, FeeStatus};
use crate::domain::payout::PayoutEntry;
use crate::domain::ports::{
    AuditRecord, FeeObligationStore, HostAccountStore, PayoutStore, SettlementCommit,
    SettlementUnitOfWork, TripService,
};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct LedgerState {
    payouts: HashMap<u64, PayoutEntry>,
    accounts: HashMap<u64, HostAccount>,
    fees: HashMap<u64, FeeObligation>,
    audit: Vec<AuditRecord>,
    next_fee_id: u64,
}

impl LedgerState {
    fn put_fee(&mut self, fee: FeeObligation) {
        self.next_fee_id = self.next_fee_id.max(fee.id + 1);
        self.fees.insert(fee.id, fee);
    }
}

/// All four stores behind a single lock. Holding one writer across the
/// whole of `commit` is what makes the settlement commit atomic here; the
/// RocksDB ledger gets the same property from a write batch.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn audit_log(&self) -> Vec<AuditRecord> {
        self.state.read().await.audit.clone()
    }
}

#[async_trait]
impl PayoutStore for InMemoryLedger {
    async fn get(&self, id: u64) -> Result<Option<PayoutEntry>> {
        Ok(self.state.read().await.payouts.get(&id).cloned())
    }

    async fn put(&self, entry: PayoutEntry) -> Result<()> {
        self.state.write().await.payouts.insert(entry.id, entry);
        Ok(())
    }

    async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<PayoutEntry>> {
        let state = self.state.read().await;
        let mut due: Vec<PayoutEntry> = state
            .payouts
            .values()
            .filter(|e| e.is_due(now))
            .cloned()
            .collect();
        due.sort_by_key(|e| (e.eligible_at, e.id));
        Ok(due)
    }
}

#[async_trait]
impl HostAccountStore for InMemoryLedger {
    async fn get(&self, host: u64) -> Result<Option<HostAccount>> {
        Ok(self.state.read().await.accounts.get(&host).cloned())
    }

    async fn put(&self, account: HostAccount) -> Result<()> {
        self.state
            .write()
            .await
            .accounts
            .insert(account.host, account);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<HostAccount>> {
        let state = self.state.read().await;
        let mut accounts: Vec<HostAccount> = state.accounts.values().cloned().collect();
        accounts.sort_by_key(|a| a.host);
        Ok(accounts)
    }
}

#[async_trait]
impl FeeObligationStore for InMemoryLedger {
    async fn list_pending(&self, host: u64) -> Result<Vec<FeeObligation>> {
        let state = self.state.read().await;
        let mut pending: Vec<FeeObligation> = state
            .fees
            .values()
            .filter(|f| f.host == host && f.status == FeeStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|f| f.id);
        Ok(pending)
    }

    async fn list_for_host(&self, host: u64) -> Result<Vec<FeeObligation>> {
        let state = self.state.read().await;
        let mut fees: Vec<FeeObligation> = state
            .fees
            .values()
            .filter(|f| f.host == host)
            .cloned()
            .collect();
        fees.sort_by_key(|f| f.id);
        Ok(fees)
    }

    async fn put(&self, fee: FeeObligation) -> Result<()> {
        self.state.write().await.put_fee(fee);
        Ok(())
    }

    async fn allocate_id(&self) -> Result<u64> {
        let mut state = self.state.write().await;
        let id = state.next_fee_id.max(1);
        state.next_fee_id = id + 1;
        Ok(id)
    }
}

#[async_trait]
impl SettlementUnitOfWork for InMemoryLedger {
    async fn commit(&self, commit: SettlementCommit) -> Result<()> {
        let mut state = self.state.write().await;
        state.payouts.insert(commit.entry.id, commit.entry);
        if let Some(account) = commit.account {
            state.accounts.insert(account.host, account);
        }
        for fee in commit.fee_updates {
            state.put_fee(fee);
        }
        state.audit.push(commit.audit);
        Ok(())
    }
}

/// In-memory stand-in for the booking service boundary.
#[derive(Default, Clone)]
pub struct InMemoryTripService {
    trips: Arc<RwLock<HashMap<u64, TripRecord>>>,
    disputes: Arc<RwLock<HashMap<u64, Vec<DisputeRecord>>>>,
}

impl InMemoryTripService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_trip(&self, trip: TripRecord) {
        self.trips.write().await.insert(trip.booking, trip);
    }

    pub async fn insert_dispute(&self, dispute: DisputeRecord) {
        self.disputes
            .write()
            .await
            .entry(dispute.booking)
            .or_default()
            .push(dispute);
    }

    pub async fn resolve_disputes(&self, booking: u64) {
        if let Some(disputes) = self.disputes.write().await.get_mut(&booking) {
            for dispute in disputes {
                dispute.status = crate::domain::booking::DisputeStatus::Resolved;
            }
        }
    }
}

#[async_trait]
impl TripService for InMemoryTripService {
    async fn trip(&self, booking: u64) -> Result<Option<TripRecord>> {
        Ok(self.trips.read().await.get(&booking).cloned())
    }

    async fn open_disputes(&self, booking: u64) -> Result<Vec<DisputeRecord>> {
        let disputes = self.disputes.read().await;
        Ok(disputes
            .get(&booking)
            .map(|all| {
                all.iter()
                    .filter(|d| d.status.is_open())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
