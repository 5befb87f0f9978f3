#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use payout_engine::application::batch::BatchOrchestrator;
use payout_engine::config::SettlementConfig;
use payout_engine::domain::account::{Balance, HostAccount};
use payout_engine::domain::booking::{DisputeRecord, DisputeStatus, TripRecord};
use payout_engine::domain::fee::FeeObligation;
use payout_engine::domain::payout::PayoutEntry;
use payout_engine::domain::ports::{
    FeeObligationStore, HostAccountStore, PayoutStore, SettlementPorts,
};
use payout_engine::infrastructure::alerts::RecordingAlertSink;
use payout_engine::infrastructure::clock::ManualClock;
use payout_engine::infrastructure::in_memory::{InMemoryLedger, InMemoryTripService};
use payout_engine::infrastructure::processor::MockProcessorGateway;
use rust_decimal::Decimal;
use std::sync::Arc;

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
}

/// Fully wired engine over in-memory collaborators, pinned to a manual
/// clock at `base_time()`.
pub struct Harness {
    pub ledger: InMemoryLedger,
    pub trips: InMemoryTripService,
    pub processor: MockProcessorGateway,
    pub alerts: RecordingAlertSink,
    pub clock: ManualClock,
    pub config: SettlementConfig,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            ledger: InMemoryLedger::new(),
            trips: InMemoryTripService::new(),
            processor: MockProcessorGateway::new(),
            alerts: RecordingAlertSink::new(),
            clock: ManualClock::at(base_time()),
            config: SettlementConfig::default(),
        }
    }

    pub fn ports(&self) -> SettlementPorts {
        SettlementPorts {
            payouts: Arc::new(self.ledger.clone()),
            accounts: Arc::new(self.ledger.clone()),
            fees: Arc::new(self.ledger.clone()),
            trips: Arc::new(self.trips.clone()),
            gateway: Arc::new(self.processor.clone()),
            unit_of_work: Arc::new(self.ledger.clone()),
            alerts: Arc::new(self.alerts.clone()),
            clock: Arc::new(self.clock.clone()),
        }
    }

    pub fn orchestrator(&self) -> BatchOrchestrator {
        BatchOrchestrator::new(self.ports(), self.config.clone())
    }

    /// Seeds a host able to receive transfers, with the given pending
    /// balance.
    pub async fn seed_host(&self, host: u64, pending: Decimal) {
        let mut account = HostAccount::new(host);
        account.pending_balance = Balance::new(pending);
        account.connected_account_id = Some(format!("acct_{host}"));
        account.transfer_capability_enabled = true;
        HostAccountStore::put(&self.ledger, account).await.unwrap();
    }

    /// Seeds a due payout whose trip has already ended.
    pub async fn seed_due_payout(&self, id: u64, host: u64, booking: u64, amount: Decimal) {
        self.seed_ended_trip(booking).await;
        let entry = PayoutEntry::new(id, host, booking, amount.try_into().unwrap(), base_time());
        PayoutStore::put(&self.ledger, entry).await.unwrap();
    }

    pub async fn seed_fee(&self, id: u64, host: u64, amount: Decimal) {
        let fee = FeeObligation::new(id, host, Balance::new(amount));
        FeeObligationStore::put(&self.ledger, fee).await.unwrap();
    }

    pub async fn seed_ended_trip(&self, booking: u64) {
        self.trips
            .insert_trip(TripRecord {
                booking,
                trip_ended_at: Some(base_time() - chrono::Duration::days(1)),
            })
            .await;
    }

    pub async fn seed_open_dispute(&self, booking: u64) {
        self.trips
            .insert_dispute(DisputeRecord {
                booking,
                status: DisputeStatus::Open,
            })
            .await;
    }

    pub async fn payout(&self, id: u64) -> PayoutEntry {
        PayoutStore::get(&self.ledger, id).await.unwrap().unwrap()
    }

    pub async fn account(&self, host: u64) -> HostAccount {
        HostAccountStore::get(&self.ledger, host)
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn fees_for(&self, host: u64) -> Vec<FeeObligation> {
        self.ledger.list_for_host(host).await.unwrap()
    }

    pub async fn fee_total(&self, host: u64) -> Decimal {
        self.fees_for(host).await.iter().map(|f| f.amount.0).sum()
    }
}
