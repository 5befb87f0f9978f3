use crate::domain::account::{Amount, HostAccount};
use crate::domain::booking::{DisputeRecord, TripRecord};
use crate::domain::fee::FeeObligation;
use crate::domain::payout::PayoutEntry;
use crate::error::{ProcessorError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[async_trait]
pub trait PayoutStore: Send + Sync {
    async fn get(&self, id: u64) -> Result<Option<PayoutEntry>>;
    async fn put(&self, entry: PayoutEntry) -> Result<()>;
    /// Pending entries with `eligible_at <= now`, oldest-eligible-first.
    async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<PayoutEntry>>;
}

#[async_trait]
pub trait HostAccountStore: Send + Sync {
    async fn get(&self, host: u64) -> Result<Option<HostAccount>>;
    async fn put(&self, account: HostAccount) -> Result<()>;
    async fn all(&self) -> Result<Vec<HostAccount>>;
}

#[async_trait]
pub trait FeeObligationStore: Send + Sync {
    /// Pending obligations for one host in deduction order (oldest id first).
    async fn list_pending(&self, host: u64) -> Result<Vec<FeeObligation>>;
    async fn list_for_host(&self, host: u64) -> Result<Vec<FeeObligation>>;
    async fn put(&self, fee: FeeObligation) -> Result<()>;
    /// Fresh id for the deducted-remainder record a split produces.
    async fn allocate_id(&self) -> Result<u64>;
}

/// Read-only boundary to the booking/trip system.
#[async_trait]
pub trait TripService: Send + Sync {
    async fn trip(&self, booking: u64) -> Result<Option<TripRecord>>;
    async fn open_disputes(&self, booking: u64) -> Result<Vec<DisputeRecord>>;
}

/// One external transfer request. `idempotency_key` is derived from the
/// payout id so a retried call after a lost response cannot move money twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub destination: String,
    pub amount_minor_units: i64,
    pub currency: String,
    pub idempotency_key: String,
    pub metadata: TransferMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferMetadata {
    pub payout: u64,
    pub booking: u64,
    pub host: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub transfer_id: String,
}

/// Boundary to the external payment processor. The call is irreversible on
/// success; failures are surfaced as `ProcessorError` and retried by the
/// executor within its attempt budget.
#[async_trait]
pub trait TransferGateway: Send + Sync {
    async fn create_transfer(
        &self,
        request: TransferRequest,
    ) -> std::result::Result<TransferReceipt, ProcessorError>;
}

/// Structured audit entry appended inside every settlement commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub action: String,
    pub entity: u64,
    pub metadata: serde_json::Value,
    pub at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(
        action: impl Into<String>,
        entity: u64,
        metadata: serde_json::Value,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            action: action.into(),
            entity,
            metadata,
            at,
        }
    }
}

/// Everything a terminal settlement transition writes. The unit of work
/// applies the whole set atomically; a partial application would desync the
/// ledger from the balances it accounts for.
#[derive(Debug, Clone)]
pub struct SettlementCommit {
    pub entry: PayoutEntry,
    pub account: Option<HostAccount>,
    pub fee_updates: Vec<FeeObligation>,
    pub audit: AuditRecord,
}

#[async_trait]
pub trait SettlementUnitOfWork: Send + Sync {
    async fn commit(&self, commit: SettlementCommit) -> Result<()>;
}

/// High-priority event for the on-call path when a payout exhausts its
/// transfer attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub host: u64,
    pub amount: Amount,
    pub error: String,
    pub attempts: u32,
}

#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn alert(&self, event: AlertEvent) -> Result<()>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub type PayoutStoreRef = Arc<dyn PayoutStore>;
pub type HostAccountStoreRef = Arc<dyn HostAccountStore>;
pub type FeeObligationStoreRef = Arc<dyn FeeObligationStore>;
pub type TripServiceRef = Arc<dyn TripService>;
pub type TransferGatewayRef = Arc<dyn TransferGateway>;
pub type SettlementUnitOfWorkRef = Arc<dyn SettlementUnitOfWork>;
pub type AlertSinkRef = Arc<dyn AlertSink>;
pub type ClockRef = Arc<dyn Clock>;

/// Bundle of every port the settlement services depend on. Wiring happens
/// once, at the binary or test harness boundary.
#[derive(Clone)]
pub struct SettlementPorts {
    pub payouts: PayoutStoreRef,
    pub accounts: HostAccountStoreRef,
    pub fees: FeeObligationStoreRef,
    pub trips: TripServiceRef,
    pub gateway: TransferGatewayRef,
    pub unit_of_work: SettlementUnitOfWorkRef,
    pub alerts: AlertSinkRef,
    pub clock: ClockRef,
}
