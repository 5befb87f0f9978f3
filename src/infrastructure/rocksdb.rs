use crate::domain::account::HostAccount;
use crate::domain::fee::{FeeObligation, FeeStatus};
use crate::domain::payout::PayoutEntry;
use crate::domain::ports::{
    AuditRecord, FeeObligationStore, HostAccountStore, PayoutStore, SettlementCommit,
    SettlementUnitOfWork,
};
use crate::error::{Result, SettlementError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Column family for payout ledger entries.
pub const CF_PAYOUTS: &str = "payouts";
/// Column family for host account state.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column family for fee obligations.
pub const CF_FEES: &str = "fees";
/// Column family for the append-only audit log.
pub const CF_AUDIT: &str = "audit";

/// Persistent ledger over RocksDB, one column family per store.
///
/// The settlement commit is assembled into a single `WriteBatch`, so the
/// payout transition, balance mutation, fee updates, and audit append hit
/// disk together or not at all.
///
/// `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDbLedger {
    db: Arc<DB>,
    next_fee_id: Arc<AtomicU64>,
    next_audit_seq: Arc<AtomicU64>,
}

impl RocksDbLedger {
    /// Opens or creates the ledger at `path`, ensuring all column families
    /// exist and re-priming the id counters from what is already stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [CF_PAYOUTS, CF_ACCOUNTS, CF_FEES, CF_AUDIT]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();
        let db = DB::open_cf_descriptors(&opts, path, cfs)?;

        let next_fee_id = last_key(&db, CF_FEES)?.map(|k| k + 1).unwrap_or(1);
        let next_audit_seq = last_key(&db, CF_AUDIT)?.map(|k| k + 1).unwrap_or(0);

        Ok(Self {
            db: Arc::new(db),
            next_fee_id: Arc::new(AtomicU64::new(next_fee_id)),
            next_audit_seq: Arc::new(AtomicU64::new(next_audit_seq)),
        })
    }

    pub fn audit_log(&self) -> Result<Vec<AuditRecord>> {
        self.scan::<AuditRecord>(CF_AUDIT)
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| SettlementError::Storage(format!("missing column family {name}")))
    }

    fn read<T: DeserializeOwned>(&self, cf: &str, key: u64) -> Result<Option<T>> {
        let cf = self.cf(cf)?;
        match self.db.get_cf(cf, key.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&self, cf: &str, key: u64, value: &T) -> Result<()> {
        let cf = self.cf(cf)?;
        self.db.put_cf(cf, key.to_be_bytes(), serde_json::to_vec(value)?)?;
        Ok(())
    }

    fn scan<T: DeserializeOwned>(&self, cf: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf)?;
        let mut items = Vec::new();
        for kv in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = kv?;
            items.push(serde_json::from_slice(&value)?);
        }
        Ok(items)
    }
}

fn last_key(db: &DB, cf: &str) -> Result<Option<u64>> {
    let cf = db
        .cf_handle(cf)
        .ok_or_else(|| SettlementError::Storage(format!("missing column family {cf}")))?;
    match db.iterator_cf(cf, IteratorMode::End).next() {
        Some(kv) => {
            let (key, _) = kv?;
            let bytes: [u8; 8] = key
                .as_ref()
                .try_into()
                .map_err(|_| SettlementError::Storage("malformed ledger key".to_string()))?;
            Ok(Some(u64::from_be_bytes(bytes)))
        }
        None => Ok(None),
    }
}

#[async_trait]
impl PayoutStore for RocksDbLedger {
    async fn get(&self, id: u64) -> Result<Option<PayoutEntry>> {
        self.read(CF_PAYOUTS, id)
    }

    async fn put(&self, entry: PayoutEntry) -> Result<()> {
        self.write(CF_PAYOUTS, entry.id, &entry)
    }

    async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<PayoutEntry>> {
        let mut due: Vec<PayoutEntry> = self
            .scan::<PayoutEntry>(CF_PAYOUTS)?
            .into_iter()
            .filter(|e| e.is_due(now))
            .collect();
        due.sort_by_key(|e| (e.eligible_at, e.id));
        Ok(due)
    }
}

#[async_trait]
impl HostAccountStore for RocksDbLedger {
    async fn get(&self, host: u64) -> Result<Option<HostAccount>> {
        self.read(CF_ACCOUNTS, host)
    }

    async fn put(&self, account: HostAccount) -> Result<()> {
        self.write(CF_ACCOUNTS, account.host, &account)
    }

    async fn all(&self) -> Result<Vec<HostAccount>> {
        self.scan(CF_ACCOUNTS)
    }
}

#[async_trait]
impl FeeObligationStore for RocksDbLedger {
    async fn list_pending(&self, host: u64) -> Result<Vec<FeeObligation>> {
        Ok(self
            .scan::<FeeObligation>(CF_FEES)?
            .into_iter()
            .filter(|f| f.host == host && f.status == FeeStatus::Pending)
            .collect())
    }

    async fn list_for_host(&self, host: u64) -> Result<Vec<FeeObligation>> {
        Ok(self
            .scan::<FeeObligation>(CF_FEES)?
            .into_iter()
            .filter(|f| f.host == host)
            .collect())
    }

    async fn put(&self, fee: FeeObligation) -> Result<()> {
        self.next_fee_id.fetch_max(fee.id + 1, Ordering::SeqCst);
        self.write(CF_FEES, fee.id, &fee)
    }

    async fn allocate_id(&self) -> Result<u64> {
        Ok(self.next_fee_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl SettlementUnitOfWork for RocksDbLedger {
    async fn commit(&self, commit: SettlementCommit) -> Result<()> {
        let mut batch = WriteBatch::default();

        let payouts = self.cf(CF_PAYOUTS)?;
        batch.put_cf(
            payouts,
            commit.entry.id.to_be_bytes(),
            serde_json::to_vec(&commit.entry)?,
        );

        if let Some(account) = &commit.account {
            let accounts = self.cf(CF_ACCOUNTS)?;
            batch.put_cf(
                accounts,
                account.host.to_be_bytes(),
                serde_json::to_vec(account)?,
            );
        }

        let fees = self.cf(CF_FEES)?;
        for fee in &commit.fee_updates {
            self.next_fee_id.fetch_max(fee.id + 1, Ordering::SeqCst);
            batch.put_cf(fees, fee.id.to_be_bytes(), serde_json::to_vec(fee)?);
        }

        let audit = self.cf(CF_AUDIT)?;
        let seq = self.next_audit_seq.fetch_add(1, Ordering::SeqCst);
        batch.put_cf(audit, seq.to_be_bytes(), serde_json::to_vec(&commit.audit)?);

        self.db.write(batch)?;
        Ok(())
    }
}
