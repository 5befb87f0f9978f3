use crate::domain::account::HostAccount;
use crate::domain::booking::{DisputeRecord, TripRecord};
use crate::domain::fee::FeeObligation;
use crate::domain::payout::PayoutEntry;
use crate::domain::ports::{FeeObligationStore, HostAccountStore, PayoutStore};
use crate::error::{ProcessorError, Result};
use crate::infrastructure::in_memory::InMemoryTripService;
use crate::infrastructure::processor::MockProcessorGateway;
use serde::Deserialize;
use std::io::Read;

/// A scripted processor failure, declared in fixtures by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptedFailure {
    Network,
    Timeout,
    Declined,
}

impl From<ScriptedFailure> for ProcessorError {
    fn from(kind: ScriptedFailure) -> Self {
        match kind {
            ScriptedFailure::Network => {
                ProcessorError::Network("scripted network failure".to_string())
            }
            ScriptedFailure::Timeout => ProcessorError::Timeout,
            ScriptedFailure::Declined => {
                ProcessorError::Declined("scripted decline".to_string())
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorScript {
    pub host: u64,
    pub failures: Vec<ScriptedFailure>,
}

/// Seed data for one settlement run: ledger rows plus the external state the
/// run reads (trips, disputes) and the processor outcomes it should observe.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Fixture {
    pub accounts: Vec<HostAccount>,
    pub payouts: Vec<PayoutEntry>,
    pub fees: Vec<FeeObligation>,
    pub trips: Vec<TripRecord>,
    pub disputes: Vec<DisputeRecord>,
    pub processor_failures: Vec<ProcessorScript>,
}

impl Fixture {
    pub fn from_reader(source: impl Read) -> Result<Self> {
        Ok(serde_json::from_reader(source)?)
    }

    pub async fn seed_ledger(
        &self,
        payouts: &dyn PayoutStore,
        accounts: &dyn HostAccountStore,
        fees: &dyn FeeObligationStore,
    ) -> Result<()> {
        for account in &self.accounts {
            accounts.put(account.clone()).await?;
        }
        for entry in &self.payouts {
            payouts.put(entry.clone()).await?;
        }
        for fee in &self.fees {
            fees.put(fee.clone()).await?;
        }
        Ok(())
    }

    pub async fn seed_collaborators(
        &self,
        trips: &InMemoryTripService,
        processor: &MockProcessorGateway,
    ) {
        for trip in &self.trips {
            trips.insert_trip(trip.clone()).await;
        }
        for dispute in &self.disputes {
            trips.insert_dispute(dispute.clone()).await;
        }
        for script in &self.processor_failures {
            processor
                .script_failures(script.host, script.failures.iter().map(|&f| f.into()))
                .await;
        }
    }
}
