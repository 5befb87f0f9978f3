use crate::domain::account::Amount;
use crate::error::SettlementError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutStatus {
    #[default]
    Pending,
    Processing,
    Paid,
    Failed,
}

impl PayoutStatus {
    /// Paid and Failed are terminal for the engine; re-queueing a failed
    /// payout is an operator action outside this crate.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PayoutStatus::Paid | PayoutStatus::Failed)
    }
}

/// A unit of host earnings scheduled for settlement.
///
/// Created when trip settlement recognizes earnings (outside this engine);
/// owned and mutated exclusively by this engine from `Pending` onward. Status
/// only ever moves forward: `Pending -> Processing -> {Paid | Failed}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutEntry {
    pub id: u64,
    pub host: u64,
    pub booking: u64,
    /// Gross amount before fee deduction.
    pub amount: Amount,
    #[serde(default)]
    pub status: PayoutStatus,
    pub eligible_at: DateTime<Utc>,
    #[serde(default)]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub transfer_ref: Option<String>,
}

impl PayoutEntry {
    pub fn new(id: u64, host: u64, booking: u64, amount: Amount, eligible_at: DateTime<Utc>) -> Self {
        Self {
            id,
            host,
            booking,
            amount,
            status: PayoutStatus::Pending,
            eligible_at,
            processed_at: None,
            transfer_ref: None,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == PayoutStatus::Pending && self.eligible_at <= now
    }

    /// Claims the entry for a settlement attempt.
    pub fn mark_processing(&mut self) -> Result<(), SettlementError> {
        self.transition(PayoutStatus::Pending, PayoutStatus::Processing)
    }

    pub fn mark_paid(
        &mut self,
        transfer_ref: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), SettlementError> {
        self.transition(PayoutStatus::Processing, PayoutStatus::Paid)?;
        self.transfer_ref = transfer_ref;
        self.processed_at = Some(at);
        Ok(())
    }

    /// Terminal failure. Reachable from `Pending` (eligibility rejection)
    /// and from `Processing` (exhausted transfer attempts).
    pub fn mark_failed(&mut self, at: DateTime<Utc>) -> Result<(), SettlementError> {
        if self.status.is_terminal() {
            return Err(self.bad_transition(PayoutStatus::Failed));
        }
        self.status = PayoutStatus::Failed;
        self.processed_at = Some(at);
        Ok(())
    }

    /// Pushes the eligibility timestamp out, e.g. for a dispute hold. Only
    /// pending entries can be rescheduled.
    pub fn defer_until(&mut self, at: DateTime<Utc>) -> Result<(), SettlementError> {
        if self.status != PayoutStatus::Pending {
            return Err(SettlementError::InvalidTransition(format!(
                "payout {} is {:?}, cannot be rescheduled",
                self.id, self.status
            )));
        }
        self.eligible_at = at;
        Ok(())
    }

    fn transition(&mut self, from: PayoutStatus, to: PayoutStatus) -> Result<(), SettlementError> {
        if self.status != from {
            return Err(self.bad_transition(to));
        }
        self.status = to;
        Ok(())
    }

    fn bad_transition(&self, to: PayoutStatus) -> SettlementError {
        SettlementError::InvalidTransition(format!(
            "payout {}: {:?} -> {:?}",
            self.id, self.status, to
        ))
    }
}
