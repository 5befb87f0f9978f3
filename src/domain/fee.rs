use crate::domain::account::Balance;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeStatus {
    #[default]
    Pending,
    Deducted,
}

/// An amount a host owes the platform, created by external fee-charging
/// events and consumed opportunistically by payout netting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeObligation {
    pub id: u64,
    pub host: u64,
    pub amount: Balance,
    #[serde(default)]
    pub status: FeeStatus,
    /// The payout whose netting consumed this record.
    #[serde(default)]
    pub deducted_from_payout: Option<u64>,
}

impl FeeObligation {
    pub fn new(id: u64, host: u64, amount: Balance) -> Self {
        Self {
            id,
            host,
            amount,
            status: FeeStatus::Pending,
            deducted_from_payout: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == FeeStatus::Pending
    }

    pub fn deduct(&mut self, payout: u64) {
        self.status = FeeStatus::Deducted;
        self.deducted_from_payout = Some(payout);
    }
}
