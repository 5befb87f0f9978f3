use crate::error::SettlementError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Represents a monetary value with minor-unit precision.
///
/// This is a wrapper around `rust_decimal::Decimal` to enforce domain-specific
/// rules and provide type safety for financial calculations.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Balance(pub Decimal);

/// Represents a positive monetary amount, used for payout gross amounts.
///
/// Ensures that settlement amounts are always positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, SettlementError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(SettlementError::Validation(
                "amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = SettlementError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Add for Balance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Balance {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Balance {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Balance {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

/// Aggregate financial record for a host: balances, payout capability flags,
/// and lifetime payout counters.
///
/// `pending_balance` holds recognized earnings that have not been settled yet;
/// `current_balance` and `total_earnings` track what has already been paid.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct HostAccount {
    pub host: u64,
    pub pending_balance: Balance,
    pub current_balance: Balance,
    pub total_earnings: Balance,
    /// Manual kill-switch set by risk/support tooling.
    pub payouts_enabled: bool,
    /// Processor-side payee account, assigned during onboarding.
    #[serde(default)]
    pub connected_account_id: Option<String>,
    /// Whether the connected account can receive transfers yet.
    #[serde(default)]
    pub transfer_capability_enabled: bool,
    #[serde(default)]
    pub payouts_completed: u32,
    #[serde(default)]
    pub payouts_failed: u32,
}

impl HostAccount {
    pub fn new(host: u64) -> Self {
        Self {
            host,
            pending_balance: Balance::ZERO,
            current_balance: Balance::ZERO,
            total_earnings: Balance::ZERO,
            payouts_enabled: true,
            connected_account_id: None,
            transfer_capability_enabled: false,
            payouts_completed: 0,
            payouts_failed: 0,
        }
    }

    /// Moves the gross payout amount from pending into settled earnings.
    ///
    /// Fee deductions never touch these figures; they only shrink the
    /// external transfer.
    pub fn settle(&mut self, gross: Amount) -> Result<(), SettlementError> {
        let gross: Balance = gross.into();
        if self.pending_balance < gross {
            return Err(SettlementError::Validation(format!(
                "host {} pending balance below settled amount",
                self.host
            )));
        }
        self.pending_balance -= gross;
        self.current_balance += gross;
        self.total_earnings += gross;
        self.payouts_completed += 1;
        Ok(())
    }

    /// Counts a terminally failed payout. Balances stay untouched.
    pub fn record_failed_payout(&mut self) {
        self.payouts_failed += 1;
    }
}
