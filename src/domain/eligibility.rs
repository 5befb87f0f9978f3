use crate::domain::account::HostAccount;
use crate::domain::booking::{DisputeRecord, TripRecord};
use crate::domain::payout::{PayoutEntry, PayoutStatus};
use std::fmt;

/// Inputs for one eligibility decision. All reads happen before evaluation;
/// the evaluator itself performs no I/O.
pub struct EligibilityContext<'a> {
    pub entry: &'a PayoutEntry,
    pub account: &'a HostAccount,
    pub trip: Option<&'a TripRecord>,
    pub open_disputes: &'a [DisputeRecord],
}

/// A deferral leaves the entry pending; it will be looked at again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferralReason {
    /// Trip still in progress. Re-checked on the next run, no schedule change.
    TripNotEnded,
    /// Booking has an open dispute. The orchestrator pushes `eligible_at`
    /// out by the hold window so the entry is not rescanned until it expires.
    OpenDispute,
}

/// Permanent ineligibility requires operator action; the entry is failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IneligibilityReason {
    AlreadyProcessed,
    PayoutsDisabled,
    NoConnectedAccount,
    TransferCapabilityDisabled,
    /// The host's pending balance cannot cover the payout. A normal business
    /// rule would never produce this; it signals an upstream bookkeeping
    /// defect and is logged accordingly.
    InsufficientPendingBalance,
}

impl IneligibilityReason {
    pub fn is_consistency_violation(&self) -> bool {
        matches!(self, IneligibilityReason::InsufficientPendingBalance)
    }
}

impl fmt::Display for IneligibilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            IneligibilityReason::AlreadyProcessed => "already processed",
            IneligibilityReason::PayoutsDisabled => "payouts disabled for host",
            IneligibilityReason::NoConnectedAccount => "host has no connected payee account",
            IneligibilityReason::TransferCapabilityDisabled => {
                "connected account cannot receive transfers"
            }
            IneligibilityReason::InsufficientPendingBalance => {
                "pending balance below payout amount"
            }
        };
        f.write_str(text)
    }
}

impl fmt::Display for DeferralReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DeferralReason::TripNotEnded => "trip not ended",
            DeferralReason::OpenDispute => "open dispute on booking",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Deferred(DeferralReason),
    Ineligible(IneligibilityReason),
}

type Rule = fn(&EligibilityContext) -> Option<Eligibility>;

/// Gate order matters: lifecycle gates run before account-health gates so a
/// disputed entry is held rather than failed when the host also has a
/// disabled account. First rule to object wins.
const RULES: &[Rule] = &[
    already_processed,
    trip_not_ended,
    open_dispute,
    payouts_disabled,
    no_connected_account,
    no_transfer_capability,
    insufficient_pending_balance,
];

pub fn evaluate(ctx: &EligibilityContext) -> Eligibility {
    RULES
        .iter()
        .find_map(|rule| rule(ctx))
        .unwrap_or(Eligibility::Eligible)
}

fn already_processed(ctx: &EligibilityContext) -> Option<Eligibility> {
    (ctx.entry.status != PayoutStatus::Pending)
        .then_some(Eligibility::Ineligible(IneligibilityReason::AlreadyProcessed))
}

fn trip_not_ended(ctx: &EligibilityContext) -> Option<Eligibility> {
    let ended = ctx.trip.is_some_and(|t| t.trip_ended_at.is_some());
    (!ended).then_some(Eligibility::Deferred(DeferralReason::TripNotEnded))
}

fn open_dispute(ctx: &EligibilityContext) -> Option<Eligibility> {
    ctx.open_disputes
        .iter()
        .any(|d| d.status.is_open())
        .then_some(Eligibility::Deferred(DeferralReason::OpenDispute))
}

fn payouts_disabled(ctx: &EligibilityContext) -> Option<Eligibility> {
    (!ctx.account.payouts_enabled)
        .then_some(Eligibility::Ineligible(IneligibilityReason::PayoutsDisabled))
}

fn no_connected_account(ctx: &EligibilityContext) -> Option<Eligibility> {
    ctx.account
        .connected_account_id
        .is_none()
        .then_some(Eligibility::Ineligible(IneligibilityReason::NoConnectedAccount))
}

fn no_transfer_capability(ctx: &EligibilityContext) -> Option<Eligibility> {
    (!ctx.account.transfer_capability_enabled).then_some(Eligibility::Ineligible(
        IneligibilityReason::TransferCapabilityDisabled,
    ))
}

fn insufficient_pending_balance(ctx: &EligibilityContext) -> Option<Eligibility> {
    (ctx.account.pending_balance < ctx.entry.amount.into()).then_some(Eligibility::Ineligible(
        IneligibilityReason::InsufficientPendingBalance,
    ))
}
