//! Settlement engine for host payouts: evaluates eligibility, nets platform
//! fees, executes external transfers with bounded retry, and keeps payout
//! ledger, host balances, fee obligations, and the audit log consistent
//! through atomic commits.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
